use crate::cache::CacheError;
use crate::geocode::GeocodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The geocoding service found no coordinates for the location name.
    #[error("No coordinates found for location '{0}'")]
    Resolution(String),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// The weather service returned its failure sentinel for one day.
    /// Aborts the whole (location, year) run; already-cached days survive.
    #[error("Weather service returned no data for '{location}' {year} day {day_of_year}")]
    RemoteFetch {
        location: String,
        year: i32,
        day_of_year: u32,
    },

    /// A successful response without the expected observation sub-key.
    /// Indicates the remote contract changed; treated as fatal.
    #[error("Response for day {day_of_year} is missing '{sub_key}' observation data")]
    ProtocolViolation { day_of_year: u32, sub_key: String },

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("Failed to decode response body from {0}")]
    BodyDecode(String, #[source] reqwest::Error),

    #[error("Year {0} has no representable calendar days")]
    InvalidYear(i32),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
