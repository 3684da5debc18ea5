mod darksky;
mod error;
mod fetcher;

pub use darksky::{DarkSkyClient, WeatherProvider};
pub use error::FetchError;
pub use fetcher::{Fetcher, FetchSummary, DEFAULT_SUB_KEY};
