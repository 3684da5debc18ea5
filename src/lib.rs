//! Two-stage weather observation pipeline.
//!
//! Stage one fetches one raw payload per calendar day of a (location, year)
//! pair from the Dark Sky API and caches each payload on disk, write-once,
//! so interrupted runs resume where they stopped. Stage two consolidates all
//! cached years of a location into one chronologically sorted, timezone-aware
//! dataset, emitted as CSV and as a Parquet binary table.

mod cache;
mod config;
mod consolidate;
mod error;
mod fetch;
mod geocode;
mod progress;
mod types;

pub use cache::{CacheError, PayloadCache};
pub use config::{ConfigError, Settings, DARKSKY_KEY_VAR, DEFAULT_UNITS, MAPS_KEY_VAR, UNITS_VAR};
pub use consolidate::{
    flatten_record, is_timestamp_column, CellValue, ConsolidateError, Consolidator, FlatRecord,
    YearObservations,
};
pub use error::WtdError;
pub use fetch::{DarkSkyClient, FetchError, FetchSummary, Fetcher, WeatherProvider, DEFAULT_SUB_KEY};
pub use geocode::{GeocodeError, GeocodeProvider, GoogleGeocoder};
pub use progress::{NoopReporter, Reporter};
pub use types::{DayKey, Location};
