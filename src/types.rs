use serde::{Deserialize, Serialize};
use std::fmt;

/// A named place resolved to geographic coordinates.
///
/// Resolved exactly once per fetch run via the geocoding capability and
/// immutable afterward. The location's timezone is not known at resolve
/// time; it is reported inside the weather payloads and extracted during
/// consolidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// Primary key of one cached payload: `(location, year, day_of_year)`.
///
/// `day_of_year` is 1-based (1..=366). Two runs always agree on the cache
/// path derived from a `DayKey`, so no coordination is needed between them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey {
    pub location: String,
    pub year: i32,
    pub day_of_year: u32,
}

impl DayKey {
    pub fn new(location: impl Into<String>, year: i32, day_of_year: u32) -> Self {
        Self {
            location: location.into(),
            year,
            day_of_year,
        }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.location, self.year, self.day_of_year)
    }
}
