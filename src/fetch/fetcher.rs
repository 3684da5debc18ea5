use crate::cache::PayloadCache;
use crate::fetch::darksky::WeatherProvider;
use crate::fetch::error::FetchError;
use crate::geocode::GeocodeProvider;
use crate::progress::Reporter;
use crate::types::{DayKey, Location};
use chrono::{DateTime, Datelike, NaiveDate};
use log::{debug, error, info, warn};
use serde_json::Value;

/// Top-level payload field whose nested "data" list holds the observations.
pub const DEFAULT_SUB_KEY: &str = "daily";

/// Work done by one fetch run. A rerun over a fully cached year reports
/// `fetched == 0`, which is the observable form of the idempotence contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub fetched: u32,
    pub skipped: u32,
}

/// Drives one (location, year) fetch unit: resolve coordinates once, walk the
/// days of the year in order, skip cached days, fetch and validate the rest,
/// and write each payload through the cache.
///
/// There are no retries and no backoff; a failed day aborts the run and the
/// write-once cache is the sole recovery mechanism (re-run later).
pub struct Fetcher<G, W> {
    geocoder: G,
    provider: W,
    cache: PayloadCache,
    units: String,
    sub_key: String,
}

impl<G: GeocodeProvider, W: WeatherProvider> Fetcher<G, W> {
    pub fn new(geocoder: G, provider: W, cache: PayloadCache, units: impl Into<String>) -> Self {
        Self {
            geocoder,
            provider,
            cache,
            units: units.into(),
            sub_key: DEFAULT_SUB_KEY.to_string(),
        }
    }

    pub fn with_sub_key(mut self, sub_key: impl Into<String>) -> Self {
        self.sub_key = sub_key.into();
        self
    }

    pub async fn run(
        &self,
        location_name: &str,
        year: i32,
        reporter: &dyn Reporter,
    ) -> Result<FetchSummary, FetchError> {
        let resolved = self
            .geocoder
            .resolve(location_name)
            .await?
            .ok_or_else(|| FetchError::Resolution(location_name.to_string()))?;
        let location = Location::new(location_name, resolved.0, resolved.1);
        info!(
            "resolved '{}' to ({:.4}, {:.4})",
            location.name, location.latitude, location.longitude
        );

        let days = days_of_year(year)?;
        reporter.begin(days.len() as u64);

        let mut summary = FetchSummary {
            fetched: 0,
            skipped: 0,
        };
        for date in days {
            let day_of_year = date.ordinal();
            let key = DayKey::new(&location.name, year, day_of_year);

            if self.cache.exists(&key) {
                debug!("payload for {} already cached, skipping", key);
                summary.skipped += 1;
                reporter.advance(1);
                continue;
            }

            let payload = self
                .provider
                .fetch_day(location.latitude, location.longitude, date, &self.units)
                .await?;
            let Some(payload) = payload else {
                error!(
                    "doy:{} can't fetch data from API, aborting run for '{}' {}",
                    day_of_year, location.name, year
                );
                return Err(FetchError::RemoteFetch {
                    location: location.name.clone(),
                    year,
                    day_of_year,
                });
            };

            let first_time = first_record_time(&payload, &self.sub_key).ok_or_else(|| {
                error!(
                    "response for doy:{} doesn't have '{}' observation data; raw payload: {}",
                    day_of_year, self.sub_key, payload
                );
                FetchError::ProtocolViolation {
                    day_of_year,
                    sub_key: self.sub_key.clone(),
                }
            })?;

            match DateTime::from_timestamp(first_time, 0) {
                Some(response_time) => {
                    let response_doy = response_time.date_naive().ordinal();
                    if response_doy != day_of_year {
                        warn!(
                            "request day of year ({}) different from in response ({})",
                            day_of_year, response_doy
                        );
                    }
                }
                None => warn!(
                    "doy:{} response timestamp {} is out of range",
                    day_of_year, first_time
                ),
            }

            self.cache.write(&key, &payload)?;
            summary.fetched += 1;
            reporter.advance(1);
        }

        info!(
            "'{}' {}: fetched {} days, {} already cached",
            location.name, year, summary.fetched, summary.skipped
        );
        Ok(summary)
    }
}

/// Epoch seconds of the first observation record under `sub_key`, if the
/// payload honors the expected shape.
fn first_record_time(payload: &Value, sub_key: &str) -> Option<i64> {
    payload
        .get(sub_key)?
        .get("data")?
        .get(0)?
        .get("time")?
        .as_i64()
}

/// Every calendar day of `year` in ascending order (366 in leap years).
fn days_of_year(year: i32) -> Result<Vec<NaiveDate>, FetchError> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(FetchError::InvalidYear(year))?;
    let mut days = Vec::with_capacity(366);
    let mut day = first;
    while day.year() == year {
        days.push(day);
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    Ok(days)
}
