use crate::fetch::error::FetchError;
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;

const FORECAST_URL: &str = "https://api.darksky.net/forecast";

/// Black-box weather capability: fetches the raw observation payload for one
/// calendar day at a coordinate.
///
/// `Ok(None)` is the service's failure sentinel (the day could not be
/// served); transport and decode problems are errors.
#[allow(async_fn_in_trait)]
pub trait WeatherProvider {
    async fn fetch_day(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
        units: &str,
    ) -> Result<Option<Value>, FetchError>;
}

/// Dark Sky "time machine" client: one request per observation day.
pub struct DarkSkyClient {
    client: Client,
    api_key: String,
}

impl DarkSkyClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Request URL with the credential redacted, for logs and errors.
    fn display_url(latitude: f64, longitude: f64, date: NaiveDate) -> String {
        format!(
            "{}/<key>/{},{},{}T00:00:00",
            FORECAST_URL,
            latitude,
            longitude,
            date.format("%Y-%m-%d")
        )
    }
}

impl WeatherProvider for DarkSkyClient {
    async fn fetch_day(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
        units: &str,
    ) -> Result<Option<Value>, FetchError> {
        let url = format!(
            "{}/{}/{},{},{}T00:00:00?units={}",
            FORECAST_URL,
            self.api_key,
            latitude,
            longitude,
            date.format("%Y-%m-%d"),
            units
        );
        let shown = Self::display_url(latitude, longitude, date);
        debug!("requesting {}", shown);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(shown.clone(), e))?;

        if !response.status().is_success() {
            warn!("{} answered with status {}", shown, response.status());
            return Ok(None);
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| FetchError::BodyDecode(shown, e))?;
        Ok(Some(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_url_redacts_the_credential() {
        let date = NaiveDate::from_ymd_opt(2019, 2, 28).unwrap();
        let shown = DarkSkyClient::display_url(38.7223, -9.1393, date);
        assert_eq!(
            shown,
            "https://api.darksky.net/forecast/<key>/38.7223,-9.1393,2019-02-28T00:00:00"
        );
    }
}
