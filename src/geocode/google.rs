use crate::geocode::error::GeocodeError;
use crate::geocode::GeocodeProvider;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Geocoding against the Google Maps geocode API.
pub struct GoogleGeocoder {
    client: Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Coordinates,
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    lat: f64,
    lng: f64,
}

impl GoogleGeocoder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }
}

impl GeocodeProvider for GoogleGeocoder {
    async fn resolve(&self, name: &str) -> Result<Option<(f64, f64)>, GeocodeError> {
        debug!("geocoding '{}' via {}", name, GEOCODE_URL);
        let response = self
            .client
            .get(GEOCODE_URL)
            .query(&[("address", name), ("key", &self.api_key)])
            .send()
            .await
            .map_err(|e| GeocodeError::NetworkRequest(GEOCODE_URL.to_string(), e))?;

        let response = response.error_for_status().map_err(|e| {
            if let Some(status) = e.status() {
                GeocodeError::HttpStatus {
                    url: GEOCODE_URL.to_string(),
                    status,
                    source: e,
                }
            } else {
                GeocodeError::NetworkRequest(GEOCODE_URL.to_string(), e)
            }
        })?;

        let decoded: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::BodyDecode(GEOCODE_URL.to_string(), e))?;

        match decoded.status.as_str() {
            "OK" => Ok(decoded
                .results
                .into_iter()
                .next()
                .map(|r| (r.geometry.location.lat, r.geometry.location.lng))),
            "ZERO_RESULTS" => {
                warn!("geocoding '{}' returned no results", name);
                Ok(None)
            }
            other => Err(GeocodeError::ServiceStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_shape_decodes() {
        let body = r#"{
            "status": "OK",
            "results": [
                {"geometry": {"location": {"lat": 38.7223, "lng": -9.1393}}}
            ]
        }"#;
        let decoded: GeocodeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(decoded.status, "OK");
        assert_eq!(decoded.results[0].geometry.location.lat, 38.7223);
    }

    #[test]
    fn zero_results_decodes_without_results_field() {
        let decoded: GeocodeResponse =
            serde_json::from_str(r#"{"status": "ZERO_RESULTS"}"#).unwrap();
        assert!(decoded.results.is_empty());
    }
}
