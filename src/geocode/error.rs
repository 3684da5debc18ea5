use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode response body from {0}")]
    BodyDecode(String, #[source] reqwest::Error),

    #[error("Geocoding service rejected the request with status '{0}'")]
    ServiceStatus(String),
}
