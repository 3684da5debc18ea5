mod error;
mod google;

pub use error::GeocodeError;
pub use google::GoogleGeocoder;

/// Black-box geocoding capability: turns a location name into coordinates.
///
/// `Ok(None)` means the service answered but found no match for the name;
/// the caller decides whether that is fatal.
#[allow(async_fn_in_trait)]
pub trait GeocodeProvider {
    async fn resolve(&self, name: &str) -> Result<Option<(f64, f64)>, GeocodeError>;
}
