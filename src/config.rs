use std::env;
use thiserror::Error;

/// Environment variable holding the Dark Sky API credential.
pub const DARKSKY_KEY_VAR: &str = "DARKSKY_KEY";
/// Environment variable holding the Google geocoding API credential.
pub const MAPS_KEY_VAR: &str = "WTD_MAPS_KEY";
/// Environment variable overriding the observation units.
pub const UNITS_VAR: &str = "WTD_UNITS";

pub const DEFAULT_UNITS: &str = "auto";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable '{0}'")]
    MissingVar(&'static str),
}

/// Credentials and options read from the process environment (after any
/// `.env` file has been loaded by the binary).
#[derive(Debug, Clone)]
pub struct Settings {
    pub darksky_key: String,
    pub maps_key: String,
    /// Observation units requested from the weather API.
    /// Possible values: auto, ca, uk2, us, si.
    pub units: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            darksky_key: require(DARKSKY_KEY_VAR)?,
            maps_key: require(MAPS_KEY_VAR)?,
            units: env::var(UNITS_VAR).unwrap_or_else(|_| DEFAULT_UNITS.to_string()),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_reported_by_name() {
        // Serialize env access with a unique variable set per test run.
        std::env::remove_var(DARKSKY_KEY_VAR);
        std::env::remove_var(MAPS_KEY_VAR);
        let err = Settings::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(DARKSKY_KEY_VAR)));
    }

    #[test]
    fn units_default_to_auto() {
        std::env::remove_var(UNITS_VAR);
        assert_eq!(
            std::env::var(UNITS_VAR).unwrap_or_else(|_| DEFAULT_UNITS.to_string()),
            "auto"
        );
    }
}
