use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::consolidate::ConsolidateError;
use crate::fetch::FetchError;
use crate::geocode::GeocodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WtdError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Consolidate(#[from] ConsolidateError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
