use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create cache directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to stage payload for '{0}'")]
    Stage(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode payload for '{0}'")]
    Encode(PathBuf, #[source] serde_json::Error),

    #[error("Failed to publish payload at '{0}'")]
    Publish(PathBuf, #[source] std::io::Error),

    #[error("Failed to read cached payload '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode cached payload '{0}'")]
    Decode(PathBuf, #[source] serde_json::Error),

    #[error("Failed to list cache directory '{0}'")]
    List(PathBuf, #[source] std::io::Error),
}
