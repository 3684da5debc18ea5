use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsolidateError {
    #[error("Failed to list directory '{0}'")]
    DirList(PathBuf, #[source] std::io::Error),

    #[error("Failed to read cached payload '{0}'")]
    PayloadRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse cached payload '{0}'")]
    PayloadParse(PathBuf, #[source] serde_json::Error),

    /// A cached payload without the expected `<sub_key>.data` list.
    /// Fatal for the whole location's consolidation.
    #[error("Cached payload '{path}' is missing key '{key}'")]
    MalformedPayload { path: PathBuf, key: String },

    #[error("No cached observations found under '{0}'")]
    NoObservations(PathBuf),

    #[error("No payload under '{0}' reported a timezone")]
    MissingTimezone(PathBuf),

    #[error("Column '{column}' mixes {existing} and {found} values")]
    MixedColumnTypes {
        column: String,
        existing: &'static str,
        found: &'static str,
    },

    #[error("Consolidated observations for '{0}' have no 'time' column")]
    MissingTimeColumn(String),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Failed to create output directory '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing output file '{0}'")]
    OutputIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing output file '{0}'")]
    OutputEncode(PathBuf, #[source] PolarsError),
}
