mod consolidator;
mod error;
mod flatten;
mod frame;

pub use consolidator::Consolidator;
pub use error::ConsolidateError;
pub use flatten::{flatten_record, CellValue, FlatRecord, YearObservations};
pub use frame::is_timestamp_column;
