mod error;
mod payload_cache;

pub use error::CacheError;
pub use payload_cache::PayloadCache;
