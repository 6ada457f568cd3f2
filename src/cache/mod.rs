//! Result memoization over a pluggable keyed store.

pub mod memory;
pub mod result;
pub mod store;

pub use memory::MemoryStore;
pub use result::ResultCache;
pub use store::{CacheManager, CacheStore};

/// Store name results are memoized under
pub const DEFAULT_CACHE_NAME: &str = "wordFrequencies";
