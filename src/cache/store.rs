use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A keyed value store. Eviction and expiry belong to the implementation.
///
/// Implementations must tolerate concurrent callers; last write wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn put(&self, key: &str, value: Value) -> Result<()>;
}

/// Registry of named stores
#[derive(Clone, Default)]
pub struct CacheManager {
    stores: HashMap<String, Arc<dyn CacheStore>>,
}

impl CacheManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, name: impl Into<String>, store: Arc<dyn CacheStore>) -> Self {
        self.stores.insert(name.into(), store);
        self
    }

    /// Look up a store by name; `None` when nothing is registered under it
    pub fn cache(&self, name: &str) -> Option<Arc<dyn CacheStore>> {
        self.stores.get(name).cloned()
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("stores", &self.stores.keys().collect::<Vec<_>>())
            .finish()
    }
}
