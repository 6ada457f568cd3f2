//! Typed view over a named store holding top-K results.
//!
//! Nothing here fails a request: a missing store, a store error or a stored
//! value of the wrong shape all read as a miss.

use super::store::{CacheManager, CacheStore};
use crate::analysis::TopKResult;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct ResultCache {
    store: Option<Arc<dyn CacheStore>>,
    name: String,
}

impl ResultCache {
    /// Bind to the store registered as `name`. An unregistered name leaves the
    /// cache permanently unavailable.
    pub fn from_manager(manager: &CacheManager, name: &str) -> Self {
        let store = manager.cache(name);
        if store.is_none() {
            warn!("Cache '{}' is not configured; results will not be memoized", name);
        }
        Self {
            store,
            name: name.to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn get(&self, key: &str) -> Option<TopKResult> {
        let store = self.store.as_ref()?;
        let value = match store.get(key).await {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache '{}' lookup for {} failed: {}", self.name, key, e);
                return None;
            }
        };
        match serde_json::from_value::<TopKResult>(value) {
            Ok(result) => Some(result),
            Err(e) => {
                debug!(
                    "Cache '{}' entry {} has an unexpected shape, ignoring: {}",
                    self.name, key, e
                );
                None
            }
        }
    }

    pub async fn put(&self, key: &str, result: &TopKResult) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let value = match serde_json::to_value(result) {
            Ok(v) => v,
            Err(e) => {
                warn!("Could not serialize result for {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = store.put(key, value).await {
            warn!("Cache '{}' store for {} failed: {}", self.name, key, e);
        }
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("name", &self.name)
            .field("available", &self.is_available())
            .finish()
    }
}
