//! In-process bounded LRU store with optional time-to-live.

use super::store::CacheStore;
use crate::error::Result;
use async_trait::async_trait;
use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct Slot {
    value: Value,
    stored_at: Instant,
}

pub struct MemoryStore {
    entries: Mutex<LruCache<String, Slot>>,
    ttl: Option<Duration>,
}

impl MemoryStore {
    pub fn new(capacity: NonZeroUsize, ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn expired(&self, slot: &Slot) -> bool {
        self.ttl
            .is_some_and(|ttl| slot.stored_at.elapsed() >= ttl)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some(slot) if !self.expired(slot) => return Ok(Some(slot.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
            tracing::debug!("Evicted expired cache entry {}", key);
        }
        Ok(None)
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.put(
            key.to_string(),
            Slot {
                value,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").field("ttl", &self.ttl).finish()
    }
}
