//! Request orchestration: validate, consult the cache, analyze on a miss.

use crate::analysis::{self, TopKResult};
use crate::cache::{CacheManager, ResultCache};
use crate::config::Config;
use crate::error::{Result, WordFrequencyError};
use crate::spool::Spool;
use serde::Serialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// Complete file; empty uploads are rejected
    Whole,
    /// One segment of a larger file, analyzed on its own
    Chunk,
}

/// An upload as handed over by the web layer
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
    pub k: i64,
    pub offset: i64,
    pub mode: UploadMode,
}

impl UploadRequest {
    pub fn whole(file_name: Option<String>, bytes: Vec<u8>, k: i64) -> Self {
        Self {
            file_name,
            bytes,
            k,
            offset: 0,
            mode: UploadMode::Whole,
        }
    }

    pub fn chunk(file_name: Option<String>, bytes: Vec<u8>, offset: i64, k: i64) -> Self {
        Self {
            file_name,
            bytes,
            k,
            offset,
            mode: UploadMode::Chunk,
        }
    }
}

/// Memoization key for one analysis.
///
/// Identity is the client file name and byte size, not the content: two
/// different files sharing name, size, K and offset share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    file_name: String,
    size: u64,
    k: NonZeroUsize,
    offset: u64,
}

impl CacheKey {
    pub fn new(file_name: Option<&str>, size: u64, k: NonZeroUsize, offset: u64) -> Self {
        Self {
            file_name: file_name.unwrap_or_default().to_string(),
            size,
            k,
            offset,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}-{}", self.file_name, self.size, self.k, self.offset)
    }
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    rejected: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    computed: AtomicU64,
}

/// Point-in-time view of the handler counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HandlerStats {
    pub requests: u64,
    pub rejected: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub computed: u64,
}

#[derive(Clone)]
pub struct RequestHandler {
    cache: ResultCache,
    spool: Option<Spool>,
    counters: Arc<Counters>,
}

impl RequestHandler {
    pub fn new(cache: ResultCache) -> Self {
        Self {
            cache,
            spool: None,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Stage every cache-missing upload through `spool` before decoding
    pub fn with_spool(mut self, spool: Spool) -> Self {
        self.spool = Some(spool);
        self
    }

    pub fn from_config(config: &Config, caches: &CacheManager) -> Self {
        let handler = Self::new(ResultCache::from_manager(caches, &config.cache.name));
        if config.upload.spool {
            let spool = config
                .upload
                .spool_dir
                .clone()
                .map(Spool::new)
                .unwrap_or_default();
            info!("Spooling uploads through {}", spool.dir().display());
            handler.with_spool(spool)
        } else {
            handler
        }
    }

    pub fn stats(&self) -> HandlerStats {
        let c = &self.counters;
        HandlerStats {
            requests: c.requests.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
            cache_hits: c.cache_hits.load(Ordering::Relaxed),
            cache_misses: c.cache_misses.load(Ordering::Relaxed),
            computed: c.computed.load(Ordering::Relaxed),
        }
    }

    pub async fn process(&self, request: UploadRequest) -> Result<TopKResult> {
        self.counters.requests.fetch_add(1, Ordering::Relaxed);
        let (k, offset) = match validate(&request) {
            Ok(v) => v,
            Err(e) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        let key = CacheKey::new(
            request.file_name.as_deref(),
            request.bytes.len() as u64,
            k,
            offset,
        )
        .to_string();

        if let Some(cached) = self.cache.get(&key).await {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for {}", key);
            return Ok(cached);
        }
        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss for {} ({:?})", key, request.mode);

        let bytes = match &self.spool {
            Some(spool) => spool.round_trip(request.bytes).await?,
            None => request.bytes,
        };
        let text = String::from_utf8(bytes).map_err(|e| WordFrequencyError::Storage {
            message: format!("Upload {} is not valid UTF-8: {}", key, e.utf8_error()),
        })?;

        let result = tokio::task::spawn_blocking(move || analysis::analyze(&text, k))
            .await
            .map_err(|e| WordFrequencyError::Internal {
                message: format!("Analysis worker failed: {}", e),
            })?;
        self.counters.computed.fetch_add(1, Ordering::Relaxed);

        self.cache.put(&key, &result).await;
        Ok(result)
    }
}

impl fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandler")
            .field("cache", &self.cache)
            .field("spool", &self.spool)
            .finish()
    }
}

fn validate(request: &UploadRequest) -> Result<(NonZeroUsize, u64)> {
    if request.mode == UploadMode::Whole && request.bytes.is_empty() {
        return Err(WordFrequencyError::invalid_input("Uploaded file is empty"));
    }
    let k = usize::try_from(request.k)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            WordFrequencyError::invalid_input(format!(
                "k must be a positive integer, got {}",
                request.k
            ))
        })?;
    let offset = u64::try_from(request.offset).map_err(|_| {
        WordFrequencyError::invalid_input(format!(
            "offset must be a non-negative integer, got {}",
            request.offset
        ))
    })?;
    Ok((k, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, DEFAULT_CACHE_NAME, MemoryStore};

    const SAMPLE: &str =
        "word3 word2 word4 word1 word2 word5 word3 word3 word4 word5 word4 word5 word4 word5 word5";

    fn handler() -> (RequestHandler, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(NonZeroUsize::new(64).unwrap(), None));
        let caches = CacheManager::new().with_store(DEFAULT_CACHE_NAME, store.clone());
        let handler = RequestHandler::new(ResultCache::from_manager(&caches, DEFAULT_CACHE_NAME));
        (handler, store)
    }

    fn name() -> Option<String> {
        Some("test.txt".to_string())
    }

    #[test]
    fn test_cache_key_format() {
        let k = NonZeroUsize::new(3).unwrap();
        assert_eq!(
            CacheKey::new(Some("a.txt"), 42, k, 100).to_string(),
            "a.txt-42-3-100"
        );
        assert_eq!(CacheKey::new(None, 0, k, 0).to_string(), "-0-3-0");
    }

    #[tokio::test]
    async fn test_whole_upload_top_three() {
        let (handler, _) = handler();
        let result = handler
            .process(UploadRequest::whole(name(), SAMPLE.into(), 3))
            .await
            .unwrap();
        assert_eq!(result.words(), vec!["word5", "word4", "word3"]);
        assert_eq!(result.frequencies(), vec![5, 4, 3]);
    }

    #[tokio::test]
    async fn test_empty_whole_upload_rejected_before_cache() {
        let (handler, store) = handler();
        let err = handler
            .process(UploadRequest::whole(name(), Vec::new(), 3))
            .await
            .unwrap_err();
        assert!(matches!(err, WordFrequencyError::InvalidInput { .. }));
        assert!(store.is_empty().await);
        let stats = handler.stats();
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.cache_hits + stats.cache_misses, 0);
    }

    #[tokio::test]
    async fn test_empty_chunk_is_accepted() {
        let (handler, _) = handler();
        let result = handler
            .process(UploadRequest::chunk(name(), Vec::new(), 0, 3))
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_non_positive_k_and_negative_offset() {
        let (handler, _) = handler();
        for k in [0, -1] {
            let err = handler
                .process(UploadRequest::whole(name(), SAMPLE.into(), k))
                .await
                .unwrap_err();
            assert!(matches!(err, WordFrequencyError::InvalidInput { .. }));
        }
        let err = handler
            .process(UploadRequest::chunk(name(), SAMPLE.into(), -5, 3))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("offset"));
    }

    #[tokio::test]
    async fn test_second_identical_upload_hits_cache() {
        let (handler, _) = handler();
        let first = handler
            .process(UploadRequest::whole(name(), SAMPLE.into(), 3))
            .await
            .unwrap();
        let second = handler
            .process(UploadRequest::whole(name(), SAMPLE.into(), 3))
            .await
            .unwrap();
        assert_eq!(first, second);
        let stats = handler.stats();
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.computed, 1);
    }

    #[tokio::test]
    async fn test_same_name_and_size_collide_by_design() {
        let (handler, _) = handler();
        handler
            .process(UploadRequest::whole(name(), b"aaa bbb aaa".to_vec(), 1))
            .await
            .unwrap();
        let stale = handler
            .process(UploadRequest::whole(name(), b"ccc ddd ddd".to_vec(), 1))
            .await
            .unwrap();
        assert_eq!(stale.words(), vec!["aaa"]);
    }

    #[tokio::test]
    async fn test_chunk_offsets_do_not_collide() {
        let (handler, store) = handler();
        handler
            .process(UploadRequest::chunk(name(), SAMPLE.into(), 0, 3))
            .await
            .unwrap();
        handler
            .process(UploadRequest::chunk(name(), SAMPLE.into(), 100, 3))
            .await
            .unwrap();

        let size = SAMPLE.len();
        assert!(store.get(&format!("test.txt-{size}-3-0")).await.unwrap().is_some());
        assert!(store.get(&format!("test.txt-{size}-3-100")).await.unwrap().is_some());
        assert_eq!(handler.stats().cache_misses, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_identical_uploads_agree() {
        let (handler, store) = handler();
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let handler = handler.clone();
                tokio::spawn(async move {
                    handler
                        .process(UploadRequest::whole(name(), SAMPLE.into(), 3))
                        .await
                })
            })
            .collect();
        for task in tasks {
            let result = task.await.unwrap().unwrap();
            assert_eq!(result.words(), vec!["word5", "word4", "word3"]);
        }
        let stats = handler.stats();
        assert_eq!(stats.cache_hits + stats.cache_misses, 8);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_storage_error() {
        let (handler, _) = handler();
        let err = handler
            .process(UploadRequest::whole(name(), vec![0xff, 0xfe, 0x20], 1))
            .await
            .unwrap_err();
        assert!(matches!(err, WordFrequencyError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_missing_cache_still_computes() {
        let handler = RequestHandler::new(ResultCache::from_manager(
            &CacheManager::new(),
            DEFAULT_CACHE_NAME,
        ));
        for _ in 0..2 {
            let result = handler
                .process(UploadRequest::whole(name(), SAMPLE.into(), 1))
                .await
                .unwrap();
            assert_eq!(result.words(), vec!["word5"]);
        }
        assert_eq!(handler.stats().computed, 2);
    }

    #[tokio::test]
    async fn test_spooled_upload() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, _) = handler();
        let handler = handler.with_spool(Spool::new(dir.path()));
        let result = handler
            .process(UploadRequest::whole(name(), SAMPLE.into(), 2))
            .await
            .unwrap();
        assert_eq!(result.words(), vec!["word5", "word4"]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
