use crate::cache::DEFAULT_CACHE_NAME;
use crate::error::{Result, WordFrequencyError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure loaded from word_frequency.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub upload: UploadConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http_bind: SocketAddr,
    pub request_timeout_ms: u64,
}

/// Result cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Name the result store is registered and looked up under
    pub name: String,
    pub max_entries: usize,
    /// Entry lifetime in seconds; 0 or absent keeps entries until evicted
    pub ttl_sec: Option<u64>,
}

/// Upload handling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_bytes: usize,
    /// Stage uploads through a temporary file before analysis
    pub spool: bool,
    pub spool_dir: Option<PathBuf>,
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            request_timeout_ms: 30_000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CACHE_NAME.to_string(),
            max_entries: 1024,
            ttl_sec: None,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 64 * 1024 * 1024,
            spool: false,
            spool_dir: None,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: "word_frequency=info,tower_http=info".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(level) = std::env::var("RUST_LOG") {
            cfg.log_level = level;
        }
        cfg
    }
}

fn is_truthy(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    /// Uses WORDFREQ_CONFIG or defaults to "word_frequency.toml"
    pub fn load() -> Result<Self> {
        if let Ok(env_path) = std::env::var("WORDFREQ_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::dotenv();
        }

        let config_path = std::env::var("WORDFREQ_CONFIG")
            .unwrap_or_else(|_| "word_frequency.toml".to_string());
        Self::load_from(config_path)
    }

    /// Load from an explicit TOML path, then apply environment overrides
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut config: Config = match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content)?,
            Err(_) => {
                tracing::warn!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply WORDFREQ_* overrides from `lookup` (env-first)
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("WORDFREQ_HTTP_BIND") {
            match v.parse::<SocketAddr>() {
                Ok(bind) => self.server.http_bind = bind,
                Err(_) => tracing::warn!("Ignoring invalid WORDFREQ_HTTP_BIND '{}'", v),
            }
        }
        if let Some(timeout) =
            lookup("WORDFREQ_HTTP_REQUEST_TIMEOUT_MS").and_then(|v| v.parse().ok())
        {
            self.server.request_timeout_ms = timeout;
        }
        if let Some(name) = lookup("WORDFREQ_CACHE_NAME") {
            self.cache.name = name;
        }
        if let Some(max) = lookup("WORDFREQ_CACHE_MAX").and_then(|v| v.parse().ok()) {
            self.cache.max_entries = max;
        }
        if let Some(ttl) = lookup("WORDFREQ_CACHE_TTL_SEC").and_then(|v| v.parse().ok()) {
            self.cache.ttl_sec = Some(ttl);
        }
        if let Some(spool) = lookup("WORDFREQ_SPOOL_UPLOADS") {
            self.upload.spool = is_truthy(&spool);
        }
        if let Some(dir) = lookup("WORDFREQ_SPOOL_DIR") {
            self.upload.spool_dir = Some(PathBuf::from(dir));
        }
        if let Some(max) = lookup("WORDFREQ_MAX_UPLOAD_BYTES").and_then(|v| v.parse().ok()) {
            self.upload.max_bytes = max;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.cache.name.trim().is_empty() {
            return Err(WordFrequencyError::Config {
                message: "cache name must not be empty".into(),
            });
        }
        if self.cache.max_entries == 0 {
            return Err(WordFrequencyError::Config {
                message: "cache max_entries must be > 0".into(),
            });
        }
        if self.server.request_timeout_ms == 0 {
            return Err(WordFrequencyError::Config {
                message: "server request_timeout_ms must be > 0".into(),
            });
        }
        if self.upload.max_bytes == 0 {
            return Err(WordFrequencyError::Config {
                message: "upload max_bytes must be > 0".into(),
            });
        }
        Ok(())
    }

    pub fn cache_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.cache.max_entries).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache
            .ttl_sec
            .filter(|&s| s > 0)
            .map(Duration::from_secs)
    }
}
