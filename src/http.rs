//! HTTP transport module for word-frequency
//!
//! Axum router exposing the whole-file and chunked upload endpoints, plus
//! plain JSON health and metrics.

use crate::analysis::TopKResult;
use crate::cache::{CacheManager, MemoryStore};
use crate::config::Config;
use crate::error::{Result, WordFrequencyError};
use crate::handler::{RequestHandler, UploadRequest};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Query, Request, State, multipart::MultipartRejection,
        rejection::QueryRejection,
    },
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

const LATENCY_WINDOW: usize = 256;

/// Shared state for HTTP server
#[derive(Clone)]
pub struct HttpState {
    pub handler: RequestHandler,
    pub metrics: Arc<Mutex<HttpMetrics>>,
}

impl HttpState {
    pub fn new(handler: RequestHandler) -> Self {
        Self {
            handler,
            metrics: Arc::new(Mutex::new(HttpMetrics::new())),
        }
    }

    /// Wire an in-process LRU store under the configured cache name
    pub fn from_config(config: &Config) -> Self {
        let store = Arc::new(MemoryStore::new(config.cache_capacity(), config.cache_ttl()));
        let caches = CacheManager::new().with_store(config.cache.name.clone(), store);
        Self::new(RequestHandler::from_config(config, &caches))
    }
}

/// Metrics for HTTP server
#[derive(Debug, Clone)]
pub struct HttpMetrics {
    pub total_requests: u64,
    pub last_request_unix: u64,
    pub errors_total: u64,
    pub latencies: VecDeque<f64>, // ring buffer for average
}

impl HttpMetrics {
    fn new() -> Self {
        Self {
            total_requests: 0,
            last_request_unix: unix_now(),
            errors_total: 0,
            latencies: VecDeque::with_capacity(LATENCY_WINDOW),
        }
    }

    /// Record one finished upload request
    fn record(&mut self, latency_ms: f64, success: bool) {
        if self.latencies.len() == LATENCY_WINDOW {
            self.latencies.pop_front();
        }
        self.latencies.push_back(latency_ms);
        if !success {
            self.errors_total = self.errors_total.saturating_add(1);
        }
        self.total_requests = self.total_requests.saturating_add(1);
        self.last_request_unix = unix_now();
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Response body: `words[i]` occurs `frequencies[i]` times
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequencyResponse {
    pub words: Vec<String>,
    pub frequencies: Vec<u64>,
}

impl From<&TopKResult> for WordFrequencyResponse {
    fn from(result: &TopKResult) -> Self {
        Self {
            words: result.words(),
            frequencies: result.frequencies(),
        }
    }
}

/// Query-string fallbacks for the multipart text fields
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub k: Option<String>,
    pub offset: Option<String>,
}

impl UploadQuery {
    fn extract(query: std::result::Result<Query<Self>, QueryRejection>) -> Result<Self> {
        let Query(query) = query.map_err(|e| {
            WordFrequencyError::invalid_input(format!("Bad query string: {}", e.body_text()))
        })?;
        Ok(query)
    }
}

#[derive(Debug, Default)]
struct UploadForm {
    file_name: Option<String>,
    file: Option<Vec<u8>>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    async fn read(multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<Self> {
        let mut multipart = multipart.map_err(|e| {
            WordFrequencyError::invalid_input(format!(
                "Expected a multipart upload: {}",
                e.body_text()
            ))
        })?;

        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("file") => {
                    form.file_name = field.file_name().map(str::to_string);
                    form.file = Some(field.bytes().await?.to_vec());
                }
                Some(other) => {
                    let other = other.to_string();
                    let value = field.text().await?;
                    form.fields.insert(other, value);
                }
                None => {}
            }
        }
        Ok(form)
    }

    fn take_file(&mut self) -> Result<(Option<String>, Vec<u8>)> {
        let bytes = self
            .file
            .take()
            .ok_or_else(|| WordFrequencyError::invalid_input("Missing multipart field 'file'"))?;
        Ok((self.file_name.take(), bytes))
    }

    /// Integer parameter from the form, falling back to the query string
    fn int_param(&self, name: &str, query: Option<&String>) -> Result<i64> {
        let raw = self
            .fields
            .get(name)
            .or(query)
            .ok_or_else(|| {
                WordFrequencyError::invalid_input(format!("Missing required parameter '{}'", name))
            })?;
        raw.trim().parse::<i64>().map_err(|_| {
            WordFrequencyError::invalid_input(format!(
                "Parameter '{}' must be an integer, got '{}'",
                name, raw
            ))
        })
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

/// Whole-file upload
pub async fn upload_handler(
    State(state): State<HttpState>,
    query: std::result::Result<Query<UploadQuery>, QueryRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<WordFrequencyResponse>> {
    let query = UploadQuery::extract(query)?;
    let mut form = UploadForm::read(multipart).await?;
    let (file_name, bytes) = form.take_file()?;
    let k = form.int_param("k", query.k.as_ref())?;

    let result = state
        .handler
        .process(UploadRequest::whole(file_name, bytes, k))
        .await?;
    Ok(Json(WordFrequencyResponse::from(&result)))
}

/// Single chunk upload; each chunk is analyzed independently
pub async fn upload_chunk_handler(
    State(state): State<HttpState>,
    query: std::result::Result<Query<UploadQuery>, QueryRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<WordFrequencyResponse>> {
    let query = UploadQuery::extract(query)?;
    let mut form = UploadForm::read(multipart).await?;
    let (file_name, bytes) = form.take_file()?;
    let offset = form.int_param("offset", query.offset.as_ref())?;
    let k = form.int_param("k", query.k.as_ref())?;

    let result = state
        .handler
        .process(UploadRequest::chunk(file_name, bytes, offset, k))
        .await?;
    Ok(Json(WordFrequencyResponse::from(&result)))
}

/// Metrics endpoint
pub async fn metrics_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let metrics = state.metrics.lock().await.clone();
    let avg_latency_ms = if metrics.latencies.is_empty() {
        None
    } else {
        Some(metrics.latencies.iter().sum::<f64>() / metrics.latencies.len() as f64)
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        json!({
            "metrics_version": "1",
            "total_requests": metrics.total_requests,
            "last_request_unix": metrics.last_request_unix,
            "errors_total": metrics.errors_total,
            "avg_latency_ms": avg_latency_ms,
            "analysis": state.handler.stats(),
        })
        .to_string(),
    )
}

async fn track_metrics(
    State(metrics): State<Arc<Mutex<HttpMetrics>>>,
    req: Request,
    next: Next,
) -> Response {
    let is_upload = req.uri().path().starts_with("/upload");
    let start = Instant::now();
    let resp = next.run(req).await;
    if is_upload {
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        metrics
            .lock()
            .await
            .record(latency_ms, resp.status().is_success());
    }
    resp
}

/// Limits applied to every request
#[derive(Debug, Clone, Copy)]
pub struct RouterLimits {
    pub max_upload_bytes: usize,
    pub request_timeout: Duration,
}

impl From<&Config> for RouterLimits {
    fn from(config: &Config) -> Self {
        Self {
            max_upload_bytes: config.upload.max_bytes,
            request_timeout: config.request_timeout(),
        }
    }
}

/// Build the application router
pub fn router(state: HttpState, limits: RouterLimits) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/upload", post(upload_handler))
        .route("/upload-chunk", post(upload_chunk_handler))
        .layer(DefaultBodyLimit::max(limits.max_upload_bytes))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_metrics,
        ))
        .layer(TimeoutLayer::new(limits.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_http_server(config: &Config, state: HttpState) -> anyhow::Result<()> {
    let app = router(state, RouterLimits::from(config));

    let listener = tokio::net::TcpListener::bind(config.server.http_bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener: {}", e))?;

    tracing::info!(
        "Starting HTTP server on {} (cache '{}', max {} entries)",
        config.server.http_bind,
        config.cache.name,
        config.cache.max_entries
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
