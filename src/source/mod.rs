//! Data source for archived board snapshots.
//!
//! Two read-only JSON endpoints exist per board: `index.json` (all thread
//! summaries) and `{thread}.json` (one thread with its responses). Everything
//! fetched is memoized by URL for the life of the [`DataSource`]; snapshots are
//! immutable per URL, so nothing is ever evicted implicitly.

pub mod model;

use async_trait::async_trait;
use log::{debug, error, trace};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

use crate::config::Config;
pub use model::{Response, ThreadDetail, ThreadSummary};

/// Anything that can go wrong while loading a snapshot. Viewers only ever see
/// the message text.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("{path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Raw body retrieval for a snapshot URL
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches over HTTP(S)
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpTransport {
    pub fn new() -> Self {
        HttpTransport { client: reqwest::Client::new() }
    }
}

#[cfg(feature = "http")]
impl Default for HttpTransport {
    fn default() -> Self { Self::new() }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        trace!("GET {}", url);
        let resp = self.client.get(url).send().await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }
        resp.text().await.map_err(|e| FetchError::Transport(e.to_string()))
    }
}

/// Reads snapshots mirrored to a local directory. URLs are plain paths or
/// `file://` URLs; a missing file is reported like an HTTP 404.
#[derive(Debug, Default)]
pub struct FsTransport;

#[async_trait]
impl Transport for FsTransport {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        trace!("read {}", path.display());
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::Status {
                status: 404,
                reason: "Not Found".to_string(),
            }),
            Err(source) => Err(FetchError::Io { path: path.display().to_string(), source }),
        }
    }
}

/// Serves bodies from a map; used by tests and for pre-seeded snapshots.
#[derive(Debug, Default, Clone)]
pub struct MemoryTransport {
    bodies: HashMap<String, String>,
    requests: Arc<AtomicUsize>,
}

impl MemoryTransport {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<String>) {
        self.bodies.insert(url.into(), body.into());
    }

    /// Shared counter of `get` calls, readable after the transport is moved
    pub fn request_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.bodies.get(url).cloned().ok_or_else(|| FetchError::Status {
            status: 404,
            reason: "Not Found".to_string(),
        })
    }
}

/// Pick a transport for the configured base location
pub fn transport_for(base: &str) -> Box<dyn Transport> {
    if base.starts_with("http://") || base.starts_with("https://") {
        #[cfg(feature = "http")]
        {
            return Box::new(HttpTransport::new());
        }
        #[cfg(not(feature = "http"))]
        {
            log::warn!("Built without the 'http' feature; treating {} as a local path", base);
        }
    }
    Box::new(FsTransport)
}

/// Memoizing fetcher for index and thread snapshots
pub struct DataSource {
    config: Config,
    transport: Box<dyn Transport>,
    cache: HashMap<String, serde_json::Value>,
}

impl DataSource {
    pub fn new(config: Config, transport: Box<dyn Transport>) -> Self {
        DataSource { config, transport, cache: HashMap::new() }
    }

    /// Data source with the transport implied by `data_base_url`
    pub fn from_config(config: Config) -> Self {
        let transport = transport_for(&config.archive.data_base_url);
        Self::new(config, transport)
    }

    /// Fetch and parse a JSON document, answering from the cache when possible
    pub async fn fetch_json(&mut self, url: &str) -> Result<serde_json::Value, FetchError> {
        if let Some(hit) = self.cache.get(url) {
            trace!("cache hit {}", url);
            return Ok(hit.clone());
        }
        let result = async {
            let body = self.transport.get(url).await?;
            Ok::<_, FetchError>(serde_json::from_str::<serde_json::Value>(&body)?)
        }.await;
        match result {
            Ok(value) => {
                debug!("fetched {}", url);
                self.cache.insert(url.to_string(), value.clone());
                Ok(value)
            }
            Err(e) => {
                error!("Fetch error: {} ({})", e, url);
                Err(e)
            }
        }
    }

    /// Thread summaries for a board, in snapshot order
    pub async fn fetch_index(&mut self, board_id: &str) -> Result<Vec<ThreadSummary>, FetchError> {
        let url = self.config.index_url(board_id);
        let value = self.fetch_json(&url).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn fetch_thread(&mut self, board_id: &str, thread_id: &str) -> Result<ThreadDetail, FetchError> {
        let url = self.config.thread_url(board_id, thread_id);
        let value = self.fetch_json(&url).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.cache.contains_key(url)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        debug!("clearing {} cached snapshots", self.cache.len());
        self.cache.clear();
    }
}
