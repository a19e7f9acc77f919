//! Request entry point: validation, cache, credentials, fetch, extraction.

use crate::extract::{extract_record, ExtractionError};
use crate::fetch::{ClassifiedFailure, FetchConfig, HttpTransport, ResilientFetcher};
use crate::ports::{CacheStore, CredentialStore, DEFAULT_CACHE_TTL};
use crate::record::{response_body, EntityRecord, ErrorBody};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Request method as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMethod {
    Post,
    Other(String),
}

impl FromStr for InputMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("POST") {
            Self::Post
        } else {
            Self::Other(s.to_ascii_uppercase())
        })
    }
}

impl fmt::Display for InputMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post => write!(f, "POST"),
            Self::Other(m) => write!(f, "{m}"),
        }
    }
}

/// One scrape invocation.
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub method: InputMethod,
    pub url: Option<String>,
    /// Consult the cache before fetching. Results are stored either way.
    pub use_cache: bool,
}

impl ScrapeRequest {
    /// A POST for `url` with the cache enabled.
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: InputMethod::Post,
            url: Some(url.into()),
            use_cache: true,
        }
    }
}

/// Scraper settings.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub fetch: FetchConfig,
    pub cache_ttl: Duration,
    /// Credential store key holding the proxy value.
    pub credential_key: String,
    /// Outbound header that carries the proxy credential.
    pub proxy_header: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
            credential_key: "proxy".to_string(),
            proxy_header: "X-Proxy".to_string(),
        }
    }
}

/// Errors surfaced to the caller, each with a fixed status code.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("Only POST requests are allowed")]
    MethodNotAllowed(InputMethod),

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Failed to fetch company page: {0}")]
    Fetch(#[from] ClassifiedFailure),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScrapeError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MethodNotAllowed(_) => 405,
            Self::InvalidInput(_) => 400,
            Self::Extraction(ExtractionError::MalformedContent(_)) => 400,
            Self::Extraction(ExtractionError::EntityNotFound) => 404,
            Self::Fetch(_) | Self::Internal(_) => 500,
        }
    }

    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }
}

/// Wires fetch and extraction together behind the cache and credential ports.
#[derive(Clone)]
pub struct Scraper {
    fetcher: ResilientFetcher,
    cache: Arc<dyn CacheStore>,
    credentials: Arc<dyn CredentialStore>,
    config: ScraperConfig,
    pending_writes: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Scraper {
    pub fn new(
        fetcher: ResilientFetcher,
        cache: Arc<dyn CacheStore>,
        credentials: Arc<dyn CredentialStore>,
        config: ScraperConfig,
    ) -> Self {
        Self {
            fetcher,
            cache,
            credentials,
            config,
            pending_writes: Arc::default(),
        }
    }

    /// Scraper over the reqwest transport and tokio timer.
    pub fn with_http(
        cache: Arc<dyn CacheStore>,
        credentials: Arc<dyn CredentialStore>,
        config: ScraperConfig,
    ) -> Self {
        let transport = Arc::new(HttpTransport::new(&config.fetch.user_agent));
        let fetcher = ResilientFetcher::new(transport, config.fetch.clone());
        Self::new(fetcher, cache, credentials, config)
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Handle one request, returning the single-record response body.
    pub async fn scrape(&self, request: &ScrapeRequest) -> Result<Vec<EntityRecord>, ScrapeError> {
        if request.method != InputMethod::Post {
            return Err(ScrapeError::MethodNotAllowed(request.method.clone()));
        }
        let url = validate_url(request.url.as_deref())?;
        let key = url.as_str();

        if request.use_cache {
            match self.cache.lookup(key).await {
                Ok(Some(records)) => {
                    info!(url = key, "cache hit");
                    return Ok(records);
                }
                Ok(None) => debug!(url = key, "cache miss"),
                Err(e) => warn!(url = key, error = %e, "cache lookup failed, fetching"),
            }
        }

        let mut headers = Vec::new();
        if let Some(proxy) = self.credentials.get(&self.config.credential_key).await {
            headers.push((self.config.proxy_header.clone(), proxy));
        }

        let document = self.fetcher.fetch(key, &headers).await?;
        debug!(url = key, final_url = %document.final_url, status = document.status, "document fetched");

        let record = tokio::task::spawn_blocking(move || {
            extract_record(&document.body, &document.final_url)
        })
        .await
        .map_err(|e| ScrapeError::Internal(e.to_string()))??;

        let records = response_body(record);
        self.store_in_background(key.to_string(), records.clone());
        Ok(records)
    }

    fn store_in_background(&self, key: String, records: Vec<EntityRecord>) {
        let cache = Arc::clone(&self.cache);
        let ttl = self.config.cache_ttl;
        let handle = tokio::spawn(async move {
            match cache.store(&key, &records, ttl).await {
                Ok(()) => debug!(url = %key, "result cached"),
                Err(e) => warn!(url = %key, error = %e, "failed to cache result"),
            }
        });
        if let Ok(mut pending) = self.pending_writes.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
    }

    /// Wait for background cache writes started so far. Call before the
    /// runtime shuts down if the writes must land.
    pub async fn flush(&self) {
        let handles = match self.pending_writes.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "cache write task failed");
            }
        }
    }
}

/// Parse and normalize the caller's URL. Only absolute http(s) URLs pass.
pub fn validate_url(raw: Option<&str>) -> Result<Url, ScrapeError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ScrapeError::InvalidInput("URL is required".to_string()))?;
    let url = Url::parse(raw).map_err(|e| ScrapeError::InvalidInput(format!("Invalid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ScrapeError::InvalidInput(format!(
            "Invalid URL: unsupported scheme '{other}'"
        ))),
    }
}
