//! Resilient HTTP acquisition.
//!
//! The fetcher talks to the network only through the [`Transport`] port and
//! waits only through the [`Scheduler`] port, so retry decisions can be
//! exercised without sockets or wall-clock time.

pub mod classify;
pub mod http_client;
pub mod retry;

use async_trait::async_trait;
use std::time::Duration;

pub use classify::{classify, CapturedFailure, ClassifiedFailure, FailureCategory};
pub use http_client::HttpTransport;
pub use retry::{FetchConfig, ResilientFetcher};

/// A single outbound GET request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Target URL.
    pub url: String,
    /// Extra request headers (name, value).
    pub headers: Vec<(String, String)>,
    /// Per-attempt timeout.
    pub timeout: Duration,
}

/// Raw response as seen by the retry loop.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// A successfully fetched document.
///
/// "Successful" means the request completed with anything other than a
/// 429; non-429 error statuses are returned here as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Raw body text.
    pub body: String,
}

impl From<RawResponse> for FetchedDocument {
    fn from(r: RawResponse) -> Self {
        Self {
            final_url: r.final_url,
            status: r.status,
            body: r.body,
        }
    }
}

/// Network port used by [`ResilientFetcher`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request attempt.
    async fn send(&self, request: &FetchRequest) -> Result<RawResponse, CapturedFailure>;
}

/// Timer port used between retry attempts.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Suspend the current fetch for `delay`.
    async fn sleep(&self, delay: Duration);
}

/// Scheduler backed by the tokio timer. Never blocks the worker thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
