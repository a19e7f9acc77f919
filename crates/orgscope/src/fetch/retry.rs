//! Bounded retry with exponential backoff.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! Idle → Attempting → Succeeded
//!                   → Backoff → Attempting
//!                   → Failed
//! ```
//!
//! Only 429 responses and transport failures move to `Backoff`. Every other
//! response, including 4xx/5xx, is final. The delay scheduled after failed
//! attempt `n` (0-based) is `base_delay × 2^n`.

use super::{
    classify, CapturedFailure, ClassifiedFailure, FetchRequest, FetchedDocument, RawResponse,
    Scheduler, TokioScheduler, Transport,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Retry and request settings for one fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Retries after the first attempt; at most `max_retries + 1` attempts.
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each later retry.
    pub base_delay: Duration,
    /// Timeout applied to each attempt separately.
    pub timeout: Duration,
    /// User-Agent sent with every request.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            base_delay: Duration::from_millis(1000),
            timeout: Duration::from_millis(5000),
            user_agent: "Mozilla/5.0 (compatible; orgscope/0.1)".to_string(),
        }
    }
}

/// Backoff delay scheduled after failed attempt `attempt`. Saturates.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

#[derive(Debug)]
enum FetchState {
    Idle,
    Attempting { attempt: u32 },
    Backoff { attempt: u32, delay: Duration },
    Succeeded(FetchedDocument),
    Failed(ClassifiedFailure),
}

/// Fetches one document, retrying rate limits and transport failures.
#[derive(Clone)]
pub struct ResilientFetcher {
    transport: Arc<dyn Transport>,
    scheduler: Arc<dyn Scheduler>,
    config: FetchConfig,
}

impl ResilientFetcher {
    /// Fetcher using the tokio timer between attempts.
    pub fn new(transport: Arc<dyn Transport>, config: FetchConfig) -> Self {
        Self::with_scheduler(transport, Arc::new(TokioScheduler), config)
    }

    /// Fetcher with an explicit scheduler, e.g. a virtual clock in tests.
    pub fn with_scheduler(
        transport: Arc<dyn Transport>,
        scheduler: Arc<dyn Scheduler>,
        config: FetchConfig,
    ) -> Self {
        Self {
            transport,
            scheduler,
            config,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch `url` with the given extra headers.
    ///
    /// Returns the document for any non-429 response, or the classified
    /// failure once retries are exhausted.
    pub async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<FetchedDocument, ClassifiedFailure> {
        let request = FetchRequest {
            url: url.to_string(),
            headers: headers.to_vec(),
            timeout: self.config.timeout,
        };

        let mut state = FetchState::Idle;
        loop {
            state = match state {
                FetchState::Idle => FetchState::Attempting { attempt: 0 },
                FetchState::Attempting { attempt } => self.attempt(&request, attempt).await,
                FetchState::Backoff { attempt, delay } => {
                    self.scheduler.sleep(delay).await;
                    FetchState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                FetchState::Succeeded(doc) => return Ok(doc),
                FetchState::Failed(failure) => return Err(failure),
            };
        }
    }

    async fn attempt(&self, request: &FetchRequest, attempt: u32) -> FetchState {
        debug!(url = %request.url, attempt, "fetch attempt");
        match self.transport.send(request).await {
            Ok(response) if response.status == 429 => {
                if attempt < self.config.max_retries {
                    let delay = backoff_delay(self.config.base_delay, attempt);
                    warn!(url = %request.url, attempt, ?delay, "rate limited (HTTP 429), backing off");
                    FetchState::Backoff { attempt, delay }
                } else {
                    FetchState::Failed(self.exhausted(CapturedFailure::blocked(), Some(&response)))
                }
            }
            Ok(response) => FetchState::Succeeded(response.into()),
            Err(failure) => {
                if attempt < self.config.max_retries {
                    let delay = backoff_delay(self.config.base_delay, attempt);
                    warn!(url = %request.url, attempt, ?delay, error = %failure, "fetch failed, backing off");
                    FetchState::Backoff { attempt, delay }
                } else {
                    FetchState::Failed(self.exhausted(failure, None))
                }
            }
        }
    }

    /// Upper bound on attempts for one fetch.
    fn total_attempts(&self) -> u32 {
        self.config.max_retries.saturating_add(1)
    }

    fn exhausted(&self, cause: CapturedFailure, response: Option<&RawResponse>) -> ClassifiedFailure {
        let category = classify(Some(&cause), response);
        error!(
            category = %category,
            error = %cause,
            attempts = self.total_attempts(),
            "fetch failed after retries"
        );
        ClassifiedFailure { category, cause }
    }
}
