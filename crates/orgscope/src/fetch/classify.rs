//! Failure taxonomy for the fetch layer.

use super::RawResponse;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared failure names that mean the request was cancelled or aborted.
const ABORT_NAMES: &[&str] = &["AbortError", "TimeoutError"];

/// Category of a terminal fetch failure. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// The server throttled the request (HTTP 429).
    Blockage,
    /// The attempt was aborted or timed out.
    Timeout,
    /// The connection could not be established or was lost.
    NetworkError,
    /// Anything else.
    Unknown,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureCategory::Blockage => "blockage",
            FailureCategory::Timeout => "timeout",
            FailureCategory::NetworkError => "network error",
            FailureCategory::Unknown => "unknown error",
        };
        f.write_str(s)
    }
}

/// A failure captured while performing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFailure {
    /// Declared failure name (e.g. `AbortError`, `NetworkError`).
    pub name: String,
    /// Human-readable message.
    pub message: String,
}

impl CapturedFailure {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Synthetic failure recorded when retries on 429 are exhausted.
    pub fn blocked() -> Self {
        Self::new("Error", "Request blocked (HTTP 429)")
    }

    fn is_abort(&self) -> bool {
        ABORT_NAMES.contains(&self.name.as_str())
    }
}

impl fmt::Display for CapturedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Terminal outcome of a fetch that could not produce a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} ({category})", .cause.message)]
pub struct ClassifiedFailure {
    pub category: FailureCategory,
    pub cause: CapturedFailure,
}

/// Map a captured failure and/or response to a [`FailureCategory`].
///
/// Rules are evaluated in order and the first match wins: a 429 response
/// always yields `Blockage`, regardless of the paired failure.
pub fn classify(failure: Option<&CapturedFailure>, response: Option<&RawResponse>) -> FailureCategory {
    if response.is_some_and(|r| r.status == 429) {
        return FailureCategory::Blockage;
    }
    if let Some(failure) = failure {
        let msg = failure.message.to_lowercase();
        if failure.is_abort() || msg.contains("timeout") {
            return FailureCategory::Timeout;
        }
        if msg.contains("network") {
            return FailureCategory::NetworkError;
        }
    }
    FailureCategory::Unknown
}
