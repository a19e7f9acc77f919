//! Credential lookups.
//!
//! ## Environment store
//!
//! A key such as `proxy` is resolved from (in order of priority):
//! 1. `ORGSCOPE_CREDENTIAL_PROXY_FILE` → reads the value from that file
//! 2. `ORGSCOPE_CREDENTIAL_PROXY` → uses the value directly (visible in `ps`)
//!
//! Prefer the `_FILE` form: file paths do not leak secrets through the
//! process list.

use super::CredentialStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::warn;

/// Default prefix for credential environment variables.
pub const ENV_PREFIX: &str = "ORGSCOPE_CREDENTIAL_";

/// Credentials from environment variables.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    prefix: String,
}

impl Default for EnvCredentialStore {
    fn default() -> Self {
        Self::with_prefix(ENV_PREFIX)
    }
}

impl EnvCredentialStore {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable name for `key`.
    pub fn var_name(&self, key: &str) -> String {
        let suffix: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{suffix}", self.prefix)
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn get(&self, key: &str) -> Option<String> {
        let var = self.var_name(key);

        if let Ok(path) = std::env::var(format!("{var}_FILE")) {
            match tokio::fs::read_to_string(&path).await {
                Ok(value) => {
                    let value = value.trim().to_string();
                    return (!value.is_empty()).then_some(value);
                }
                Err(e) => warn!(path = %path, error = %e, "cannot read credential file"),
            }
        }

        std::env::var(&var).ok().filter(|v| !v.is_empty())
    }
}

/// Fixed credentials, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    values: HashMap<String, String>,
}

impl StaticCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
