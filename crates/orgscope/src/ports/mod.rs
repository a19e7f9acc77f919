//! Narrow ports to the collaborators outside the core.
//!
//! The scraper never reaches for global state: the response cache and the
//! credential lookup are passed in as trait objects.

pub mod credentials;
pub mod file_cache;
pub mod memory;

use crate::record::EntityRecord;
use async_trait::async_trait;
use std::time::Duration;

pub use credentials::{EnvCredentialStore, StaticCredentialStore};
pub use file_cache::FileCacheStore;
pub use memory::MemoryCacheStore;

/// Default lifetime of a cached result: 30 days.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(2_592_000);

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache entry is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key/value store for finished results, keyed by normalized URL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// A live (unexpired) entry for `key`, if any.
    async fn lookup(&self, key: &str) -> Result<Option<Vec<EntityRecord>>, CacheError>;

    /// Store `records` under `key` for `ttl`.
    async fn store(&self, key: &str, records: &[EntityRecord], ttl: Duration) -> Result<(), CacheError>;
}

/// Read-only secret lookup by a fixed identifier.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
}

/// Cache that never hits and drops every write.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

#[async_trait]
impl CacheStore for NoCache {
    async fn lookup(&self, _key: &str) -> Result<Option<Vec<EntityRecord>>, CacheError> {
        Ok(None)
    }

    async fn store(&self, _key: &str, _records: &[EntityRecord], _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cache_never_hits() {
        let cache = NoCache;
        tokio_test::block_on(async {
            cache.store("k", &[], DEFAULT_CACHE_TTL).await.unwrap();
            assert!(cache.lookup("k").await.unwrap().is_none());
        });
    }

    #[test]
    fn test_ports_are_object_safe() {
        let cache: Box<dyn CacheStore> = Box::new(MemoryCacheStore::new());
        let creds: Box<dyn CredentialStore> =
            Box::new(StaticCredentialStore::new().with("proxy", "p"));
        tokio_test::block_on(async {
            assert!(cache.lookup("missing").await.unwrap().is_none());
            assert_eq!(creds.get("proxy").await.as_deref(), Some("p"));
        });
    }
}
