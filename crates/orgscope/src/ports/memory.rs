//! In-process cache, mostly for tests and one-shot runs.

use super::{CacheError, CacheStore};
use crate::record::EntityRecord;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Entry {
    stored_at: Instant,
    ttl: Duration,
    records: Vec<EntityRecord>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

/// Concurrent in-memory [`CacheStore`] with per-entry TTL.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, Entry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn lookup(&self, key: &str) -> Result<Option<Vec<EntityRecord>>, CacheError> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.records.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn store(&self, key: &str, records: &[EntityRecord], ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                stored_at: Instant::now(),
                ttl,
                records: records.to_vec(),
            },
        );
        Ok(())
    }
}
