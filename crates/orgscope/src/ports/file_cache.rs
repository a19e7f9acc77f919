//! Result cache backed by the filesystem.
//!
//! One JSON file per key, named by the FNV-1a hash of the key. Each file
//! records the full key, so a hash collision reads as a miss instead of
//! returning another page's record. Expired entries are deleted on lookup.

use super::{CacheError, CacheStore};
use crate::record::EntityRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Suffix counter so concurrent writers never share a temp file.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    key: String,
    stored_at: DateTime<Utc>,
    ttl_secs: u64,
    records: Vec<EntityRecord>,
}

impl CacheFile {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.stored_at);
        age.num_seconds() < 0 || age.num_seconds() as u64 > self.ttl_secs
    }
}

/// Filesystem [`CacheStore`] rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    cache_dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// `<user cache dir>/orgscope`, or `.orgscope-cache` when the platform
    /// has no cache directory.
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .map(|d| d.join("orgscope"))
            .unwrap_or_else(|| PathBuf::from(".orgscope-cache"))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let mut hasher = fnv::FnvHasher::default();
        hasher.write(key.as_bytes());
        self.cache_dir.join(format!("{:016x}.json", hasher.finish()))
    }

    /// Private staging file for one write of `entry`.
    fn staging_path(entry: &Path) -> PathBuf {
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        entry.with_extension(format!("json.{}-{seq}.tmp", std::process::id()))
    }

    /// Delete every cached entry and any staging file left by an interrupted
    /// write. Returns how many entries were removed.
    pub async fn clear(&self) -> Result<usize, CacheError> {
        let mut entries = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some("json") => {
                    tokio::fs::remove_file(&path).await?;
                    removed += 1;
                }
                Some("tmp") => tokio::fs::remove_file(&path).await?,
                _ => {}
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn lookup(&self, key: &str) -> Result<Option<Vec<EntityRecord>>, CacheError> {
        let path = self.entry_path(key);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let file: CacheFile = serde_json::from_slice(&data)?;
        if file.key != key {
            debug!(key, "cache file belongs to another key");
            return Ok(None);
        }
        if file.is_expired(Utc::now()) {
            debug!(key, "cache entry expired");
            let _ = tokio::fs::remove_file(&path).await;
            return Ok(None);
        }
        Ok(Some(file.records))
    }

    async fn store(&self, key: &str, records: &[EntityRecord], ttl: Duration) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let file = CacheFile {
            key: key.to_string(),
            stored_at: Utc::now(),
            ttl_secs: ttl.as_secs(),
            records: records.to_vec(),
        };
        let data = serde_json::to_vec(&file)?;

        // Write-then-rename so readers never see a partial file.
        let path = self.entry_path(key);
        let tmp = Self::staging_path(&path);
        tokio::fs::write(&tmp, data).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}
