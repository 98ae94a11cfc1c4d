//! TTL file cache for inventory snapshots
//!
//! One JSON file holding the raw server records and the time they were
//! fetched. A fresh snapshot short-circuits the provider fetch; a stale
//! or unreadable one is ignored and overwritten on the next store.
//! Concurrent writers race with last-writer-wins semantics.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub cached_at: DateTime<Utc>,
    pub servers: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct InventoryCache {
    path: PathBuf,
    ttl_secs: u64,
}

impl InventoryCache {
    pub fn new(path: impl Into<PathBuf>, ttl_secs: u64) -> Self {
        Self {
            path: path.into(),
            ttl_secs,
        }
    }

    /// Load the snapshot if it exists and is within the TTL. A corrupt
    /// or stale file reads as a miss, never as an error.
    pub fn load_fresh(&self) -> Option<Snapshot> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let snapshot: Snapshot = serde_json::from_str(&raw).ok()?;
        if self.is_stale(&snapshot, Utc::now()) {
            tracing::debug!(path = %self.path.display(), "inventory cache is stale");
            return None;
        }
        tracing::debug!(path = %self.path.display(), "serving inventory from cache");
        Some(snapshot)
    }

    pub fn store(&self, servers: &[Value]) -> Result<Snapshot> {
        let snapshot = Snapshot {
            cached_at: Utc::now(),
            servers: servers.to_vec(),
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create cache directory {}", parent.display())
                })?;
            }
        }
        let raw = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write inventory cache {}", self.path.display()))?;
        Ok(snapshot)
    }

    fn is_stale(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(snapshot.cached_at);
        age.num_seconds() < 0 || age.num_seconds() as u64 > self.ttl_secs
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn round_trips_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = InventoryCache::new(dir.path().join("snap.json"), 300);
        let servers = vec![json!({"id": 1, "hostname": "h1"})];
        cache.store(&servers).unwrap();

        let loaded = cache.load_fresh().unwrap();
        assert_eq!(loaded.servers, servers);
    }

    #[test]
    fn stale_snapshot_reads_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = InventoryCache::new(dir.path().join("snap.json"), 300);
        let snapshot = Snapshot {
            cached_at: Utc::now() - Duration::seconds(301),
            servers: vec![],
        };
        std::fs::write(cache.path(), serde_json::to_string(&snapshot).unwrap()).unwrap();
        assert!(cache.load_fresh().is_none());

        // A future timestamp is treated as stale too, not trusted.
        let clock_skewed = Snapshot {
            cached_at: Utc::now() + Duration::seconds(600),
            servers: vec![],
        };
        std::fs::write(cache.path(), serde_json::to_string(&clock_skewed).unwrap()).unwrap();
        assert!(cache.load_fresh().is_none());
    }

    #[test]
    fn missing_or_corrupt_file_reads_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = InventoryCache::new(dir.path().join("snap.json"), 300);
        assert!(cache.load_fresh().is_none());

        std::fs::write(cache.path(), "not json").unwrap();
        assert!(cache.load_fresh().is_none());
    }
}
