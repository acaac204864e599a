//! Snapshot cache for the published sensor state.
//!
//! The last successfully refreshed `SensorState` is kept on disk so a
//! restart can show the previous package list until the next refresh.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mhtrack_core::SensorState;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SNAPSHOT_FILE: &str = "sensor.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes().max(0)
    }
}

pub struct SnapshotCache {
    cache_dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir).with_context(|| {
            format!("Failed to create cache directory {}", cache_dir.display())
        })?;
        Ok(Self { cache_dir })
    }

    fn snapshot_path(&self) -> PathBuf {
        self.cache_dir.join(SNAPSHOT_FILE)
    }

    pub fn load(&self) -> Result<Option<CachedData<SensorState>>> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let cached: CachedData<SensorState> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

        debug!(age_minutes = cached.age_minutes(), "Loaded sensor snapshot");
        Ok(Some(cached))
    }

    pub fn save(&self, state: &SensorState) -> Result<()> {
        let cached = CachedData::new(state);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(self.snapshot_path(), contents)
            .context("Failed to write sensor snapshot")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = SnapshotCache::new(dir.path().join("alice")).expect("cache dir");
        assert!(cache.load().expect("load ok").is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = SnapshotCache::new(dir.path().to_path_buf()).expect("cache dir");

        let mut state = SensorState::new("alice");
        state.state = Some(chrono::Local::now());
        cache.save(&state).expect("save ok");

        let loaded = cache.load().expect("load ok").expect("snapshot present");
        assert_eq!(loaded.data.unique_id, "matkahuolto_alice");
        assert_eq!(loaded.data.state, state.state);
        assert_eq!(loaded.age_minutes(), 0);
    }

    #[test]
    fn test_corrupt_snapshot_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = SnapshotCache::new(dir.path().to_path_buf()).expect("cache dir");
        std::fs::write(dir.path().join(SNAPSHOT_FILE), "{").expect("write");
        assert!(cache.load().is_err());
    }
}
