//! Persisted price snapshots
//!
//! Reads are permissive: a missing, unreadable, foreign-region, future-dated or
//! expired snapshot is a miss, never an error.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::catalog::PriceTable;
use crate::error::EstimationResult;

/// Default validity window for a persisted snapshot
pub const DEFAULT_VALIDITY_HOURS: i64 = 24;

/// On-disk snapshot record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    pub captured_at: DateTime<Utc>,
    pub region: String,
    pub pricing: PriceTable,
}

/// Snapshot file store with a validity window
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
    validity: Duration,
}

impl SnapshotCache {
    pub fn new(dir: impl Into<PathBuf>, validity: Duration) -> Self {
        Self {
            dir: dir.into(),
            validity,
        }
    }

    pub fn with_default_validity(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, Duration::hours(DEFAULT_VALIDITY_HOURS))
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Snapshot file path for a region
    pub fn path_for(&self, region: &str) -> PathBuf {
        self.dir.join(format!("pricing_cache_{}.json", region))
    }

    /// Whether a snapshot captured at `captured_at` is still usable at `now`.
    ///
    /// A snapshot whose age equals the validity window is expired.
    pub fn is_fresh(&self, captured_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let age = now - captured_at;
        age >= Duration::zero() && age < self.validity
    }

    /// Read a usable snapshot for `region`, if any
    pub fn read(&self, region: &str, now: DateTime<Utc>) -> Option<PersistedSnapshot> {
        let path = self.path_for(region);
        let snapshot = match read_snapshot(&path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No usable pricing snapshot");
                return None;
            }
        };

        if snapshot.region != region {
            debug!(
                path = %path.display(),
                found = %snapshot.region,
                expected = region,
                "Snapshot region mismatch"
            );
            return None;
        }

        if !self.is_fresh(snapshot.captured_at, now) {
            debug!(
                path = %path.display(),
                captured_at = %snapshot.captured_at,
                "Snapshot outside validity window"
            );
            return None;
        }

        Some(snapshot)
    }

    /// Persist a snapshot, creating the cache directory if needed
    pub fn write(&self, snapshot: &PersistedSnapshot) -> EstimationResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&snapshot.region);
        let body = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&path, body)?;
        Ok(path)
    }
}

fn read_snapshot(path: &Path) -> EstimationResult<PersistedSnapshot> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
