//! Durable session checkpoints.
//!
//! A single versioned JSON record written with replace-on-write semantics,
//! so an interrupted run can always resume from the last saved cursor and
//! a crash mid-write never leaves a torn file behind.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("failed to serialize checkpoint: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write checkpoint {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Versioned progress record for one attack session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub attempts: u64,
    pub cursor: usize,
    pub found: bool,
    pub blacklist: Vec<String>,
    pub timestamp: f64,
}

impl Checkpoint {
    pub fn new(attempts: u64, cursor: usize, found: bool, blacklist: Vec<String>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            attempts,
            cursor,
            found,
            blacklist,
            timestamp: epoch_seconds(),
        }
    }
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self::new(0, 0, false, Vec::new())
    }
}

fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Owns snapshot I/O for one checkpoint path.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes to a sibling temp file, then renames over the target so
    /// readers never observe a partial record.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let bytes = serde_json::to_vec_pretty(checkpoint)?;
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, &bytes).map_err(|source| CheckpointError::Write {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &self.path).map_err(|source| CheckpointError::Write {
            path: self.path.clone(),
            source,
        })?;
        log::debug!(
            "checkpoint saved: cursor {} attempts {}",
            checkpoint.cursor,
            checkpoint.attempts
        );
        Ok(())
    }

    /// Best-effort load. A missing file, unreadable JSON, or an unknown
    /// version all yield a zero-valued checkpoint and a log line; this
    /// never fails the caller.
    pub fn load(&self) -> Checkpoint {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    log::warn!(
                        "checkpoint {} unreadable, starting fresh: {}",
                        self.path.display(),
                        err
                    );
                }
                return Checkpoint::default();
            }
        };
        match serde_json::from_slice::<Checkpoint>(&bytes) {
            Ok(checkpoint) if checkpoint.version == CHECKPOINT_VERSION => {
                log::info!(
                    "resuming from checkpoint: cursor {} attempts {}",
                    checkpoint.cursor,
                    checkpoint.attempts
                );
                checkpoint
            }
            Ok(checkpoint) => {
                log::warn!(
                    "checkpoint version {} not supported, starting fresh",
                    checkpoint.version
                );
                Checkpoint::default()
            }
            Err(err) => {
                log::warn!(
                    "checkpoint {} corrupt, starting fresh: {}",
                    self.path.display(),
                    err
                );
                Checkpoint::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> CheckpointStore {
        CheckpointStore::new(dir.path().join("session.json"))
    }

    #[test]
    fn round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let saved = Checkpoint::new(
            1234,
            567,
            false,
            vec!["http://1.1.1.1:8080".into(), "http://2.2.2.2:8080".into()],
        );
        store.save(&saved).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.attempts, 1234);
        assert_eq!(loaded.cursor, 567);
        assert!(!loaded.found);
        assert_eq!(loaded.blacklist, saved.blacklist);
        assert_eq!(loaded.version, CHECKPOINT_VERSION);
    }

    #[test]
    fn missing_file_yields_zero_values() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = store_in(&dir).load();
        assert_eq!(loaded.attempts, 0);
        assert_eq!(loaded.cursor, 0);
        assert!(!loaded.found);
        assert!(loaded.blacklist.is_empty());
    }

    #[test]
    fn corrupt_file_yields_zero_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), b"definitely not json{{{").unwrap();
        let loaded = store.load();
        assert_eq!(loaded.cursor, 0);
        assert!(!loaded.found);
    }

    #[test]
    fn unknown_version_yields_zero_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let future = serde_json::json!({
            "version": 99,
            "attempts": 10,
            "cursor": 10,
            "found": true,
            "blacklist": [],
            "timestamp": 0.0,
        });
        fs::write(store.path(), serde_json::to_vec(&future).unwrap()).unwrap();
        let loaded = store.load();
        assert_eq!(loaded.cursor, 0);
        assert!(!loaded.found);
    }

    #[test]
    fn save_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&Checkpoint::default()).unwrap();
        store.save(&Checkpoint::new(5, 5, false, Vec::new())).unwrap();
        assert!(store.path().exists());
        assert!(!store.path().with_extension("tmp").exists());
        assert_eq!(store.load().cursor, 5);
    }
}
