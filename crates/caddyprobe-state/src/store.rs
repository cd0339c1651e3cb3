//! SnapshotStore — JSON file persistence of the previous run's aggregate.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use caddyprobe_core::Snapshot;

use crate::error::{StateError, StateResult};

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored snapshot. `Ok(None)` when no file exists yet.
    pub fn load(&self) -> StateResult<Option<Snapshot>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StateError::Read(e.to_string())),
        };
        let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(map_err!(Deserialize))?;
        Ok(Some(snapshot))
    }

    /// Read the stored snapshot, treating any failure as "no previous run".
    pub fn load_or_empty(&self) -> Option<Snapshot> {
        match self.load() {
            Ok(Some(snapshot)) => {
                debug!(path = ?self.path, last_run_at = ?snapshot.last_run_at, "snapshot loaded");
                Some(snapshot)
            }
            Ok(None) => {
                debug!(path = ?self.path, "no previous snapshot");
                None
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "discarding unreadable snapshot");
                None
            }
        }
    }

    /// Overwrite the stored snapshot, creating the parent directory if needed.
    pub fn save(&self, snapshot: &Snapshot) -> StateResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(map_err!(Write))?;
        }
        let json = serde_json::to_string_pretty(snapshot).map_err(map_err!(Serialize))?;
        std::fs::write(&self.path, json).map_err(map_err!(Write))?;
        debug!(path = ?self.path, keys = snapshot.values.len(), "snapshot stored");
        Ok(())
    }
}
