//! Leader snapshot stored as a small pretty-printed JSON file

use super::{SnapshotStore, write_atomically};
use crate::app::models::LeaderSnapshot;
use crate::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// JSON file overwritten with the latest leader every cycle
#[derive(Debug, Clone)]
pub struct JsonSnapshotFile {
    path: PathBuf,
}

impl JsonSnapshotFile {
    /// Create a snapshot file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current snapshot back
    pub fn read(&self) -> Result<LeaderSnapshot> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::io(format!("Failed to read {}", self.path.display()), e))?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl SnapshotStore for JsonSnapshotFile {
    fn save_snapshot(&self, snapshot: &LeaderSnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;

        write_atomically(&self.path, |file| {
            file.write_all(json.as_bytes())
                .and_then(|()| file.write_all(b"\n"))
                .map_err(|e| Error::io(format!("Failed to write {}", self.path.display()), e))
        })?;

        debug!("Wrote leader snapshot to {}", self.path.display());
        Ok(())
    }
}
