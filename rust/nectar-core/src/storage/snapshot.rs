// Snapshot - Versioned bincode file holding the whole state
use super::state::NectarState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Bumped on any incompatible layout change
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub version: u32,
    pub state: NectarState,
}

impl StateSnapshot {
    pub fn new(state: NectarState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            state,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        // Version is the leading field; check it before trusting the rest
        let version: u32 = bincode::deserialize(bytes)
            .map_err(|e| SnapshotError::SerializationFailed(e.to_string()))?;
        if version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                found: version,
                expected: SNAPSHOT_VERSION,
            });
        }

        bincode::deserialize(bytes).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    /// Writes through a temporary file and renames it into place
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| SnapshotError::WriteFailed(e.to_string()))?;
            }
        }

        let bytes = self.encode()?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes).map_err(|e| SnapshotError::WriteFailed(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| SnapshotError::WriteFailed(e.to_string()))?;

        info!("Saved state snapshot to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SnapshotError::NotFound(path.display().to_string()));
        }

        let bytes = fs::read(path).map_err(|e| SnapshotError::ReadFailed(e.to_string()))?;
        let snapshot = Self::decode(&bytes)?;
        debug!("Loaded state snapshot from {}", path.display());
        Ok(snapshot)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("No state at {0}; run `nectar init` first")]
    NotFound(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Snapshot version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },
}
