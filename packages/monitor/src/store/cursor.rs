//! Persisted read position into the order log.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Serialize, Deserialize)]
struct CursorState {
    offset: u64,
}

/// Byte offset of the last fully consumed position in the order log.
///
/// Loading is infallible by design: an absent or unreadable cursor means
/// "start from the beginning", never a dead notifier.
#[derive(Debug, Clone)]
pub struct Cursor {
    path: PathBuf,
}

impl Cursor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last persisted offset; 0 when absent or unreadable.
    pub fn load(&self) -> u64 {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str::<CursorState>(&raw) {
                Ok(state) => state.offset,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "cursor file is corrupt, restarting from 0");
                    0
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cursor file is unreadable, restarting from 0");
                0
            }
        }
    }

    /// Persist the offset reached by a completed pass.
    pub fn store(&self, offset: u64) -> StoreResult<()> {
        let body =
            serde_json::to_string(&CursorState { offset }).map_err(|e| StoreError::Encode {
                path: self.path.display().to_string(),
                source: e,
            })?;
        std::fs::write(&self.path, body).map_err(|e| StoreError::Io {
            path: self.path.display().to_string(),
            source: e,
        })
    }
}
