//! Error types for the polling watcher.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from watcher operations.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Giving up on {path} after {attempts} permission errors: {source}")]
    RetriesExhausted {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error("Watch cancelled")]
    Cancelled,

    #[error("Invalid watcher configuration: {reason}")]
    Config { reason: String },
}

impl WatchError {
    /// True for the cooperative-shutdown outcome of the existence gate.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WatchError::Cancelled)
    }

    pub(crate) fn stat(path: impl Into<PathBuf>, source: io::Error) -> Self {
        WatchError::Stat {
            path: path.into(),
            source,
        }
    }
}

pub type WatchResult<T> = Result<T, WatchError>;
