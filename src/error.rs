//! Error types for the snapshot store and the polling cycle.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by [`crate::store::SnapshotStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// No snapshot has been written yet. Not fatal for the cycle.
    #[error("snapshot not found: {0}")]
    NotFound(PathBuf),

    #[error("snapshot unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot row {row} in {path}: {reason}")]
    Malformed {
        path: PathBuf,
        row: usize,
        reason: String,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Reasons a polling cycle was skipped. None of them stop the scheduler.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("fetch failed: {0:#}")]
    Fetch(anyhow::Error),

    #[error("storage unavailable: {0}")]
    Storage(#[from] StoreError),

    /// A cycle was requested while another one was still running.
    #[error("a cycle is already running")]
    Busy,
}

pub type CycleResult<T> = Result<T, CycleError>;
