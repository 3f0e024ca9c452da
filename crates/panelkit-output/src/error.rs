//! Error types for snapshot and report IO.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Errors that can occur while writing or reading snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No snapshot has been written for the dataset yet
    #[error("Snapshot not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Unrecognized dataset or format name
    #[error("Unknown {kind}: {name}")]
    Unknown {
        /// What was being parsed
        kind: &'static str,
        /// The rejected value
        name: String,
    },
}
