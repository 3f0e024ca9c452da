//! Pipeline errors.

use panelkit_data::DataError;
use panelkit_features::FeatureError;
use panelkit_link::LinkError;
use panelkit_output::SnapshotError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Any error raised by a pipeline step.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source pull failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// Feature computation failed
    #[error(transparent)]
    Feature(#[from] FeatureError),

    /// Linking failed
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Snapshot IO failed
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Invalid or missing setting
    #[error("Configuration error: {0}")]
    Config(String),
}
