//! Error types for feature computation.

use thiserror::Error;

/// Result type for feature computation.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors raised while computing features.
///
/// Arithmetic edge cases never surface here; they resolve to missing values.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Input frame lacks columns the feature reads
    #[error("{feature} requires missing columns: {}", columns.join(", "))]
    MissingColumns {
        /// Feature name
        feature: String,
        /// Columns not found in the input
        columns: Vec<String>,
    },

    /// Unrecognized delisting policy name
    #[error("Unknown delisting policy: {0} (expected imputed-compound or additive)")]
    UnknownPolicy(String),
}
