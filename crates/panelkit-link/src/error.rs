//! Error types for linking.

use thiserror::Error;

/// Result type for linking.
pub type Result<T> = std::result::Result<T, LinkError>;

/// Errors raised while linking panels.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// An input frame lacks the columns the join needs
    #[error("{frame} is missing columns: {}", columns.join(", "))]
    MissingColumns {
        /// Which input was inspected
        frame: String,
        /// Columns not found
        columns: Vec<String>,
    },
}

/// Fail unless every column in `columns` exists in `df`.
pub(crate) fn require_columns(
    df: &polars::prelude::DataFrame,
    frame: &str,
    columns: &[&str],
) -> Result<()> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|c| df.column(c).is_err())
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LinkError::MissingColumns {
            frame: frame.to_string(),
            columns: missing,
        })
    }
}
