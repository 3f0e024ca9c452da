//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Warehouse database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Invalid date range
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date of the range
        start: String,
        /// End date of the range
        end: String,
    },

    /// A table or schema does not exist in the warehouse
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Every candidate source for a dataset failed or came back empty
    #[error("No usable source for {dataset}; tried: {}", tried.join(", "))]
    NoUsableSource {
        /// Logical dataset being pulled
        dataset: String,
        /// Candidates tried, in priority order
        tried: Vec<String>,
    },

    /// Required columns are absent from a table
    #[error("Missing columns in {table}: {}", columns.join(", "))]
    MissingColumns {
        /// Table that was inspected
        table: String,
        /// Columns that were expected but not found
        columns: Vec<String>,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Archive error
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// FRED API error
    #[error("FRED API error: {0}")]
    FredApi(String),

    /// Invalid identifier used to build a query
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Unsupported configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_usable_source_lists_candidates() {
        let err = DataError::NoUsableSource {
            dataset: "iclink".to_string(),
            tried: vec!["wrdsapps.id_ibes".to_string(), "wrdsapps.ibcrsphist".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("iclink"));
        assert!(msg.contains("wrdsapps.id_ibes, wrdsapps.ibcrsphist"));
    }
}
