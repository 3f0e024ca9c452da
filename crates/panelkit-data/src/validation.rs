//! Post-pull data-quality checks.

use crate::error::{DataError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outcome of a key-uniqueness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniquenessReport {
    /// Rows inspected
    pub rows: usize,
    /// Distinct key groups
    pub groups: usize,
    /// Largest number of rows sharing one key (0 for an empty table)
    pub max_group_size: usize,
    /// Number of keys that appear more than once
    pub duplicated_groups: usize,
}

impl UniquenessReport {
    /// Whether every key appears at most once.
    pub const fn is_unique(&self) -> bool {
        self.max_group_size <= 1
    }
}

/// Count rows per key and report the largest group.
///
/// Never deduplicates and never fails on duplicates; a missing key column is
/// the only error.
pub fn check_unique(df: &DataFrame, keys: &[&str]) -> Result<UniquenessReport> {
    let names = df.get_column_names();
    let missing: Vec<String> = keys
        .iter()
        .filter(|k| !names.iter().any(|n| n.as_str() == **k))
        .map(|k| k.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DataError::MissingColumns {
            table: "uniqueness check".to_string(),
            columns: missing,
        });
    }

    let key_exprs: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
    let counts = df
        .clone()
        .lazy()
        .group_by(key_exprs)
        .agg([len().cast(DataType::Int64).alias("n")])
        .select([
            len().cast(DataType::Int64).alias("groups"),
            col("n").max().alias("max_group_size"),
            col("n").gt(lit(1)).cast(DataType::Int64).sum().alias("duplicated_groups"),
        ])
        .collect()?;

    let get = |name: &str| -> Result<usize> {
        let value = counts.column(name)?.i64()?.get(0).unwrap_or(0);
        Ok(usize::try_from(value).unwrap_or(0))
    };

    Ok(UniquenessReport {
        rows: df.height(),
        groups: get("groups")?,
        max_group_size: get("max_group_size")?,
        duplicated_groups: get("duplicated_groups")?,
    })
}

/// Check that IBES forecast rows are unique per (`ticker`, `statpers`).
///
/// Duplicates mean the forecast-horizon filter leaked more than one horizon
/// per statistical period. They are logged as a warning and left in place.
pub fn check_forecast_uniqueness(forecast: &DataFrame) -> Result<UniquenessReport> {
    let report = check_unique(forecast, &["ticker", "statpers"])?;
    if report.is_unique() {
        info!("forecast summary is unique per ticker and statistical period");
    } else {
        warn!(
            max_group_size = report.max_group_size,
            duplicated_groups = report.duplicated_groups,
            "duplicate forecast entries for the same ticker/statpers; check the FPI filter"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast(tickers: &[&str], periods: &[&str]) -> DataFrame {
        DataFrame::new(vec![
            Column::new("ticker".into(), tickers),
            Column::new("statpers".into(), periods),
            Column::new("meanest".into(), vec![1.0; tickers.len()]),
        ])
        .unwrap()
    }

    #[test]
    fn test_unique_forecast() {
        let df = forecast(&["AAPL", "AAPL", "MSFT"], &["2021-01-14", "2021-02-18", "2021-01-14"]);
        let report = check_forecast_uniqueness(&df).unwrap();
        assert!(report.is_unique());
        assert_eq!(report.max_group_size, 1);
        assert_eq!(report.groups, 3);
    }

    #[test]
    fn test_duplicate_forecast_is_reported_not_dropped() {
        let df = forecast(&["AAPL", "AAPL", "MSFT"], &["2021-01-14", "2021-01-14", "2021-01-14"]);
        let report = check_forecast_uniqueness(&df).unwrap();
        assert_eq!(report.max_group_size, 2);
        assert_eq!(report.duplicated_groups, 1);
        assert_eq!(report.rows, 3);
        // Input untouched
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn test_missing_key_column() {
        let df = DataFrame::new(vec![Column::new("ticker".into(), &["AAPL"])]).unwrap();
        assert!(matches!(
            check_forecast_uniqueness(&df),
            Err(DataError::MissingColumns { .. })
        ));
    }

    #[test]
    fn test_empty_table() {
        let df = forecast(&[], &[]);
        let report = check_forecast_uniqueness(&df).unwrap();
        assert_eq!(report.max_group_size, 0);
        assert!(report.is_unique());
    }
}
