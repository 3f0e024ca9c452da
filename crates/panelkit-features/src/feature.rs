//! The `Feature` trait and the per-entity panel helpers shared by all
//! features.

use crate::error::{FeatureError, Result};
use polars::prelude::*;
use tracing::debug;

/// A derivation step over a panel.
///
/// `compute` only builds the lazy plan; `apply` validates the input columns
/// and collects.
pub trait Feature: std::fmt::Debug {
    /// Unique name of the feature.
    fn name(&self) -> &str;

    /// Columns the input frame must contain.
    fn required_columns(&self) -> &[&str];

    /// Add the feature columns to `data`.
    fn compute(&self, data: LazyFrame) -> Result<LazyFrame>;

    /// Validate `data` and compute the feature eagerly.
    fn apply(&self, data: DataFrame) -> Result<DataFrame> {
        require_columns(&data, self.name(), self.required_columns())?;
        debug!(feature = self.name(), rows = data.height(), "computing feature");
        Ok(self.compute(data.lazy())?.collect()?)
    }
}

/// Fail with [`FeatureError::MissingColumns`] unless every column exists.
pub fn require_columns(df: &DataFrame, feature: &str, columns: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    let missing: Vec<String> = columns
        .iter()
        .filter(|c| !present.iter().any(|p| p.as_str() == **c))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(FeatureError::MissingColumns {
            feature: feature.to_string(),
            columns: missing,
        })
    }
}

/// Value of `column` `periods` rows earlier within the same `entity`.
///
/// The frame must already be sorted by entity and period.
pub fn lag(column: &str, periods: i64, entity: &str) -> Expr {
    col(column).shift(lit(periods)).over([col(entity)])
}

/// Period-over-period difference of `column` within the same `entity`.
pub fn diff(column: &str, entity: &str) -> Expr {
    col(column) - lag(column, 1, entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_columns_lists_missing() {
        let df = df! { "gvkey" => ["001"], "at" => [1.0] }.unwrap();
        assert!(require_columns(&df, "test", &["gvkey", "at"]).is_ok());

        match require_columns(&df, "test", &["gvkey", "sale", "csho"]) {
            Err(FeatureError::MissingColumns { feature, columns }) => {
                assert_eq!(feature, "test");
                assert_eq!(columns, vec!["sale", "csho"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_lag_stays_within_entity() {
        let df = df! {
            "id" => ["a", "a", "b", "b"],
            "x" => [1.0, 2.0, 10.0, 20.0],
        }
        .unwrap();

        let out = df
            .lazy()
            .with_columns([lag("x", 1, "id").alias("x_l1"), diff("x", "id").alias("x_d")])
            .collect()
            .unwrap();

        let lagged: Vec<Option<f64>> = out.column("x_l1").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(lagged, vec![None, Some(1.0), None, Some(10.0)]);
        let diffed: Vec<Option<f64>> = out.column("x_d").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(diffed, vec![None, Some(1.0), None, Some(10.0)]);
    }
}
