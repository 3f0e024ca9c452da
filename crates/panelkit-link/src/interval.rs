//! Validity-interval join.

use crate::error::{Result, require_columns};
use polars::prelude::*;
use tracing::debug;

/// Marks right-hand rows so that key misses can be told apart from open
/// interval bounds after the left join.
const MATCHED: &str = "__interval_matched";

/// Join two frames on a key and keep rows whose date lies inside the right
/// frame's `[start, end]` interval.
///
/// The join is a left join on the bare key followed by the interval filter,
/// so a left row survives only if some right row with the same key covers
/// its date. A row covered by several intervals appears once per interval.
/// Null bounds are open: a null `start` is unbounded below and a null `end`
/// unbounded above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalJoin {
    /// Join key present in both frames
    pub key: String,
    /// Date column of the left frame
    pub date: String,
    /// Interval start column of the right frame
    pub start: String,
    /// Interval end column of the right frame
    pub end: String,
}

impl IntervalJoin {
    /// Describe a join on `key` testing `date` against `[start, end]`.
    pub fn new(key: &str, date: &str, start: &str, end: &str) -> Self {
        Self {
            key: key.to_string(),
            date: date.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    fn covers(&self) -> Expr {
        let date = col(self.date.as_str());
        let start = col(self.start.as_str());
        let end = col(self.end.as_str());

        let after_start = start.clone().is_null().or(date.clone().gt_eq(start));
        let before_end = end.clone().is_null().or(date.lt_eq(end));
        col(MATCHED)
            .is_not_null()
            .and(after_start)
            .and(before_end)
    }

    /// Run the join.
    pub fn join(&self, left: &DataFrame, right: &DataFrame) -> Result<DataFrame> {
        require_columns(left, "left frame", &[self.key.as_str(), self.date.as_str()])?;
        require_columns(
            right,
            "right frame",
            &[self.key.as_str(), self.start.as_str(), self.end.as_str()],
        )?;

        let right = right.clone().lazy().with_column(lit(true).alias(MATCHED));
        let joined = left
            .clone()
            .lazy()
            .left_join(right, col(self.key.as_str()), col(self.key.as_str()))
            .filter(self.covers())
            .collect()?;

        debug!(
            key = %self.key,
            left = left.height(),
            matched = joined.height(),
            "interval join"
        );
        Ok(joined.drop(MATCHED)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use panelkit_data::dates::date_column;

    fn d(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    }

    fn frame(key: Vec<i64>, dates: &[(&str, &[Option<NaiveDate>])]) -> DataFrame {
        let mut columns = vec![Column::new("permno".into(), key)];
        for (name, values) in dates {
            columns.push(date_column(name, values).unwrap());
        }
        DataFrame::new(columns).unwrap()
    }

    fn join() -> IntervalJoin {
        IntervalJoin::new("permno", "yearmonth", "start", "end")
    }

    #[test]
    fn test_key_miss_is_dropped() {
        let left = frame(vec![1, 2], &[("yearmonth", &[d("2021-06-30"), d("2021-06-30")])]);
        let right = frame(vec![1], &[("start", &[None]), ("end", &[None])]);

        let out = join().join(&left, &right).unwrap();
        assert_eq!(out.height(), 1);
        assert!(out.column(MATCHED).is_err());
    }

    #[test]
    fn test_open_bounds() {
        let left = frame(vec![1, 1], &[("yearmonth", &[d("1990-01-31"), d("2030-01-31")])]);
        let right = frame(
            vec![1, 1],
            &[
                ("start", &[None, d("2000-01-01")]),
                ("end", &[d("1999-12-31"), None]),
            ],
        );

        let out = join().join(&left, &right).unwrap();
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let left = frame(vec![1, 1], &[("yearmonth", &[d("2021-03-31"), d("2021-04-30")])]);
        let right = frame(vec![1], &[("start", &[d("2021-03-31")]), ("end", &[d("2021-04-30")])]);

        let out = join().join(&left, &right).unwrap();
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_missing_columns() {
        let left = frame(vec![1], &[("date", &[d("2021-03-31")])]);
        let right = frame(vec![1], &[("start", &[None]), ("end", &[None])]);
        assert!(join().join(&left, &right).is_err());
    }
}
