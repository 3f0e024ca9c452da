//! Date helpers shared by the pulls: pull windows, month-end alignment and
//! conversion between chrono dates and polars `Date` columns.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Inclusive date window a pull is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First date included
    pub start: NaiveDate,
    /// Last date included
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a validated range.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse a range from two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            parse_date(s).ok_or_else(|| DataError::Parse(format!("Invalid date: {}", s)))
        };
        Self::new(parse(start)?, parse(end)?)
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// SQL `BETWEEN` predicate over `column`.
    pub fn sql_between(&self, column: &str) -> String {
        format!("{} BETWEEN '{}' AND '{}'", column, self.start, self.end)
    }
}

/// Parse a warehouse date. Accepts `YYYY-MM-DD`, optionally followed by a
/// time component, and the compact `YYYYMMDD` form.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(s, "%Y%m%d").ok();
    }
    let day = s.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Build a polars `Date` column from optional chrono dates.
pub fn date_column(name: &str, dates: &[Option<NaiveDate>]) -> PolarsResult<Column> {
    let epoch = epoch();
    let days: Vec<Option<i32>> = dates
        .iter()
        .map(|d| d.map(|d| (d - epoch).num_days() as i32))
        .collect();
    Column::new(name.into(), days).cast(&DataType::Date)
}

/// Read a `Date` column back into chrono dates.
pub fn column_dates(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<NaiveDate>>> {
    let column = df.column(name)?.cast(&DataType::Date)?;
    Ok(column.as_materialized_series().date()?.as_date_iter().collect())
}

/// Last calendar day of the month of every date in `column`.
pub fn month_end(column: &str) -> Expr {
    col(column).cast(DataType::Date).dt().month_end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("2021-06-30", Some((2021, 6, 30)))]
    #[case("2021-06-30 00:00:00", Some((2021, 6, 30)))]
    #[case(" 19260701 ", Some((1926, 7, 1)))]
    #[case("2021-02-30", None)]
    #[case("not a date", None)]
    fn test_parse_date_formats(#[case] input: &str, #[case] expected: Option<(i32, u32, u32)>) {
        assert_eq!(parse_date(input), expected.map(|(y, m, d)| ymd(y, m, d)));
    }

    #[test]
    fn test_date_range_validation() {
        assert!(DateRange::parse("2020-01-01", "2025-12-31").is_ok());
        assert!(matches!(
            DateRange::parse("2025-01-01", "2020-01-01"),
            Err(DataError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_month_end_expression() {
        let dates = [
            Some(ymd(2021, 6, 15)),
            None,
            Some(ymd(2020, 2, 3)),
            Some(ymd(2021, 12, 31)),
        ];
        let df = DataFrame::new(vec![date_column("date", &dates).unwrap()]).unwrap();
        let df = df
            .lazy()
            .with_column(month_end("date").alias("yearmonth"))
            .collect()
            .unwrap();

        assert_eq!(df.column("yearmonth").unwrap().dtype(), &DataType::Date);
        let ends = column_dates(&df, "yearmonth").unwrap();
        assert_eq!(
            ends,
            vec![
                Some(ymd(2021, 6, 30)),
                None,
                Some(ymd(2020, 2, 29)),
                Some(ymd(2021, 12, 31)),
            ]
        );
    }
}
