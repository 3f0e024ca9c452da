//! CRSP monthly stock file and index pulls.

use crate::dates::{DateRange, month_end};
use crate::error::Result;
use crate::warehouse::Warehouse;
use polars::prelude::*;
use tracing::info;

/// Exchange and share codes accepted from the CRSP name history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityFilter {
    /// Accepted exchange codes (1 NYSE, 2 AMEX, 3 NASDAQ)
    pub exchange_codes: Vec<i64>,
    /// Accepted share codes (10, 11 ordinary common shares)
    pub share_codes: Vec<i64>,
}

impl Default for SecurityFilter {
    fn default() -> Self {
        Self {
            exchange_codes: vec![1, 2, 3],
            share_codes: vec![10, 11],
        }
    }
}

fn in_list(column: &str, codes: &[i64]) -> String {
    if codes.is_empty() {
        return "1 = 0".to_string();
    }
    let codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
    format!("{} IN ({})", column, codes.join(", "))
}

impl SecurityFilter {
    fn sql(&self, alias: &str) -> String {
        format!(
            "{} AND {}",
            in_list(&format!("{}.exchcd", alias), &self.exchange_codes),
            in_list(&format!("{}.shrcd", alias), &self.share_codes),
        )
    }
}

/// Pull the CRSP monthly stock file with names and delisting information.
///
/// Each `crsp.msf` row is joined to the `crsp.msenames` record whose name
/// interval covers the observation date and to any `crsp.msedelist` record
/// in the same calendar month. The result carries `yearmonth` (month end of
/// `date`), is sorted by (`permno`, `yearmonth`) and holds at most one row
/// per pair.
///
/// Delisting codes and returns are returned raw; pick an adjustment policy
/// from `panelkit_features::delisting` afterwards.
pub fn pull_crsp_monthly<W: Warehouse + ?Sized>(
    warehouse: &W,
    range: &DateRange,
    filter: &SecurityFilter,
) -> Result<DataFrame> {
    let sql = format!(
        "SELECT a.permno, a.permco, a.date, a.ret, a.retx, a.shrout, a.prc, a.cfacshr,
                b.shrcd, b.exchcd, b.siccd, b.ncusip,
                c.dlstcd, c.dlret
         FROM crsp.msf AS a
         LEFT JOIN crsp.msenames AS b
           ON a.permno = b.permno AND b.namedt <= a.date AND a.date <= b.nameendt
         LEFT JOIN crsp.msedelist AS c
           ON a.permno = c.permno
          AND strftime('%Y-%m', a.date) = strftime('%Y-%m', c.dlstdt)
         WHERE {}
           AND {}",
        range.sql_between("a.date"),
        filter.sql("b"),
    );

    let crsp_m = warehouse
        .raw_sql(&sql, &["date"])?
        .lazy()
        .with_column(month_end("date").alias("yearmonth"))
        .with_columns([
            col("permno").cast(DataType::Int64),
            col("permco").cast(DataType::Int64),
            col("shrcd").cast(DataType::Int64),
            col("exchcd").cast(DataType::Int64),
            col("ret").cast(DataType::Float64),
            col("retx").cast(DataType::Float64),
            col("dlret").cast(DataType::Float64),
            col("dlstcd").cast(DataType::Int64),
        ])
        .sort(["permno", "yearmonth"], Default::default())
        .unique_stable(
            Some(vec!["permno".into(), "yearmonth".into()]),
            UniqueKeepStrategy::First,
        )
        .collect()?;

    info!(rows = crsp_m.height(), "pulled CRSP monthly stock file");
    Ok(crsp_m)
}

/// Pull the CRSP capitalization-decile index file (`crsp_a_indexes.msix`).
pub fn pull_crsp_index<W: Warehouse + ?Sized>(warehouse: &W, range: &DateRange) -> Result<DataFrame> {
    let sql = format!(
        "SELECT * FROM crsp_a_indexes.msix WHERE {}",
        range.sql_between("caldt")
    );
    let df = warehouse.raw_sql(&sql, &["caldt"])?;
    info!(rows = df.height(), "pulled CRSP index file");
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_sql() {
        let sql = SecurityFilter::default().sql("b");
        assert_eq!(sql, "b.exchcd IN (1, 2, 3) AND b.shrcd IN (10, 11)");
    }

    #[test]
    fn test_empty_filter_matches_nothing() {
        let filter = SecurityFilter {
            exchange_codes: vec![],
            share_codes: vec![10],
        };
        assert_eq!(filter.sql("b"), "1 = 0 AND b.shrcd IN (10)");
    }
}
