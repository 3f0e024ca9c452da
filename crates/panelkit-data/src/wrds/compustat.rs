//! Compustat fundamentals pulls.

use crate::dates::DateRange;
use crate::error::Result;
use crate::warehouse::Warehouse;
use polars::prelude::*;
use tracing::info;

/// Standard Compustat filters: industrial format, standardized data,
/// domestic population, consolidated statements.
const STANDARD_FILTERS: &str =
    "indfmt = 'INDL' AND datafmt = 'STD' AND popsrc = 'D' AND consol = 'C'";

/// Annual fundamentals columns pulled from `comp.funda`.
pub const ANNUAL_COLUMNS: &[&str] = &[
    "gvkey", "datadate", "fyear", "csho", "at", "pstkl", "txditc", "pstkrv", "seq", "pstk",
    "ppegt", "invt", "lt", "sich", "ib", "oancf", "act", "dlc", "che", "lct", "dvc", "epspi",
    "epspx", "ajex", "sale", "ao", "prcc_f",
];

/// Quarterly fundamentals columns pulled from `comp.fundq`.
pub const QUARTERLY_COLUMNS: &[&str] = &[
    "gvkey", "datadate", "fyearq", "fqtr", "atq", "ltq", "niq", "saleq", "ceqq", "cshprq",
    "epspxq", "ajexq", "rdq",
];

/// Numeric columns are cast to `Float64` so that integer-valued warehouse
/// cells do not leak an integer dtype into the ratio arithmetic.
fn numeric_casts(columns: &[&str], keep: &[&str]) -> Vec<Expr> {
    columns
        .iter()
        .filter(|c| !keep.contains(c))
        .map(|c| col(*c).cast(DataType::Float64))
        .collect()
}

/// Pull annual fundamentals from `comp.funda`, sorted by firm and period.
pub fn pull_compustat_annual<W: Warehouse + ?Sized>(
    warehouse: &W,
    range: &DateRange,
) -> Result<DataFrame> {
    let select = ANNUAL_COLUMNS
        .iter()
        .map(|c| format!("a.{}", c))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {}
         FROM comp.funda AS a
         WHERE {}
           AND curcd = 'USD'
           AND {}",
        select,
        STANDARD_FILTERS,
        range.sql_between("datadate")
    );

    let comp = warehouse
        .raw_sql(&sql, &["datadate"])?
        .lazy()
        .with_columns(numeric_casts(ANNUAL_COLUMNS, &["gvkey", "datadate"]))
        .with_column(col("gvkey").cast(DataType::String))
        .sort(["gvkey", "datadate"], Default::default())
        .collect()?;

    info!(rows = comp.height(), "pulled Compustat annual fundamentals");
    Ok(comp)
}

/// Pull quarterly fundamentals from `comp.fundq`, sorted by firm and period.
pub fn pull_compustat_quarterly<W: Warehouse + ?Sized>(
    warehouse: &W,
    range: &DateRange,
) -> Result<DataFrame> {
    let sql = format!(
        "SELECT {}
         FROM comp.fundq
         WHERE {}
           AND curcdq = 'USD'
           AND {}",
        QUARTERLY_COLUMNS.join(", "),
        STANDARD_FILTERS,
        range.sql_between("datadate")
    );

    let comp_q = warehouse
        .raw_sql(&sql, &["datadate", "rdq"])?
        .lazy()
        .with_columns(numeric_casts(QUARTERLY_COLUMNS, &["gvkey", "datadate", "rdq"]))
        .with_column(col("gvkey").cast(DataType::String))
        .sort(["gvkey", "datadate"], Default::default())
        .collect()?;

    info!(rows = comp_q.height(), "pulled Compustat quarterly fundamentals");
    Ok(comp_q)
}
