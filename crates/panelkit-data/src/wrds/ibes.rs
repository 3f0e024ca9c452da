//! IBES consensus forecasts, actuals and the IBES/CRSP link.
//!
//! Table availability differs between WRDS subscriptions, so each pull walks
//! a fixed list of candidate tables and keeps the first one that returns
//! rows. Column names of the link tables differ as well and are resolved by
//! priority lists.

use crate::dates::DateRange;
use crate::error::{DataError, Result};
use crate::warehouse::{TableRef, Warehouse, first_usable, resolve_column};
use polars::prelude::*;
use std::fmt;
use tracing::{info, warn};

/// A summary-statistics table and the column holding its statistical period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryTable {
    /// Qualified table name
    pub table: &'static str,
    /// Statistical period date column
    pub date_col: &'static str,
}

impl fmt::Display for SummaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table)
    }
}

/// Forecast summary tables: unadjusted first, split-adjusted as backup.
pub const FORECAST_TABLES: &[SummaryTable] = &[
    SummaryTable {
        table: "ibes.statsumu_epsus",
        date_col: "statpers",
    },
    SummaryTable {
        table: "ibes.statsum_epsus",
        date_col: "statpers",
    },
];

/// Forecast period indicator of the current fiscal quarter. Fixing one
/// horizon makes (`ticker`, `statpers`) a unique key.
pub const FORECAST_FPI: &str = "6";

/// Actuals tables, unadjusted first.
pub const ACTUAL_TABLES: &[&str] = &["ibes.actu_epsus", "ibes.act_epsus"];

/// Date column used to window the actuals, by priority.
pub const ACTUAL_DATE_COLUMNS: &[&str] = &["anndats", "actdats", "statpers", "fpedats"];

/// IBES/CRSP link tables, by priority.
pub const ICLINK_TABLES: &[&str] = &[
    "wrdsapps.id_ibes",
    "wrdsapps.id_ibes_ccm",
    "wrdsapps.ibcrsphist",
    "wrdsapps.opcrsphist",
    "wrdsapps.firm_ratio_ibes",
    "wrdsapps.firm_ratio_ibes_ccm",
];

/// Candidate names of the CRSP permno column.
pub const PERMNO_COLUMNS: &[&str] = &["permno", "lpermno", "permno_crsp", "permno_crspn"];
/// Candidate names of the IBES ticker column.
pub const TICKER_COLUMNS: &[&str] = &["ticker", "ibtic", "tic", "ibes_ticker"];
/// Candidate names of the link start date column.
pub const START_COLUMNS: &[&str] =
    &["sdate", "startdate", "linkdt", "begdate", "start_date", "link_start"];
/// Candidate names of the link end date column.
pub const END_COLUMNS: &[&str] = &["edate", "enddate", "linkenddt", "end_date", "link_end"];
/// Candidate names of the link quality score column.
pub const SCORE_COLUMNS: &[&str] = &["score", "linkscore", "quality"];

/// Highest link score accepted (lower is better; 0 and 1 are CUSIP matches).
pub const MAX_LINK_SCORE: i64 = 1;

/// Pull the EPS consensus summary for the current fiscal quarter.
pub fn pull_eps_forecast<W: Warehouse + ?Sized>(
    warehouse: &W,
    range: &DateRange,
) -> Result<DataFrame> {
    let (table, forecast) = first_usable("IBES forecast summary", FORECAST_TABLES, |candidate| {
        let table = TableRef::parse(candidate.table)?;
        let sql = format!(
            "SELECT * FROM {} WHERE measure = 'EPS' AND fpi = '{}' AND {}",
            table,
            FORECAST_FPI,
            range.sql_between(candidate.date_col)
        );
        warehouse.raw_sql(&sql, &[candidate.date_col])
    })?;

    info!(table = %table, rows = forecast.height(), "pulled IBES forecast summary");
    Ok(forecast)
}

/// Build the query for an actuals table from the columns it exposes.
///
/// Filters on `measure` and `pdicity` are added only when the columns exist;
/// the date window uses the first available column of
/// [`ACTUAL_DATE_COLUMNS`]. Returns the SQL and the date column, if any.
pub fn actual_query(
    table: &TableRef,
    columns: &[String],
    range: &DateRange,
) -> (String, Option<&'static str>) {
    let has = |name: &str| columns.iter().any(|c| c == name);

    let mut filters = Vec::new();
    if has("measure") {
        filters.push("measure = 'EPS'".to_string());
    }
    if has("pdicity") {
        filters.push("pdicity IN ('ANN', 'QTR')".to_string());
    }
    let date_col = resolve_column(columns, ACTUAL_DATE_COLUMNS);
    if let Some(date_col) = date_col {
        filters.push(range.sql_between(date_col));
    }

    let mut sql = format!("SELECT * FROM {}", table);
    if !filters.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&filters.join(" AND "));
    }
    (sql, date_col)
}

/// Pull reported EPS actuals.
pub fn pull_eps_actual<W: Warehouse + ?Sized>(warehouse: &W, range: &DateRange) -> Result<DataFrame> {
    let result = first_usable("IBES actuals", ACTUAL_TABLES, |candidate| {
        let table = TableRef::parse(candidate)?;
        let columns = warehouse.table_columns(&table)?;
        let (sql, date_col) = actual_query(&table, &columns, range);
        let date_cols: Vec<&str> = date_col.into_iter().collect();
        warehouse.raw_sql(&sql, &date_cols)
    });

    match result {
        Ok((table, actual)) => {
            info!(table = %table, rows = actual.height(), "pulled IBES actuals");
            Ok(actual)
        }
        Err(e) => {
            let available = warehouse
                .list_tables("ibes")
                .map(|tables| tables.join(", "))
                .unwrap_or_else(|_| "<not visible>".to_string());
            warn!(available = %available, "IBES actuals tables are not accessible");
            Err(e)
        }
    }
}

/// Build the normalizing query for an IBES/CRSP link table.
///
/// Output columns are always `permno, ticker, sdate, edate, score`; any
/// column the table lacks is selected as `NULL`. Tables without a permno
/// column are rejected. When a score column exists only links scored at or
/// below [`MAX_LINK_SCORE`] are kept.
pub fn iclink_query(table: &TableRef, columns: &[String]) -> Result<String> {
    let permno = resolve_column(columns, PERMNO_COLUMNS).ok_or_else(|| {
        DataError::MissingColumns {
            table: table.to_string(),
            columns: vec!["permno".to_string()],
        }
    })?;

    let pick = |candidates: &[&'static str], alias: &str| {
        resolve_column(columns, candidates).map_or_else(
            || format!("NULL AS {}", alias),
            |name| format!("{} AS {}", name, alias),
        )
    };

    let select = [
        format!("{} AS permno", permno),
        pick(TICKER_COLUMNS, "ticker"),
        pick(START_COLUMNS, "sdate"),
        pick(END_COLUMNS, "edate"),
        pick(SCORE_COLUMNS, "score"),
    ];

    let mut sql = format!("SELECT {} FROM {}", select.join(", "), table);
    if let Some(score) = resolve_column(columns, SCORE_COLUMNS) {
        sql.push_str(&format!(" WHERE {} <= {}", score, MAX_LINK_SCORE));
    }
    Ok(sql)
}

/// Pull the IBES ticker to CRSP permno link history.
pub fn pull_crsp_ibes_link<W: Warehouse + ?Sized>(warehouse: &W) -> Result<DataFrame> {
    let (table, iclink) = first_usable("IBES/CRSP link", ICLINK_TABLES, |candidate| {
        let table = TableRef::parse(candidate)?;
        let columns = warehouse.table_columns(&table)?;
        let sql = iclink_query(&table, &columns)?;
        warehouse.raw_sql(&sql, &["sdate", "edate"])
    })?;

    let iclink = iclink
        .lazy()
        .with_columns([
            col("permno").cast(DataType::Int64),
            col("ticker").cast(DataType::String),
            col("score").cast(DataType::Float64),
        ])
        .collect()?;

    info!(table = %table, rows = iclink.height(), "pulled IBES/CRSP link");
    Ok(iclink)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn range() -> DateRange {
        DateRange::parse("2020-01-01", "2025-12-31").unwrap()
    }

    #[test]
    fn test_actual_query_uses_available_filters() {
        let table = TableRef::parse("ibes.actu_epsus").unwrap();
        let (sql, date_col) = actual_query(
            &table,
            &cols(&["ticker", "measure", "pdicity", "actdats", "anndats", "value"]),
            &range(),
        );
        assert_eq!(date_col, Some("anndats"));
        assert_eq!(
            sql,
            "SELECT * FROM ibes.actu_epsus WHERE measure = 'EPS' AND pdicity IN ('ANN', 'QTR') \
             AND anndats BETWEEN '2020-01-01' AND '2025-12-31'"
        );
    }

    #[test]
    fn test_actual_query_without_filters() {
        let table = TableRef::parse("ibes.act_epsus").unwrap();
        let (sql, date_col) = actual_query(&table, &cols(&["ticker", "value"]), &range());
        assert_eq!(date_col, None);
        assert_eq!(sql, "SELECT * FROM ibes.act_epsus");
    }

    #[test]
    fn test_iclink_query_resolves_aliases() {
        let table = TableRef::parse("wrdsapps.ibcrsphist").unwrap();
        let sql = iclink_query(
            &table,
            &cols(&["ticker", "lpermno", "linkdt", "linkenddt", "score"]),
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT lpermno AS permno, ticker AS ticker, linkdt AS sdate, linkenddt AS edate, \
             score AS score FROM wrdsapps.ibcrsphist WHERE score <= 1"
        );
    }

    #[test]
    fn test_iclink_query_without_optional_columns() {
        let table = TableRef::parse("wrdsapps.id_ibes").unwrap();
        let sql = iclink_query(&table, &cols(&["permno", "ibtic"])).unwrap();
        assert_eq!(
            sql,
            "SELECT permno AS permno, ibtic AS ticker, NULL AS sdate, NULL AS edate, \
             NULL AS score FROM wrdsapps.id_ibes"
        );
    }

    #[test]
    fn test_iclink_query_requires_permno() {
        let table = TableRef::parse("wrdsapps.firm_ratio_ibes").unwrap();
        let result = iclink_query(&table, &cols(&["ticker", "sdate"]));
        assert!(matches!(result, Err(DataError::MissingColumns { .. })));
    }
}
