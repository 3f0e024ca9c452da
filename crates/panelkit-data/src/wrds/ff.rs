//! Fama-French factors hosted on WRDS.

use crate::dates::month_end;
use crate::error::Result;
use crate::warehouse::{TableRef, Warehouse};
use polars::prelude::*;
use tracing::info;

/// Pull `ff.factors_monthly`, with `smb`/`hml` as floats and `date` rolled to
/// the month end.
pub fn pull_ff_factors_monthly<W: Warehouse + ?Sized>(warehouse: &W) -> Result<DataFrame> {
    let table = TableRef::new("ff", "factors_monthly")?;
    let ff = warehouse
        .get_table(&table, &["date"])?
        .lazy()
        .with_columns([
            month_end("date").alias("date"),
            col("smb").cast(DataType::Float64),
            col("hml").cast(DataType::Float64),
        ])
        .sort(["date"], Default::default())
        .collect()?;

    info!(rows = ff.height(), "pulled Fama-French monthly factors");
    Ok(ff)
}
