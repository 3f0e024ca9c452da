//! Quarterly fundamentals.

use super::{FIRM, PERIOD};
use crate::error::Result;
use crate::feature::Feature;
use crate::ratios::safe_div;
use polars::prelude::*;

/// Columns read by [`QuarterlyFundamentals`].
pub const QUARTERLY_INPUTS: &[&str] =
    &["gvkey", "datadate", "cshprq", "ajexq", "niq", "saleq", "ceqq"];

/// Adds `adj_cshprq = cshprq * ajexq`, `net_margin_q = niq / saleq` and
/// `roe_q = niq / ceqq`.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuarterlyFundamentals;

impl Feature for QuarterlyFundamentals {
    fn name(&self) -> &str {
        "quarterly_fundamentals"
    }

    fn required_columns(&self) -> &[&str] {
        QUARTERLY_INPUTS
    }

    fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
        Ok(data
            .sort([FIRM, PERIOD], Default::default())
            .with_columns([
                (col("cshprq") * col("ajexq")).alias("adj_cshprq"),
                safe_div(col("niq"), col("saleq")).alias("net_margin_q"),
                safe_div(col("niq"), col("ceqq")).alias("roe_q"),
            ]))
    }
}
