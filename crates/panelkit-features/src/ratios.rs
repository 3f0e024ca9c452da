//! Financial ratios from Compustat annual fundamentals.
//!
//! Every ratio is a plain quotient where a zero denominator yields a missing
//! value instead of an infinity.

use crate::error::Result;
use crate::feature::Feature;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Columns read by [`FinancialRatios`]. `be` comes from the annual
/// fundamentals feature.
pub const RATIO_INPUTS: &[&str] = &[
    "gvkey", "datadate", "fyear", "at", "lt", "act", "lct", "che", "invt", "sale", "ib", "be",
    "prcc_f", "csho",
];

/// Ratio columns added by [`FinancialRatios`].
pub const RATIO_OUTPUTS: &[&str] = &[
    "current_ratio",
    "quick_ratio",
    "cash_ratio",
    "invt_turn",
    "asset_turn",
    "prof_margin",
    "roe",
    "roa",
    "de_ratio",
    "debt_assets",
    "mktcap",
    "bm",
];

/// `numerator / denominator`, missing when the denominator is exactly zero.
pub fn safe_div(numerator: Expr, denominator: Expr) -> Expr {
    when(denominator.clone().eq(lit(0.0)))
        .then(lit(NULL))
        .otherwise(numerator / denominator)
}

/// Configuration for [`FinancialRatios`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialRatiosConfig {
    /// Keep only the input columns and the ratios (default: true)
    pub select_inputs: bool,
}

impl Default for FinancialRatiosConfig {
    fn default() -> Self {
        Self {
            select_inputs: true,
        }
    }
}

/// Liquidity, turnover, profitability, leverage and valuation ratios.
#[derive(Debug, Default)]
pub struct FinancialRatios {
    config: FinancialRatiosConfig,
}

impl FinancialRatios {
    /// Create with the given configuration.
    pub const fn with_config(config: FinancialRatiosConfig) -> Self {
        Self { config }
    }
}

impl Feature for FinancialRatios {
    fn name(&self) -> &str {
        "financial_ratios"
    }

    fn required_columns(&self) -> &[&str] {
        RATIO_INPUTS
    }

    fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
        let data = if self.config.select_inputs {
            data.select(RATIO_INPUTS.iter().map(|c| col(*c)).collect::<Vec<_>>())
        } else {
            data
        };

        let ratios = data
            .with_columns([
                safe_div(col("act"), col("lct")).alias("current_ratio"),
                safe_div(col("act") - col("invt"), col("lct")).alias("quick_ratio"),
                safe_div(col("che"), col("lct")).alias("cash_ratio"),
                safe_div(col("sale"), col("invt")).alias("invt_turn"),
                safe_div(col("sale"), col("at")).alias("asset_turn"),
                safe_div(col("ib"), col("sale")).alias("prof_margin"),
                safe_div(col("ib"), col("be")).alias("roe"),
                safe_div(col("ib"), col("at")).alias("roa"),
                safe_div(col("lt"), col("be")).alias("de_ratio"),
                safe_div(col("lt"), col("at")).alias("debt_assets"),
                (col("prcc_f") * col("csho")).alias("mktcap"),
            ])
            .with_column(safe_div(col("be"), col("mktcap")).alias("bm"));

        Ok(ratios)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_safe_div_zero_and_null() {
        let df = df! {
            "n" => [Some(1.0), Some(1.0), Some(3.0), None],
            "d" => [Some(0.0), None, Some(2.0), Some(2.0)],
        }
        .unwrap();
        let out = df
            .lazy()
            .with_column(safe_div(col("n"), col("d")).alias("q"))
            .collect()
            .unwrap();
        assert_eq!(values(&out, "q"), vec![None, None, Some(1.5), None]);
    }

    #[test]
    fn test_ratios_keep_only_inputs_and_outputs() {
        let df = df! {
            "gvkey" => ["001690"], "datadate" => ["2021-09-30"], "fyear" => [2021.0],
            "at" => [351.0], "lt" => [288.0], "act" => [135.0], "lct" => [125.0],
            "che" => [62.0], "invt" => [6.0], "sale" => [365.0], "ib" => [94.0],
            "be" => [63.0], "prcc_f" => [141.0], "csho" => [16.0], "ppegt" => [100.0],
        }
        .unwrap();

        let out = FinancialRatios::default().apply(df).unwrap();
        assert_eq!(out.width(), RATIO_INPUTS.len() + RATIO_OUTPUTS.len());
        assert!(out.column("ppegt").is_err());
        for name in RATIO_OUTPUTS {
            assert!(out.column(name).is_ok(), "missing {}", name);
        }
    }
}
