//! Annual fundamentals: book equity, accruals, asset growth, sales growth and
//! net share issuance.

use super::{FIRM, PERIOD};
use crate::error::Result;
use crate::feature::{Feature, diff, lag};
use crate::ratios::safe_div;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Columns read by [`AnnualFundamentals`].
pub const ANNUAL_INPUTS: &[&str] = &[
    "gvkey", "datadate", "at", "seq", "txditc", "pstkrv", "pstkl", "pstk", "act", "dlc", "che",
    "lct", "ppegt", "ao", "sale", "csho", "ajex",
];

/// Columns zero-filled before differencing.
const ZERO_FILLED: &[&str] = &["act", "dlc", "che", "lct", "txditc"];

/// Configuration for [`AnnualFundamentals`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualFundamentalsConfig {
    /// Horizons, in periods, of the compound annual sales growth columns
    /// `sg_{k}y` (default: 1, 3, 5)
    pub sales_horizons: Vec<u32>,
}

impl Default for AnnualFundamentalsConfig {
    fn default() -> Self {
        Self {
            sales_horizons: vec![1, 3, 5],
        }
    }
}

/// Derived annual columns:
///
/// - `ps`: preferred stock, first present of `pstkrv`, `pstkl`, `pstk`, else 0
/// - `be = seq + txditc - ps` with `txditc` zero-filled
/// - `acc = Δact + Δdlc - Δche - Δlct` over zero-filled inputs
/// - `at_l1`, `at_avg = (at + at_l1) / 2`, `ag = at / at_l1 - 1`
/// - `ppegt_diff`, `ao_diff`
/// - `sale_l{k}` and `sg_{k}y = (sale / sale_l{k})^(1/k) - 1`
/// - `adj_csho = csho * ajex`, `adj_csho_l1`, `nsi = ln(adj_csho / adj_csho_l1)`
///
/// Growth rates are missing when the lagged value is missing or not
/// positive; multi-period rates also when the sales ratio is negative.
/// `nsi` is missing unless the share ratio is positive.
#[derive(Debug, Default)]
pub struct AnnualFundamentals {
    config: AnnualFundamentalsConfig,
}

impl AnnualFundamentals {
    /// Create with the given configuration.
    pub const fn with_config(config: AnnualFundamentalsConfig) -> Self {
        Self { config }
    }
}

/// Compound per-period growth over `k` periods.
fn compound_growth(current: &str, lagged: &str, k: u32) -> Expr {
    let ratio = col(current) / col(lagged);
    let positive_lag = col(lagged).gt(lit(0.0));
    if k == 1 {
        return when(positive_lag)
            .then(ratio - lit(1.0))
            .otherwise(lit(NULL));
    }
    when(positive_lag.and(ratio.clone().gt_eq(lit(0.0))))
        .then(ratio.pow(lit(1.0 / f64::from(k))) - lit(1.0))
        .otherwise(lit(NULL))
}

impl Feature for AnnualFundamentals {
    fn name(&self) -> &str {
        "annual_fundamentals"
    }

    fn required_columns(&self) -> &[&str] {
        ANNUAL_INPUTS
    }

    fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
        let preferred = when(col("pstkrv").is_not_null())
            .then(col("pstkrv"))
            .when(col("pstkl").is_not_null())
            .then(col("pstkl"))
            .when(col("pstk").is_not_null())
            .then(col("pstk"))
            .otherwise(lit(0.0));

        let mut stage1: Vec<Expr> = ZERO_FILLED
            .iter()
            .map(|c| col(*c).fill_null(lit(0.0)))
            .collect();
        stage1.push(preferred.alias("ps"));
        stage1.push((col("csho") * col("ajex")).alias("adj_csho"));

        let mut stage2 = vec![
            (col("seq") + col("txditc") - col("ps")).alias("be"),
            diff("act", FIRM).alias("act_ch"),
            diff("dlc", FIRM).alias("dlc_ch"),
            diff("che", FIRM).alias("che_ch"),
            diff("lct", FIRM).alias("lct_ch"),
            lag("at", 1, FIRM).alias("at_l1"),
            diff("ppegt", FIRM).alias("ppegt_diff"),
            diff("ao", FIRM).alias("ao_diff"),
            lag("adj_csho", 1, FIRM).alias("adj_csho_l1"),
        ];
        stage2.extend(
            self.config
                .sales_horizons
                .iter()
                .map(|k| lag("sale", i64::from(*k), FIRM).alias(format!("sale_l{}", k))),
        );

        let mut stage3 = vec![
            (col("act_ch") + col("dlc_ch") - col("che_ch") - col("lct_ch")).alias("acc"),
            ((col("at") + col("at_l1")) / lit(2.0)).alias("at_avg"),
            (safe_div(col("at"), col("at_l1")) - lit(1.0)).alias("ag"),
            {
                let ratio = safe_div(col("adj_csho"), col("adj_csho_l1"));
                when(ratio.clone().gt(lit(0.0)))
                    .then(ratio.log(std::f64::consts::E))
                    .otherwise(lit(NULL))
                    .alias("nsi")
            },
        ];
        stage3.extend(self.config.sales_horizons.iter().map(|k| {
            compound_growth("sale", &format!("sale_l{}", k), *k).alias(format!("sg_{}y", k))
        }));

        Ok(data
            .sort([FIRM, PERIOD], Default::default())
            .with_columns(stage1)
            .with_columns(stage2)
            .with_columns(stage3))
    }
}
