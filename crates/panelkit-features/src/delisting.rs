//! Delisting-return adjustment of the CRSP monthly stock file.
//!
//! Securities that stop trading mid-sample carry their final return in the
//! delisting file. Two policies fold it into the monthly return; they are not
//! equivalent and callers pick one explicitly. Both write `retadj` and leave
//! `ret` untouched.

use crate::error::{FeatureError, Result};
use crate::feature::Feature;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Columns read by [`DelistingAdjustment`].
pub const DELISTING_INPUTS: &[&str] = &["ret", "dlstcd", "dlret"];

/// Imputed delisting return for performance-related delistings with no
/// recorded return.
pub const PERFORMANCE_DELISTING_RETURN: f64 = -0.30;

/// Imputed delisting return for any other delisting with no recorded return.
pub const OTHER_DELISTING_RETURN: f64 = -1.0;

/// How delisting returns are folded into the monthly return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelistingPolicy {
    /// Impute missing delisting returns from the delisting code, then
    /// compound: `retadj = (1 + ret) * (1 + dlret) - 1`.
    ImputedCompound,
    /// Zero-fill missing delisting returns and add: `retadj = ret + dlret`.
    Additive,
}

impl fmt::Display for DelistingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImputedCompound => f.write_str("imputed-compound"),
            Self::Additive => f.write_str("additive"),
        }
    }
}

impl FromStr for DelistingPolicy {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "imputed-compound" => Ok(Self::ImputedCompound),
            "additive" => Ok(Self::Additive),
            _ => Err(FeatureError::UnknownPolicy(s.to_string())),
        }
    }
}

/// Codes 500, 520, 580, 584 and 551 through 574.
fn is_performance_delisting(code: Expr) -> Expr {
    let in_range = code.clone().gt_eq(lit(551)).and(code.clone().lt_eq(lit(574)));
    [500, 520, 580, 584]
        .into_iter()
        .map(|c| code.clone().eq(lit(c)))
        .fold(in_range, |acc, e| acc.or(e))
}

/// `dlret` with missing values imputed from `dlstcd`.
fn impute(delisting_return: &str) -> Expr {
    let missing = col(delisting_return).is_null();
    when(missing.clone().and(is_performance_delisting(col("dlstcd"))))
        .then(lit(PERFORMANCE_DELISTING_RETURN))
        .when(missing.and(col("dlstcd").gt_eq(lit(200))))
        .then(lit(OTHER_DELISTING_RETURN))
        .otherwise(col(delisting_return))
}

/// Compound `ret` with `dlret`; a missing `dlret` counts as zero.
fn compound(ret: &str, delisting_return: &str) -> Expr {
    let dl = col(delisting_return).fill_null(lit(0.0));
    when(dl.clone().eq(lit(0.0)))
        .then(col(ret))
        .when(col(ret).is_null())
        .then(dl.clone())
        .otherwise((lit(1.0) + col(ret)) * (lit(1.0) + dl) - lit(1.0))
}

/// Add zero-filled `dlret` to `ret`.
fn additive(ret: &str, delisting_return: &str) -> Expr {
    let dl = col(delisting_return);
    when(col(ret).is_null().and(dl.clone().neq(lit(0.0))))
        .then(dl.clone())
        .otherwise(col(ret) + dl)
}

/// Delisting adjustment with a chosen [`DelistingPolicy`].
///
/// When the frame also carries `retx` and `dlretx` the ex-dividend return is
/// adjusted the same way into `retxadj`.
#[derive(Debug, Clone, Copy)]
pub struct DelistingAdjustment {
    policy: DelistingPolicy,
}

impl DelistingAdjustment {
    /// Create an adjustment using `policy`.
    pub const fn new(policy: DelistingPolicy) -> Self {
        Self { policy }
    }

    /// The configured policy.
    pub const fn policy(&self) -> DelistingPolicy {
        self.policy
    }

    fn exprs(&self, ret: &str, delisting_return: &str, output: &str) -> [Expr; 2] {
        match self.policy {
            DelistingPolicy::ImputedCompound => [
                impute(delisting_return).alias(delisting_return),
                compound(ret, delisting_return).alias(output),
            ],
            DelistingPolicy::Additive => [
                col(delisting_return)
                    .fill_null(lit(0.0))
                    .alias(delisting_return),
                additive(ret, delisting_return).alias(output),
            ],
        }
    }
}

impl Feature for DelistingAdjustment {
    fn name(&self) -> &str {
        "delisting_adjustment"
    }

    fn required_columns(&self) -> &[&str] {
        DELISTING_INPUTS
    }

    fn compute(&self, mut data: LazyFrame) -> Result<LazyFrame> {
        let schema = data.collect_schema()?;
        let with_retx = schema.contains("retx") && schema.contains("dlretx");

        let [dlret, retadj] = self.exprs("ret", "dlret", "retadj");
        let mut first = vec![dlret];
        let mut second = vec![retadj];
        if with_retx {
            let [dlretx, retxadj] = self.exprs("retx", "dlretx", "retxadj");
            first.push(dlretx);
            second.push(retxadj);
        }

        Ok(data.with_columns(first).with_columns(second))
    }
}
