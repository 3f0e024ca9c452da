//! Features over Compustat fundamentals, computed per firm (`gvkey`) in
//! `datadate` order.

pub mod annual;
pub mod quarterly;

pub use annual::{ANNUAL_INPUTS, AnnualFundamentals, AnnualFundamentalsConfig};
pub use quarterly::{QUARTERLY_INPUTS, QuarterlyFundamentals};

/// Firm identifier the lags are partitioned by.
pub const FIRM: &str = "gvkey";

/// Period end date the lags are ordered by.
pub const PERIOD: &str = "datadate";
