#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/panelkit/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod delisting;
pub mod error;
pub mod feature;
pub mod fundamentals;
pub mod ratios;
pub mod registry;

pub use delisting::{DelistingAdjustment, DelistingPolicy};
pub use error::{FeatureError, Result};
pub use feature::{Feature, require_columns};
pub use fundamentals::{AnnualFundamentals, AnnualFundamentalsConfig, QuarterlyFundamentals};
pub use ratios::{FinancialRatios, FinancialRatiosConfig, safe_div};

// Re-export registry types for convenience
pub use registry::{
    FeatureCategory, FeatureInfo, available_features, features_by_category, get_feature_info,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
