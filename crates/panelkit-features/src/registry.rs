//! Feature Registry
//!
//! Catalog of the derivation steps, the columns they read and the columns
//! they add.

use crate::delisting::DELISTING_INPUTS;
use crate::fundamentals::{ANNUAL_INPUTS, QUARTERLY_INPUTS};
use crate::ratios::{RATIO_INPUTS, RATIO_OUTPUTS};
use std::fmt;

/// Dataset a feature applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureCategory {
    /// CRSP monthly returns
    Returns,
    /// Compustat fundamentals panels
    Fundamentals,
    /// Ratio table built from annual fundamentals
    Ratios,
}

impl fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Returns => f.write_str("returns"),
            Self::Fundamentals => f.write_str("fundamentals"),
            Self::Ratios => f.write_str("ratios"),
        }
    }
}

/// Feature metadata
#[derive(Debug, Clone)]
pub struct FeatureInfo {
    /// Feature name (unique identifier)
    pub name: &'static str,
    /// Feature category
    pub category: FeatureCategory,
    /// Brief description of what the feature adds
    pub description: &'static str,
    /// Required column names in input data
    pub required_columns: &'static [&'static str],
    /// Columns added to the output
    pub output_columns: &'static [&'static str],
}

/// Get all available feature info
pub fn available_features() -> Vec<FeatureInfo> {
    vec![
        FeatureInfo {
            name: "delisting_adjustment",
            category: FeatureCategory::Returns,
            description: "Delisting-adjusted monthly return under a chosen policy",
            required_columns: DELISTING_INPUTS,
            output_columns: &["dlret", "retadj"],
        },
        FeatureInfo {
            name: "annual_fundamentals",
            category: FeatureCategory::Fundamentals,
            description: "Book equity, accruals, asset and sales growth, net share issuance",
            required_columns: ANNUAL_INPUTS,
            output_columns: &[
                "ps", "be", "acc", "at_l1", "at_avg", "ag", "ppegt_diff", "ao_diff", "sale_l1",
                "sale_l3", "sale_l5", "sg_1y", "sg_3y", "sg_5y", "adj_csho", "adj_csho_l1",
                "nsi",
            ],
        },
        FeatureInfo {
            name: "quarterly_fundamentals",
            category: FeatureCategory::Fundamentals,
            description: "Split-adjusted shares, quarterly net margin and ROE",
            required_columns: QUARTERLY_INPUTS,
            output_columns: &["adj_cshprq", "net_margin_q", "roe_q"],
        },
        FeatureInfo {
            name: "financial_ratios",
            category: FeatureCategory::Ratios,
            description: "Liquidity, turnover, profitability, leverage and valuation ratios",
            required_columns: RATIO_INPUTS,
            output_columns: RATIO_OUTPUTS,
        },
    ]
}

/// Get features by category
pub fn features_by_category(category: FeatureCategory) -> Vec<FeatureInfo> {
    available_features()
        .into_iter()
        .filter(|f| f.category == category)
        .collect()
}

/// Get feature info by name
pub fn get_feature_info(name: &str) -> Option<FeatureInfo> {
    available_features().into_iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AnnualFundamentals, DelistingAdjustment, DelistingPolicy, Feature, FinancialRatios,
        QuarterlyFundamentals,
    };

    #[test]
    fn test_available_features_count() {
        assert_eq!(available_features().len(), 4);
    }

    #[test]
    fn test_features_by_category() {
        assert_eq!(features_by_category(FeatureCategory::Returns).len(), 1);
        assert_eq!(features_by_category(FeatureCategory::Fundamentals).len(), 2);
        assert_eq!(features_by_category(FeatureCategory::Ratios).len(), 1);
    }

    #[test]
    fn test_catalog_matches_implementations() {
        let features: Vec<Box<dyn Feature>> = vec![
            Box::new(DelistingAdjustment::new(DelistingPolicy::Additive)),
            Box::new(AnnualFundamentals::default()),
            Box::new(QuarterlyFundamentals),
            Box::new(FinancialRatios::default()),
        ];
        for feature in features {
            let info = get_feature_info(feature.name()).unwrap();
            assert_eq!(info.required_columns, feature.required_columns());
        }
    }

    #[test]
    fn test_unknown_feature() {
        assert!(get_feature_info("momentum").is_none());
    }
}
