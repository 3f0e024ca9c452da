#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/panelkit/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dates;
pub mod error;
pub mod french;
pub mod fred;
pub mod validation;
pub mod warehouse;
pub mod wrds;

pub use dates::DateRange;
pub use error::{DataError, Result};
pub use validation::{UniquenessReport, check_forecast_uniqueness, check_unique};
pub use warehouse::{SqliteWarehouse, TableRef, Warehouse};

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
