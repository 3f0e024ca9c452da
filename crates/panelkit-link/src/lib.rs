#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/panelkit/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod ccm;
pub mod error;
pub mod ibes;
pub mod interval;

pub use ccm::{link_crsp_compustat, official_links};
pub use error::{LinkError, Result};
pub use ibes::merge_crsp_ibes;
pub use interval::IntervalJoin;

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
