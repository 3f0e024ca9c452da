#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/panelkit/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod pipeline;
pub mod settings;
pub mod universe;

// Re-export main types from sub-crates
pub use panelkit_data as data;
pub use panelkit_features as features;
pub use panelkit_link as link;
pub use panelkit_output as output;

pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, Source};
pub use settings::Settings;
pub use universe::{CrspUniverse, Exchange, Universe};

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
