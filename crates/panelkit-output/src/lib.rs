#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/panelkit/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod report;
pub mod schema;
pub mod snapshot;

pub use error::{Result, SnapshotError};
pub use report::{RunReport, StepRecord};
pub use schema::{ColumnSpec, ColumnType, SnapshotSchema};
pub use snapshot::{Dataset, ExportFormat, SnapshotStore};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
