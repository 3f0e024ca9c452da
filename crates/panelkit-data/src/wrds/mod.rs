//! Pulls from the WRDS libraries.
//!
//! Every pull takes a [`Warehouse`](crate::warehouse::Warehouse) and a
//! [`DateRange`](crate::dates::DateRange), runs one query (or an ordered set
//! of candidate queries) and returns a fresh [`DataFrame`](polars::prelude::DataFrame).
//! Derived columns are left to `panelkit-features`.

pub mod ccm;
pub mod compustat;
pub mod crsp;
pub mod ff;
pub mod ibes;

pub use ccm::pull_ccm_link_table;
pub use compustat::{pull_compustat_annual, pull_compustat_quarterly};
pub use crsp::{SecurityFilter, pull_crsp_index, pull_crsp_monthly};
pub use ff::pull_ff_factors_monthly;
pub use ibes::{pull_crsp_ibes_link, pull_eps_actual, pull_eps_forecast};
