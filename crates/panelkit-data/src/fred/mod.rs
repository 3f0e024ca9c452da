//! FRED (Federal Reserve Economic Data) macro series.

pub mod client;
pub mod macro_series;

pub use client::{FredClient, Observation};
pub use macro_series::{MACRO_SERIES, MacroSeries, assemble_macro_panel, log_growth, pull_macro};
