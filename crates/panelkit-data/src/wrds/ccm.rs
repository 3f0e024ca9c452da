//! CRSP/Compustat merged (CCM) link table.

use crate::error::Result;
use crate::warehouse::Warehouse;
use polars::prelude::*;
use tracing::info;

/// Pull the official CRSP/Compustat links.
///
/// Keeps link types starting with `L` (links CRSP considers official) and
/// primary (`P`) or secondary (`C`) link classes. `linkenddt` is null for
/// links that are still active.
pub fn pull_ccm_link_table<W: Warehouse + ?Sized>(warehouse: &W) -> Result<DataFrame> {
    let sql = "SELECT gvkey, lpermno AS permno, linktype, linkprim, linkdt, linkenddt
               FROM crsp.ccmxpf_linktable
               WHERE substr(linktype, 1, 1) = 'L'
                 AND (linkprim = 'C' OR linkprim = 'P')";

    let ccm = warehouse
        .raw_sql(sql, &["linkdt", "linkenddt"])?
        .lazy()
        .with_columns([
            col("gvkey").cast(DataType::String),
            col("permno").cast(DataType::Int64),
        ])
        .collect()?;

    info!(rows = ccm.height(), "pulled CCM link table");
    Ok(ccm)
}
