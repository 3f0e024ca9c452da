//! CRSP/Compustat link through the CCM link table.

use crate::error::{Result, require_columns};
use crate::interval::IntervalJoin;
use polars::prelude::*;
use tracing::info;

/// Link classes accepted from `linkprim`: primary and secondary.
pub const ACCEPTED_LINKPRIM: &[&str] = &["P", "C"];

/// Keep links CRSP considers official: `linktype` starting with `L` and an
/// accepted `linkprim`.
pub fn official_links(ccm: &DataFrame) -> Result<DataFrame> {
    require_columns(ccm, "link table", &["linktype", "linkprim"])?;

    let accepted = ACCEPTED_LINKPRIM
        .iter()
        .map(|p| col("linkprim").eq(lit(*p)))
        .reduce(|acc, e| acc.or(e))
        .unwrap_or_else(|| lit(false));

    Ok(ccm
        .clone()
        .lazy()
        .filter(col("linktype").str().starts_with(lit("L")).and(accepted))
        .collect()?)
}

/// Attach `gvkey` to every CRSP security-month covered by an official link.
///
/// `crsp_m` needs `permno` and `yearmonth`; `ccm` needs `gvkey`, `permno`,
/// `linktype`, `linkprim`, `linkdt` and `linkenddt`. Security-months outside
/// every link window are dropped.
pub fn link_crsp_compustat(crsp_m: &DataFrame, ccm: &DataFrame) -> Result<DataFrame> {
    require_columns(
        ccm,
        "link table",
        &["gvkey", "permno", "linktype", "linkprim", "linkdt", "linkenddt"],
    )?;
    let links = official_links(ccm)?;

    let linked =
        IntervalJoin::new("permno", "yearmonth", "linkdt", "linkenddt").join(crsp_m, &links)?;

    info!(
        security_months = crsp_m.height(),
        linked = linked.height(),
        "linked CRSP to Compustat"
    );
    Ok(linked)
}
