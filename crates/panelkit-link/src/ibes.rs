//! CRSP/IBES link.

use crate::error::{Result, require_columns};
use crate::interval::IntervalJoin;
use panelkit_data::wrds::ibes::MAX_LINK_SCORE;
use polars::prelude::*;
use tracing::info;

/// Attach the IBES `ticker` to every CRSP security-month inside an
/// `[sdate, edate]` link window.
///
/// `iclink` is the normalized link from
/// [`pull_crsp_ibes_link`](panelkit_data::wrds::pull_crsp_ibes_link). Links
/// with a score above the acceptance threshold are discarded; a null score
/// means the source table had no score column and the link is kept.
pub fn merge_crsp_ibes(crsp_m: &DataFrame, iclink: &DataFrame) -> Result<DataFrame> {
    require_columns(iclink, "IBES link", &["permno", "ticker", "sdate", "edate"])?;

    let links = if iclink.column("score").is_ok() {
        iclink
            .clone()
            .lazy()
            .filter(
                col("score")
                    .is_null()
                    .or(col("score").lt_eq(lit(MAX_LINK_SCORE))),
            )
            .collect()?
    } else {
        iclink.clone()
    };

    let linked = IntervalJoin::new("permno", "yearmonth", "sdate", "edate").join(crsp_m, &links)?;

    info!(
        security_months = crsp_m.height(),
        linked = linked.height(),
        "linked CRSP to IBES"
    );
    Ok(linked)
}
