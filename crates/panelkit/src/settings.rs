//! Pipeline settings read from the environment.
//!
//! A `.env` file in the working directory is loaded first; variables already
//! set in the process environment win. Unset values fall back to defaults
//! under the platform data directory.

use crate::error::{PipelineError, Result};
use crate::universe::{CrspUniverse, Exchange};
use panelkit_data::DateRange;
use panelkit_data::french::FrenchLayout;
use panelkit_features::DelistingPolicy;
use panelkit_output::ExportFormat;
use std::path::PathBuf;
use tracing::debug;

/// Default first date of the pull window.
pub const DEFAULT_START_DATE: &str = "2020-01-01";
/// Default last date of the pull window.
pub const DEFAULT_END_DATE: &str = "2025-12-31";

/// Settings for a pipeline run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Snapshot directory (`DATA_DIR`)
    pub data_dir: PathBuf,
    /// Run reports directory (`OUTPUT_DIR`)
    pub output_dir: PathBuf,
    /// Pull window (`START_DATE`, `END_DATE`)
    pub range: DateRange,
    /// WRDS account name (`WRDS_USERNAME`)
    pub wrds_username: Option<String>,
    /// Directory holding one SQLite database per WRDS library (`WAREHOUSE_DIR`)
    pub warehouse_dir: PathBuf,
    /// FRED API key (`FRED_API_KEY`)
    pub fred_api_key: Option<String>,
    /// Snapshot format (`SNAPSHOT_FORMAT`)
    pub format: ExportFormat,
    /// Delisting adjustment (`DELISTING_POLICY`); there is no default
    pub delisting_policy: Option<DelistingPolicy>,
    /// Ken French daily file layout (`FRENCH_FACTORS`, 3 or 5)
    pub french_layout: FrenchLayout,
    /// Download location of the daily factor archive (`FRENCH_FACTORS_URL`);
    /// defaults to the Ken French data library
    pub french_url: Option<String>,
    /// Listing exchanges of the CRSP universe (`EXCHANGES`, comma separated)
    pub exchanges: Vec<Exchange>,
}

impl Settings {
    /// Load from the process environment and `.env`.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = get("DATA_DIR")
            .map_or_else(|| default_root().join("data"), PathBuf::from);
        let output_dir = get("OUTPUT_DIR")
            .map_or_else(|| default_root().join("output"), PathBuf::from);
        let warehouse_dir = get("WAREHOUSE_DIR")
            .map_or_else(|| data_dir.join("warehouse"), PathBuf::from);

        let start = get("START_DATE").unwrap_or_else(|| DEFAULT_START_DATE.to_string());
        let end = get("END_DATE").unwrap_or_else(|| DEFAULT_END_DATE.to_string());
        let range = DateRange::parse(&start, &end)?;

        let format = get("SNAPSHOT_FORMAT")
            .map(|f| f.parse::<ExportFormat>())
            .transpose()?
            .unwrap_or_default();

        let delisting_policy = get("DELISTING_POLICY")
            .map(|p| p.parse::<DelistingPolicy>())
            .transpose()?;

        let french_layout = match get("FRENCH_FACTORS") {
            Some(n) => {
                let n = n.trim().parse::<u8>().map_err(|_| {
                    PipelineError::Config(format!("FRENCH_FACTORS must be 3 or 5, got {}", n))
                })?;
                FrenchLayout::from_factor_count(n)?
            }
            None => FrenchLayout::ThreeFactor,
        };

        let exchanges = match get("EXCHANGES") {
            Some(list) => list
                .split(',')
                .map(str::parse)
                .collect::<Result<Vec<Exchange>>>()?,
            None => Exchange::all(),
        };

        Ok(Self {
            data_dir,
            output_dir,
            range,
            wrds_username: get("WRDS_USERNAME"),
            warehouse_dir,
            fred_api_key: get("FRED_API_KEY"),
            format,
            delisting_policy,
            french_layout,
            french_url: get("FRENCH_FACTORS_URL"),
            exchanges,
        })
    }

    /// CRSP universe described by these settings.
    pub fn universe(&self) -> CrspUniverse {
        CrspUniverse::new().with_exchanges(&self.exchanges)
    }

    /// Where the daily factor archive is downloaded from.
    pub fn french_url(&self) -> &str {
        self.french_url
            .as_deref()
            .unwrap_or_else(|| self.french_layout.url())
    }

    /// Local extracted factor CSV that replaces the download when present.
    pub fn french_override(&self) -> PathBuf {
        self.data_dir.join(self.french_layout.csv_name())
    }

    /// The delisting policy, or an error naming the setting to choose one.
    pub fn require_delisting_policy(&self) -> Result<DelistingPolicy> {
        self.delisting_policy.ok_or_else(|| {
            PipelineError::Config(
                "DELISTING_POLICY must be set to imputed-compound or additive".to_string(),
            )
        })
    }
}

/// `panelkit` under the platform data directory.
///
/// - Linux: `~/.local/share/panelkit/`
/// - macOS: `~/Library/Application Support/panelkit/`
/// - Windows: `%APPDATA%\panelkit\`
pub fn default_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("panelkit")
}
