//! End-to-end orchestration: pull, derive, link, validate and snapshot.
//!
//! Steps run sequentially. Each step reads its inputs from the warehouse or
//! from snapshots written by earlier steps and replaces its own snapshots.

use crate::error::{PipelineError, Result};
use crate::settings::Settings;
use crate::universe::{CrspUniverse, Universe};
use panelkit_data::french::{FrenchOptions, download_french_factors, load_french_csv};
use panelkit_data::fred::{FredClient, pull_macro};
use panelkit_data::{DateRange, UniquenessReport, Warehouse, check_forecast_uniqueness, wrds};
use panelkit_features::{
    AnnualFundamentals, DelistingAdjustment, Feature, FinancialRatios, QuarterlyFundamentals,
};
use panelkit_output::{Dataset, RunReport, SnapshotStore};
use polars::prelude::*;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// File name of the run report inside the output directory.
pub const RUN_REPORT_FILE: &str = "run_report.json";

/// Upstream sources the pipeline can pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// CRSP monthly stock file with delisting-adjusted returns
    Crsp,
    /// CRSP monthly index file
    CrspIndex,
    /// Compustat annual fundamentals
    Compustat,
    /// Compustat quarterly fundamentals
    CompustatQuarterly,
    /// CRSP/Compustat link table
    Ccm,
    /// Fama-French monthly factors from WRDS
    FamaFrench,
    /// Ken French daily factors, downloaded or from a local CSV
    FrenchDaily,
    /// FRED macro series
    Fred,
    /// IBES forecasts, actuals and the IBES/CRSP link
    Ibes,
}

impl Source {
    /// Every source, in pull order.
    pub const ALL: [Self; 9] = [
        Self::Crsp,
        Self::CrspIndex,
        Self::Compustat,
        Self::CompustatQuarterly,
        Self::Ccm,
        Self::FamaFrench,
        Self::FrenchDaily,
        Self::Fred,
        Self::Ibes,
    ];

    /// Command-line name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Crsp => "crsp",
            Self::CrspIndex => "crsp-index",
            Self::Compustat => "compustat",
            Self::CompustatQuarterly => "compustat-quarterly",
            Self::Ccm => "ccm",
            Self::FamaFrench => "ff",
            Self::FrenchDaily => "french",
            Self::Fred => "fred",
            Self::Ibes => "ibes",
        }
    }

    /// Snapshots written by a pull of this source.
    pub const fn datasets(&self) -> &'static [Dataset] {
        match self {
            Self::Crsp => &[Dataset::CrspMonthly],
            Self::CrspIndex => &[Dataset::CrspIndex],
            Self::Compustat => &[Dataset::CompustatAnnual],
            Self::CompustatQuarterly => &[Dataset::CompustatQuarterly],
            Self::Ccm => &[Dataset::CcmLink],
            Self::FamaFrench => &[Dataset::FamaFrench],
            Self::FrenchDaily => &[Dataset::FrenchDaily],
            Self::Fred => &[Dataset::Fred],
            Self::Ibes => &[Dataset::EpsForecast, Dataset::EpsActual, Dataset::CrspIbesLink],
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Source {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|source| source.name() == s)
            .ok_or_else(|| PipelineError::Config(format!("unknown source: {}", s)))
    }
}

/// Research data pipeline over a warehouse.
#[derive(Debug)]
pub struct Pipeline<W: Warehouse> {
    warehouse: W,
    settings: Settings,
    universe: CrspUniverse,
    store: SnapshotStore,
    report: RunReport,
}

impl<W: Warehouse> Pipeline<W> {
    /// Pipeline writing snapshots to `settings.data_dir`.
    pub fn new(warehouse: W, settings: Settings) -> Self {
        let store = SnapshotStore::new(settings.data_dir.clone(), settings.format);
        let universe = settings.universe();
        Self {
            warehouse,
            settings,
            universe,
            store,
            report: RunReport::new(),
        }
    }

    /// Replace the CRSP universe.
    pub fn with_universe(mut self, universe: CrspUniverse) -> Self {
        self.universe = universe;
        self
    }

    /// Snapshot store.
    pub const fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Run report so far.
    pub const fn report(&self) -> &RunReport {
        &self.report
    }

    /// Settings of the run.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    fn save(&mut self, step: &str, dataset: Dataset, mut df: DataFrame) -> Result<PathBuf> {
        let path = self.store.write(dataset, &mut df)?;
        self.report.record(step, dataset, df.height(), path.clone());
        Ok(path)
    }

    /// Pull `source` and write its snapshots.
    pub async fn pull(&mut self, source: Source) -> Result<Vec<PathBuf>> {
        let range = self.settings.range;
        let step = format!("pull {}", source);
        info!(source = %source, start = %range.start, end = %range.end, "pulling");

        let paths = match source {
            Source::Crsp => {
                let policy = self.settings.require_delisting_policy()?;
                info!(universe = %self.universe.name(), policy = %policy, "CRSP universe");
                let raw = wrds::pull_crsp_monthly(
                    &self.warehouse,
                    &range,
                    &self.universe.security_filter(),
                )?;
                let adjusted = DelistingAdjustment::new(policy).apply(raw)?;
                vec![self.save(&step, Dataset::CrspMonthly, adjusted)?]
            }
            Source::CrspIndex => {
                let df = wrds::pull_crsp_index(&self.warehouse, &range)?;
                vec![self.save(&step, Dataset::CrspIndex, df)?]
            }
            Source::Compustat => {
                let raw = wrds::pull_compustat_annual(&self.warehouse, &range)?;
                let df = AnnualFundamentals::default().apply(raw)?;
                vec![self.save(&step, Dataset::CompustatAnnual, df)?]
            }
            Source::CompustatQuarterly => {
                let raw = wrds::pull_compustat_quarterly(&self.warehouse, &range)?;
                let df = QuarterlyFundamentals.apply(raw)?;
                vec![self.save(&step, Dataset::CompustatQuarterly, df)?]
            }
            Source::Ccm => {
                let df = wrds::pull_ccm_link_table(&self.warehouse)?;
                vec![self.save(&step, Dataset::CcmLink, df)?]
            }
            Source::FamaFrench => {
                let df = wrds::pull_ff_factors_monthly(&self.warehouse)?;
                vec![self.save(&step, Dataset::FamaFrench, df)?]
            }
            Source::FrenchDaily => {
                let options = FrenchOptions {
                    layout: self.settings.french_layout,
                    as_decimal: true,
                    range: Some(range),
                };
                let local = self.settings.french_override();
                let df = if local.is_file() {
                    info!(path = %local.display(), "reading local factor file");
                    load_french_csv(&local, &options)?
                } else {
                    download_french_factors(self.settings.french_url(), &options).await?
                };
                vec![self.save(&step, Dataset::FrenchDaily, df)?]
            }
            Source::Fred => {
                let key = self.settings.fred_api_key.clone().ok_or_else(|| {
                    PipelineError::Config("FRED_API_KEY is not set".to_string())
                })?;
                let client = FredClient::new(key)?;
                let df = pull_macro(&client, &range).await?;
                vec![self.save(&step, Dataset::Fred, df)?]
            }
            Source::Ibes => self.pull_ibes(&step, &range)?,
        };
        Ok(paths)
    }

    /// Forecasts, actuals and the link are pulled independently. Each one is
    /// written as soon as it succeeds; failures are reported and the step
    /// only fails when nothing could be written.
    fn pull_ibes(&mut self, step: &str, range: &DateRange) -> Result<Vec<PathBuf>> {
        let pulls = [
            (Dataset::EpsForecast, wrds::pull_eps_forecast(&self.warehouse, range)),
            (Dataset::EpsActual, wrds::pull_eps_actual(&self.warehouse, range)),
            (Dataset::CrspIbesLink, wrds::pull_crsp_ibes_link(&self.warehouse)),
        ];

        let mut paths = Vec::with_capacity(pulls.len());
        let mut first_error = None;
        for (dataset, pulled) in pulls {
            match pulled {
                Ok(df) => {
                    if dataset == Dataset::EpsForecast {
                        self.note_uniqueness(&check_forecast_uniqueness(&df)?);
                    }
                    paths.push(self.save(step, dataset, df)?);
                }
                Err(e) => {
                    warn!(dataset = %dataset, error = %e, "IBES pull failed");
                    self.report.warn(format!("{} not written: {}", dataset, e));
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) if paths.is_empty() => Err(e.into()),
            _ => Ok(paths),
        }
    }

    /// Compute financial ratios from the annual fundamentals snapshot.
    pub fn derive(&mut self) -> Result<PathBuf> {
        let compa = self.store.read(Dataset::CompustatAnnual)?;
        let ratios = FinancialRatios::default().apply(compa)?;
        self.save("derive", Dataset::FinancialRatios, ratios)
    }

    /// Link CRSP security-months to Compustat firms and IBES tickers.
    pub fn link(&mut self) -> Result<Vec<PathBuf>> {
        let crsp_m = self.store.read(Dataset::CrspMonthly)?;

        let ccm = self.store.read(Dataset::CcmLink)?;
        let comp_linked = panelkit_link::link_crsp_compustat(&crsp_m, &ccm)?;
        let comp_path = self.save("link", Dataset::CrspCompLinked, comp_linked)?;

        let iclink = self.store.read(Dataset::CrspIbesLink)?;
        let ibes_linked = panelkit_link::merge_crsp_ibes(&crsp_m, &iclink)?;
        let ibes_path = self.save("link", Dataset::CrspIbesLinked, ibes_linked)?;

        Ok(vec![comp_path, ibes_path])
    }

    /// Check the forecast snapshot for duplicate `(ticker, statpers)` keys.
    ///
    /// Duplicates are reported, never removed.
    pub fn validate(&mut self) -> Result<UniquenessReport> {
        let forecast = self.store.read(Dataset::EpsForecast)?;
        let report = check_forecast_uniqueness(&forecast)?;
        self.note_uniqueness(&report);
        Ok(report)
    }

    fn note_uniqueness(&mut self, report: &UniquenessReport) {
        if !report.is_unique() {
            self.report.warn(format!(
                "forecast keys not unique: {} of {} keys repeat, largest group has {} rows",
                report.duplicated_groups, report.groups, report.max_group_size
            ));
        }
    }

    /// Pull every available source, then derive, link and validate.
    ///
    /// FRED is skipped without an API key. Sources outside the warehouse
    /// (FRED and the French daily factors) do not abort the run: a failed
    /// download is logged and recorded as a report warning.
    pub async fn run_all(&mut self) -> Result<()> {
        for source in Source::ALL {
            match source {
                Source::Fred if self.settings.fred_api_key.is_none() => {
                    warn!("FRED_API_KEY not set, skipping FRED");
                }
                Source::Fred | Source::FrenchDaily => {
                    if let Err(e) = self.pull(source).await {
                        warn!(source = %source, error = %e, "download failed, continuing");
                        self.report.warn(format!("{} not pulled: {}", source, e));
                    }
                }
                _ => {
                    self.pull(source).await?;
                }
            }
        }
        self.derive()?;
        self.link()?;
        self.validate()?;
        Ok(())
    }

    /// Stamp the run report and write it to the output directory.
    pub fn finish(&mut self) -> Result<PathBuf> {
        self.report.finish();
        let path = self.settings.output_dir.join(RUN_REPORT_FILE);
        self.report.write(&path)?;
        info!(
            steps = self.report.steps.len(),
            rows = self.report.total_rows(),
            warnings = self.report.warnings.len(),
            path = %path.display(),
            "run complete"
        );
        Ok(path)
    }
}
