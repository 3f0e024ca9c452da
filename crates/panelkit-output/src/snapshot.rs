//! Snapshot files, one per logical dataset.
//!
//! Every write replaces the previous snapshot wholesale: the frame is written
//! to `<name>.<ext>.tmp` next to the target and renamed over it, so readers
//! never observe a half-written file. CSV and JSON snapshots also carry a
//! `<name>.schema.json` sidecar with their column types.

use crate::error::{Result, SnapshotError};
use crate::schema::SnapshotSchema;
use derive_more::Display;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// Logical datasets produced by the pipeline. The display form is the file
/// stem of the snapshot.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dataset {
    /// CRSP monthly stock file with delisting-adjusted returns
    #[display("crsp_m")]
    CrspMonthly,
    /// CRSP monthly index file
    #[display("CRSP_MSIX")]
    CrspIndex,
    /// Compustat annual fundamentals with derived columns
    #[display("compa")]
    CompustatAnnual,
    /// Compustat quarterly fundamentals with derived columns
    #[display("comp_quarterly")]
    CompustatQuarterly,
    /// CRSP/Compustat link table
    #[display("ccm")]
    CcmLink,
    /// Fama-French monthly factors
    #[display("FF_FACTORS")]
    FamaFrench,
    /// Ken French daily factors parsed from CSV
    #[display("FF_FACTORS_daily")]
    FrenchDaily,
    /// FRED macro panel
    #[display("fred")]
    Fred,
    /// Financial ratios from annual fundamentals
    #[display("financial_ratio")]
    FinancialRatios,
    /// IBES consensus EPS forecasts
    #[display("Forecast_EPS_summary_unadjusted")]
    EpsForecast,
    /// IBES reported EPS
    #[display("Actual_EPS_summary_unadjusted")]
    EpsActual,
    /// IBES/CRSP link
    #[display("crsp_ibes_link")]
    CrspIbesLink,
    /// CRSP security-months linked to IBES tickers
    #[display("crsp_ibes_linked")]
    CrspIbesLinked,
    /// CRSP security-months linked to Compustat firms
    #[display("crsp_comp_linked")]
    CrspCompLinked,
}

impl Dataset {
    /// Every dataset, in pipeline order.
    pub const ALL: [Self; 14] = [
        Self::CrspMonthly,
        Self::CrspIndex,
        Self::CompustatAnnual,
        Self::CompustatQuarterly,
        Self::CcmLink,
        Self::FamaFrench,
        Self::FrenchDaily,
        Self::Fred,
        Self::FinancialRatios,
        Self::EpsForecast,
        Self::EpsActual,
        Self::CrspIbesLink,
        Self::CrspIbesLinked,
        Self::CrspCompLinked,
    ];
}

impl FromStr for Dataset {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.to_string() == s)
            .ok_or_else(|| SnapshotError::Unknown {
                kind: "dataset",
                name: s.to_string(),
            })
    }
}

/// File format of the snapshots.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Apache Parquet
    #[default]
    #[display("parquet")]
    Parquet,
    /// Comma-separated values with a header row
    #[display("csv")]
    Csv,
    /// JSON array of row objects
    #[display("json")]
    Json,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Parquet => "parquet",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Whether the format loses column types and needs a schema sidecar.
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Csv | Self::Json)
    }
}

impl FromStr for ExportFormat {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "parquet" => Ok(Self::Parquet),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(SnapshotError::Unknown {
                kind: "format",
                name: s.to_string(),
            }),
        }
    }
}

/// Directory of dataset snapshots in a single format.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    format: ExportFormat,
}

impl SnapshotStore {
    /// Store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot format.
    pub const fn format(&self) -> ExportFormat {
        self.format
    }

    /// Path of the snapshot for `dataset`.
    pub fn path(&self, dataset: Dataset) -> PathBuf {
        self.dir
            .join(format!("{}.{}", dataset, self.format.extension()))
    }

    /// Whether a snapshot exists for `dataset`.
    pub fn exists(&self, dataset: Dataset) -> bool {
        self.path(dataset).is_file()
    }

    /// Path of the column-type sidecar for `dataset`.
    pub fn schema_path(&self, dataset: Dataset) -> PathBuf {
        self.dir.join(format!("{dataset}.schema.json"))
    }

    /// Write `df` as the snapshot of `dataset`, replacing any previous one.
    pub fn write(&self, dataset: Dataset, df: &mut DataFrame) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(dataset);

        if self.format.is_text() {
            let schema = SnapshotSchema::from_frame(df);
            replace_file(&self.schema_path(dataset), |file| {
                serde_json::to_writer_pretty(file, &schema)?;
                Ok(())
            })?;
        }
        replace_file(&path, |file| self.write_frame(file, df))?;

        info!(
            dataset = %dataset,
            rows = df.height(),
            path = %path.display(),
            "wrote snapshot"
        );
        Ok(path)
    }

    fn write_frame(&self, file: File, df: &mut DataFrame) -> Result<()> {
        match self.format {
            ExportFormat::Parquet => {
                ParquetWriter::new(file).finish(df)?;
            }
            ExportFormat::Csv => {
                CsvWriter::new(file).include_header(true).finish(df)?;
            }
            ExportFormat::Json => {
                JsonWriter::new(file)
                    .with_json_format(JsonFormat::Json)
                    .finish(df)?;
            }
        }
        Ok(())
    }

    /// Read the snapshot of `dataset`.
    ///
    /// Text snapshots are read with the column types from their sidecar, so
    /// zero-padded identifiers stay text and empty date columns stay dates.
    pub fn read(&self, dataset: Dataset) -> Result<DataFrame> {
        let path = self.path(dataset);
        if !path.is_file() {
            return Err(SnapshotError::NotFound(path));
        }

        let schema = if self.format.is_text() {
            self.read_schema(dataset)?
        } else {
            None
        };

        let df = match self.format {
            ExportFormat::Parquet => ParquetReader::new(File::open(&path)?).finish()?,
            ExportFormat::Csv => {
                let overrides = schema.as_ref().map(|s| Arc::new(s.csv_overrides()));
                CsvReadOptions::default()
                    .with_has_header(true)
                    .with_schema_overwrite(overrides)
                    .map_parse_options(|opts| opts.with_try_parse_dates(true))
                    .try_into_reader_with_file_path(Some(path))?
                    .finish()?
            }
            ExportFormat::Json => JsonReader::new(File::open(&path)?).finish()?,
        };

        match schema {
            Some(schema) => schema.restore(df),
            None => Ok(df),
        }
    }

    fn read_schema(&self, dataset: Dataset) -> Result<Option<SnapshotSchema>> {
        let path = self.schema_path(dataset);
        if !path.is_file() {
            warn!(dataset = %dataset, path = %path.display(), "no schema sidecar, inferring column types");
            return Ok(None);
        }
        let schema = serde_json::from_reader(File::open(&path)?)?;
        Ok(Some(schema))
    }
}

/// Write `path` through `<path>.tmp` and rename it into place.
fn replace_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<()>,
{
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let written = File::create(&tmp_path)
        .map_err(SnapshotError::from)
        .and_then(write)
        .and_then(|()| fs::rename(&tmp_path, path).map_err(SnapshotError::from));
    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        let store = SnapshotStore::new("/data", ExportFormat::Parquet);
        assert_eq!(store.path(Dataset::CrspMonthly), PathBuf::from("/data/crsp_m.parquet"));
        assert_eq!(store.path(Dataset::FamaFrench), PathBuf::from("/data/FF_FACTORS.parquet"));

        let store = SnapshotStore::new("/data", ExportFormat::Csv);
        assert_eq!(store.path(Dataset::CompustatAnnual), PathBuf::from("/data/compa.csv"));
        assert_eq!(
            store.schema_path(Dataset::CcmLink),
            PathBuf::from("/data/ccm.schema.json")
        );
    }

    #[test]
    fn test_dataset_names_round_trip() {
        for dataset in Dataset::ALL {
            assert_eq!(dataset.to_string().parse::<Dataset>().unwrap(), dataset);
        }
        assert!("crsp_d".parse::<Dataset>().is_err());
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("Parquet".parse::<ExportFormat>().unwrap(), ExportFormat::Parquet);
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xlsx".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::default().extension(), "parquet");
    }
}
