//! Parser for Kenneth French data library CSV files.
//!
//! The library distributes each factor file as a zipped CSV with a few lines
//! of free text before the header and a copyright footer after the data.
//! Only rows whose first field is an eight-digit `YYYYMMDD` date are kept.
//! An extracted CSV on disk can stand in for the download.

use crate::dates::{DateRange, date_column, parse_date};
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::io::{Cursor, Read};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use ::zip::ZipArchive;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Daily factor file layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrenchLayout {
    /// Market, size and value (Mkt-RF, SMB, HML, RF)
    ThreeFactor,
    /// Five-factor 2x3 (adds RMW, CMA)
    FiveFactor,
}

impl FrenchLayout {
    /// Select a layout from its factor count.
    pub fn from_factor_count(n_factors: u8) -> Result<Self> {
        match n_factors {
            3 => Ok(Self::ThreeFactor),
            5 => Ok(Self::FiveFactor),
            _ => Err(DataError::Config(format!(
                "n_factors must be 3 or 5, got {}",
                n_factors
            ))),
        }
    }

    /// Download URL of the zipped file.
    pub const fn url(&self) -> &'static str {
        match self {
            Self::ThreeFactor => {
                "https://mba.tuck.dartmouth.edu/pages/faculty/ken.french/ftp/F-F_Research_Data_Factors_daily_CSV.zip"
            }
            Self::FiveFactor => {
                "https://mba.tuck.dartmouth.edu/pages/faculty/ken.french/ftp/F-F_Research_Data_5_Factors_2x3_daily_CSV.zip"
            }
        }
    }

    /// Name of the CSV inside the archive.
    pub const fn csv_name(&self) -> &'static str {
        match self {
            Self::ThreeFactor => "F-F_Research_Data_Factors_daily.csv",
            Self::FiveFactor => "F-F_Research_Data_5_Factors_2x3_daily.csv",
        }
    }

    /// Free-text lines preceding the header row.
    pub const fn skip_rows(&self) -> usize {
        match self {
            Self::ThreeFactor => 4,
            Self::FiveFactor => 3,
        }
    }
}

/// Options for [`parse_french_csv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrenchOptions {
    /// File layout
    pub layout: FrenchLayout,
    /// Convert percentages to decimals
    pub as_decimal: bool,
    /// Optional inclusive date window
    pub range: Option<DateRange>,
}

impl Default for FrenchOptions {
    fn default() -> Self {
        Self {
            layout: FrenchLayout::ThreeFactor,
            as_decimal: true,
            range: None,
        }
    }
}

fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase().replace(['-', ' '], "_")
}

/// Parse the text of a daily factor file.
///
/// Output columns: `date` followed by one `Float64` column per factor with
/// lower-cased names (`mkt_rf`, `smb`, `hml`, `rf`, ...), sorted by date.
pub fn parse_french_csv(text: &str, options: &FrenchOptions) -> Result<DataFrame> {
    let body: String = text
        .lines()
        .skip(options.layout.skip_rows())
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let factors: Vec<String> = reader
        .headers()?
        .iter()
        .skip(1)
        .map(normalize_header)
        .collect();
    if factors.is_empty() {
        return Err(DataError::Parse("Factor file has no factor columns".to_string()));
    }

    let scale = if options.as_decimal { 100.0 } else { 1.0 };
    let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();

    for record in reader.records() {
        let record = record?;
        let Some(first) = record.get(0) else { continue };
        if first.len() != 8 || !first.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let Some(date) = parse_date(first) else { continue };
        if options.range.is_some_and(|r| !r.contains(date)) {
            continue;
        }

        let values = (1..=factors.len())
            .map(|i| match record.get(i).filter(|v| !v.is_empty()) {
                None => Ok(None),
                Some(v) => v
                    .parse::<f64>()
                    .map(|x| Some(x / scale))
                    .map_err(|e| DataError::Parse(format!("Invalid factor value {}: {}", v, e))),
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push((date, values));
    }

    rows.sort_by_key(|(date, _)| *date);

    let dates: Vec<Option<NaiveDate>> = rows.iter().map(|(d, _)| Some(*d)).collect();
    let mut columns = vec![date_column("date", &dates)?];
    for (idx, name) in factors.iter().enumerate() {
        let values: Vec<Option<f64>> = rows.iter().map(|(_, v)| v[idx]).collect();
        columns.push(Column::new(name.as_str().into(), values));
    }

    let df = DataFrame::new(columns)?;
    info!(rows = df.height(), layout = ?options.layout, "parsed Fama-French factor file");
    Ok(df)
}

/// Read and parse an extracted daily factor CSV from disk.
pub fn load_french_csv<P: AsRef<Path>>(path: P, options: &FrenchOptions) -> Result<DataFrame> {
    let text = std::fs::read_to_string(path)?;
    parse_french_csv(&text, options)
}

/// Pull the factor CSV out of a zipped download.
///
/// The entry is matched on [`FrenchLayout::csv_name`] ignoring case, since the
/// library ships both `.csv` and `.CSV` names. An archive holding a single
/// file yields that file.
pub fn extract_french_csv(archive: &[u8], layout: FrenchLayout) -> Result<String> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    let names: Vec<String> = zip.file_names().map(str::to_string).collect();

    let wanted = layout.csv_name();
    let name = names
        .iter()
        .find(|n| n.eq_ignore_ascii_case(wanted))
        .or_else(|| names.first().filter(|_| names.len() == 1))
        .ok_or_else(|| {
            DataError::Parse(format!(
                "{} not found in archive (entries: {})",
                wanted,
                names.join(", ")
            ))
        })?;
    debug!(entry = %name, "extracting factor file");

    let mut bytes = Vec::new();
    zip.by_name(name)?.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Download the zipped factor file from `url`, extract and parse it.
///
/// `url` is normally [`FrenchLayout::url`] of `options.layout`.
pub async fn download_french_factors(url: &str, options: &FrenchOptions) -> Result<DataFrame> {
    let client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?;

    info!(url, "downloading Fama-French daily factors");
    let archive = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    let text = extract_french_csv(&archive, options.layout)?;
    parse_french_csv(&text, options)
}
