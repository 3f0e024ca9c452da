//! Run reports for the panelkit pipeline.

use crate::error::Result;
use crate::snapshot::Dataset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One completed pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step name
    pub step: String,
    /// Dataset written by the step
    pub dataset: Dataset,
    /// Rows written
    pub rows: usize,
    /// Snapshot path
    pub path: PathBuf,
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run start timestamp.
    pub started_at: DateTime<Utc>,

    /// Run end timestamp, set by [`RunReport::finish`].
    pub finished_at: Option<DateTime<Utc>>,

    /// Completed steps in execution order.
    pub steps: Vec<StepRecord>,

    /// Data-quality warnings raised during the run.
    pub warnings: Vec<String>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    /// Start a report now.
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record a written snapshot.
    pub fn record(&mut self, step: &str, dataset: Dataset, rows: usize, path: PathBuf) {
        self.steps.push(StepRecord {
            step: step.to_string(),
            dataset,
            rows,
            path,
        });
    }

    /// Record a data-quality warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Total rows written across all steps.
    pub fn total_rows(&self) -> usize {
        self.steps.iter().map(|s| s.rows).sum()
    }

    /// Stamp the end time.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
