//! Column types recorded next to text snapshots.
//!
//! CSV and JSON do not carry column types, so a reader would re-infer them:
//! `gvkey` "001690" would become the integer 1690 and an all-null date column
//! would come back as text. Text snapshots therefore get a
//! `<name>.schema.json` sidecar that is applied when the snapshot is read.

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Date format used by the polars CSV and JSON writers.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Column types that survive a text round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Boolean
    Boolean,
    /// 32-bit integer
    Int32,
    /// 64-bit integer
    Int64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// UTF-8 text
    String,
    /// Calendar date
    Date,
}

impl ColumnType {
    /// Recordable type of a polars dtype. `None` for types left to inference.
    pub const fn from_dtype(dtype: &DataType) -> Option<Self> {
        match dtype {
            DataType::Boolean => Some(Self::Boolean),
            DataType::Int32 => Some(Self::Int32),
            DataType::Int64 => Some(Self::Int64),
            DataType::Float32 => Some(Self::Float32),
            DataType::Float64 => Some(Self::Float64),
            DataType::String => Some(Self::String),
            DataType::Date => Some(Self::Date),
            _ => None,
        }
    }

    /// The polars dtype.
    pub fn dtype(&self) -> DataType {
        match self {
            Self::Boolean => DataType::Boolean,
            Self::Int32 => DataType::Int32,
            Self::Int64 => DataType::Int64,
            Self::Float32 => DataType::Float32,
            Self::Float64 => DataType::Float64,
            Self::String => DataType::String,
            Self::Date => DataType::Date,
        }
    }
}

/// One recorded column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,
    /// Column type
    pub dtype: ColumnType,
}

/// Ordered column types of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSchema {
    /// Recorded columns in frame order
    pub columns: Vec<ColumnSpec>,
}

impl SnapshotSchema {
    /// Record the types of `df`.
    pub fn from_frame(df: &DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .filter_map(|column| {
                let dtype = ColumnType::from_dtype(column.dtype());
                if dtype.is_none() {
                    debug!(column = %column.name(), dtype = %column.dtype(), "type left to inference");
                }
                dtype.map(|dtype| ColumnSpec {
                    name: column.name().to_string(),
                    dtype,
                })
            })
            .collect();
        Self { columns }
    }

    /// Schema overrides for the CSV reader. Text and date columns are read
    /// with their recorded type so no value is re-inferred.
    pub fn csv_overrides(&self) -> Schema {
        let mut schema = Schema::with_capacity(self.columns.len());
        for spec in &self.columns {
            schema.with_column(spec.name.as_str().into(), spec.dtype.dtype());
        }
        schema
    }

    /// Cast the columns of `df` back to their recorded types.
    ///
    /// Dates stored as text are parsed as `YYYY-MM-DD`. Columns absent from
    /// either side are left alone.
    pub fn restore(&self, df: DataFrame) -> Result<DataFrame> {
        let mut exprs = Vec::with_capacity(self.columns.len());
        for spec in &self.columns {
            let Ok(current) = df.column(&spec.name) else {
                continue;
            };
            let target = spec.dtype.dtype();
            if current.dtype() == &target {
                continue;
            }
            let expr = match (spec.dtype, current.dtype()) {
                (ColumnType::Date, DataType::String) => {
                    col(spec.name.as_str()).str().to_date(StrptimeOptions {
                        format: Some(DATE_FORMAT.into()),
                        strict: false,
                        ..Default::default()
                    })
                }
                _ => col(spec.name.as_str()).cast(target),
            };
            exprs.push(expr);
        }

        if exprs.is_empty() {
            return Ok(df);
        }
        Ok(df.lazy().with_columns(exprs).collect()?)
    }
}
