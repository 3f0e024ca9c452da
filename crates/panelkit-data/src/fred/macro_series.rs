//! Macro panel built from FRED series.

use super::client::{FredClient, Observation};
use crate::dates::{DateRange, date_column};
use crate::error::Result;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::info;

/// How a raw FRED series enters the macro panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// One-period log difference
    LogGrowth,
    /// Raw level
    Level,
}

/// A FRED series and the panel column it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroSeries {
    /// FRED series id
    pub series_id: &'static str,
    /// Output column name
    pub column: &'static str,
    /// Transformation applied before alignment
    pub transform: Transform,
}

/// Series pulled into the macro panel.
pub const MACRO_SERIES: &[MacroSeries] = &[
    MacroSeries {
        series_id: "PCEC96",
        column: "consumption_growth",
        transform: Transform::LogGrowth,
    },
    MacroSeries {
        series_id: "GDPC1",
        column: "gdp_growth",
        transform: Transform::LogGrowth,
    },
    MacroSeries {
        series_id: "INDPRO",
        column: "indpro_growth",
        transform: Transform::LogGrowth,
    },
    MacroSeries {
        series_id: "UNRATE",
        column: "unemployment_rate",
        transform: Transform::Level,
    },
];

/// `ln(x_t) - ln(x_{t-periods})` over the series' own observation order.
///
/// Missing or non-positive values have no real logarithm and yield a missing
/// growth for every difference they take part in.
pub fn log_growth(observations: &[Observation], periods: usize) -> Vec<Observation> {
    let logs: Vec<Option<f64>> = observations
        .iter()
        .map(|o| o.value.filter(|v| *v > 0.0).map(f64::ln))
        .collect();

    observations
        .iter()
        .enumerate()
        .map(|(i, o)| {
            let value = i
                .checked_sub(periods)
                .and_then(|j| Some(logs[i]? - logs[j]?));
            Observation {
                date: o.date,
                value,
            }
        })
        .collect()
}

/// Align transformed series on the union of their dates.
///
/// Output columns: `date` followed by one `Float64` column per series, in the
/// order given. Dates are sorted ascending.
pub fn assemble_macro_panel(series: &[(&str, Vec<Observation>)]) -> Result<DataFrame> {
    let mut rows: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();

    for (idx, (_, observations)) in series.iter().enumerate() {
        for obs in observations {
            let row = rows
                .entry(obs.date)
                .or_insert_with(|| vec![None; series.len()]);
            row[idx] = obs.value;
        }
    }

    let dates: Vec<Option<NaiveDate>> = rows.keys().copied().map(Some).collect();
    let mut columns = vec![date_column("date", &dates)?];
    for (idx, (name, _)) in series.iter().enumerate() {
        let values: Vec<Option<f64>> = rows.values().map(|row| row[idx]).collect();
        columns.push(Column::new((*name).into(), values));
    }

    Ok(DataFrame::new(columns)?)
}

/// Pull and assemble the macro panel. Requests are issued one at a time.
pub async fn pull_macro(client: &FredClient, range: &DateRange) -> Result<DataFrame> {
    let mut transformed = Vec::with_capacity(MACRO_SERIES.len());

    for spec in MACRO_SERIES {
        let observations = client.get_series(spec.series_id, range).await?;
        info!(series = spec.series_id, rows = observations.len(), "pulled FRED series");
        let values = match spec.transform {
            Transform::LogGrowth => log_growth(&observations, 1),
            Transform::Level => observations,
        };
        transformed.push((spec.column, values));
    }

    assemble_macro_panel(&transformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn obs(y: i32, m: u32, value: Option<f64>) -> Observation {
        Observation {
            date: NaiveDate::from_ymd_opt(y, m, 1).unwrap(),
            value,
        }
    }

    #[test]
    fn test_log_growth() {
        let series = vec![
            obs(2020, 1, Some(100.0)),
            obs(2020, 2, Some(110.0)),
            obs(2020, 3, None),
            obs(2020, 4, Some(121.0)),
        ];
        let growth = log_growth(&series, 1);

        assert_eq!(growth[0].value, None);
        assert_relative_eq!(growth[1].value.unwrap(), (1.1f64).ln(), epsilon = 1e-12);
        assert_eq!(growth[2].value, None);
        // The gap is not bridged
        assert_eq!(growth[3].value, None);
    }

    #[test]
    fn test_log_growth_non_positive() {
        let series = vec![obs(2020, 1, Some(0.0)), obs(2020, 2, Some(5.0))];
        assert_eq!(log_growth(&series, 1)[1].value, None);
    }

    #[test]
    fn test_assemble_aligns_mixed_frequencies() {
        let quarterly = vec![obs(2020, 1, Some(0.01)), obs(2020, 4, Some(0.02))];
        let monthly = vec![
            obs(2020, 1, Some(3.5)),
            obs(2020, 2, Some(3.6)),
            obs(2020, 3, Some(4.4)),
            obs(2020, 4, Some(14.8)),
        ];
        let df =
            assemble_macro_panel(&[("gdp_growth", quarterly), ("unemployment_rate", monthly)])
                .unwrap();

        assert_eq!(df.height(), 4);
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["date", "gdp_growth", "unemployment_rate"]);
        let gdp = df.column("gdp_growth").unwrap().f64().unwrap();
        assert_eq!(gdp.get(0), Some(0.01));
        assert_eq!(gdp.get(1), None);
        assert_eq!(gdp.get(3), Some(0.02));
    }
}
