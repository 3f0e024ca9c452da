//! Ordered fallbacks over candidate tables and column names.

use crate::error::{DataError, Result};
use polars::prelude::DataFrame;
use std::fmt::Display;
use tracing::{info, warn};

/// Try `candidates` in order and return the first that yields rows.
///
/// A candidate whose attempt errors, or succeeds with zero rows, is logged
/// and skipped. Attempts are strictly sequential and stop at the first
/// success. When every candidate is exhausted the error names all of them.
pub fn first_usable<'a, C, F>(
    dataset: &str,
    candidates: &'a [C],
    mut attempt: F,
) -> Result<(&'a C, DataFrame)>
where
    C: Display,
    F: FnMut(&C) -> Result<DataFrame>,
{
    let mut tried = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        tried.push(candidate.to_string());
        info!(dataset, candidate = %candidate, "attempting source");

        match attempt(candidate) {
            Ok(df) if df.height() > 0 => {
                info!(dataset, candidate = %candidate, rows = df.height(), "source accepted");
                return Ok((candidate, df));
            }
            Ok(_) => {
                warn!(dataset, candidate = %candidate, "source returned no rows");
            }
            Err(e) => {
                warn!(dataset, candidate = %candidate, error = %e, "source unavailable");
            }
        }
    }

    Err(DataError::NoUsableSource {
        dataset: dataset.to_string(),
        tried,
    })
}

/// First name in `candidates` present in `columns`.
pub fn resolve_column(columns: &[String], candidates: &[&'static str]) -> Option<&'static str> {
    candidates
        .iter()
        .copied()
        .find(|name| columns.iter().any(|c| c == name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn frame(rows: usize) -> DataFrame {
        DataFrame::new(vec![Column::new("x".into(), vec![1i64; rows])]).unwrap()
    }

    #[test]
    fn test_first_usable_skips_errors_and_empty() {
        let candidates = ["a.missing", "a.empty", "a.good", "a.never"];
        let mut calls = Vec::new();

        let (chosen, df) = first_usable("test", &candidates, |c| {
            calls.push(c.to_string());
            match *c {
                "a.missing" => Err(DataError::TableNotFound(c.to_string())),
                "a.empty" => Ok(frame(0)),
                _ => Ok(frame(3)),
            }
        })
        .unwrap();

        assert_eq!(*chosen, "a.good");
        assert_eq!(df.height(), 3);
        // Short-circuits on the first success
        assert_eq!(calls, vec!["a.missing", "a.empty", "a.good"]);
    }

    #[test]
    fn test_first_usable_exhausted() {
        let candidates = ["x.one", "x.two"];
        let result = first_usable("forecast", &candidates, |_| Ok(frame(0)));

        match result {
            Err(DataError::NoUsableSource { dataset, tried }) => {
                assert_eq!(dataset, "forecast");
                assert_eq!(tried, vec!["x.one", "x.two"]);
            }
            other => panic!("expected NoUsableSource, got {:?}", other.map(|(c, _)| *c)),
        }
    }

    #[test]
    fn test_resolve_column_priority() {
        let columns = vec!["linkdt".to_string(), "sdate".to_string(), "lpermno".to_string()];
        assert_eq!(resolve_column(&columns, &["sdate", "startdate", "linkdt"]), Some("sdate"));
        assert_eq!(resolve_column(&columns, &["permno", "lpermno"]), Some("lpermno"));
        assert_eq!(resolve_column(&columns, &["score", "linkscore"]), None);
    }
}
