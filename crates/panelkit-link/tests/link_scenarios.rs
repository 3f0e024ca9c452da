//! Linking scenarios over small synthetic panels.

use chrono::NaiveDate;
use panelkit_data::dates::{column_dates, date_column};
use panelkit_link::{IntervalJoin, link_crsp_compustat, merge_crsp_ibes, official_links};
use polars::prelude::*;
use rstest::rstest;

fn d(y: i32, m: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, day)
}

fn crsp_m(permnos: Vec<i64>, months: &[Option<NaiveDate>]) -> DataFrame {
    DataFrame::new(vec![
        Column::new("permno".into(), permnos),
        date_column("yearmonth", months).unwrap(),
    ])
    .unwrap()
}

fn ccm(
    gvkeys: &[&str],
    linktypes: &[&str],
    linkprims: &[&str],
    starts: &[Option<NaiveDate>],
    ends: &[Option<NaiveDate>],
) -> DataFrame {
    DataFrame::new(vec![
        Column::new("gvkey".into(), gvkeys),
        Column::new("permno".into(), vec![10001i64; gvkeys.len()]),
        Column::new("linktype".into(), linktypes),
        Column::new("linkprim".into(), linkprims),
        date_column("linkdt", starts).unwrap(),
        date_column("linkenddt", ends).unwrap(),
    ])
    .unwrap()
}

fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|s| s.map(str::to_string))
        .collect()
}

#[test]
fn test_row_matches_only_covering_interval() {
    let panel = crsp_m(vec![10001], &[d(2021, 6, 30)]);
    let links = ccm(
        &["OLD", "NEW"],
        &["LC", "LC"],
        &["P", "P"],
        &[d(2020, 1, 1), d(2021, 4, 1)],
        &[d(2021, 3, 31), d(2099, 12, 31)],
    );

    let linked = link_crsp_compustat(&panel, &links).unwrap();
    assert_eq!(linked.height(), 1);
    assert_eq!(strings(&linked, "gvkey"), vec![Some("NEW".to_string())]);
    assert_eq!(column_dates(&linked, "linkdt").unwrap(), vec![d(2021, 4, 1)]);
}

#[test]
fn test_unlinked_months_are_dropped() {
    let panel = crsp_m(
        vec![10001, 10001, 10001, 99999],
        &[d(2019, 12, 31), d(2020, 6, 30), d(2022, 1, 31), d(2020, 6, 30)],
    );
    let links = ccm(&["A"], &["LU"], &["C"], &[d(2020, 1, 1)], &[d(2021, 12, 31)]);

    let linked = link_crsp_compustat(&panel, &links).unwrap();
    assert_eq!(column_dates(&linked, "yearmonth").unwrap(), vec![d(2020, 6, 30)]);
}

#[test]
fn test_active_link_has_no_end() {
    let panel = crsp_m(vec![10001, 10001], &[d(1999, 1, 31), d(2024, 12, 31)]);
    let links = ccm(&["A"], &["LC"], &["P"], &[d(2000, 1, 1)], &[None]);

    let linked = link_crsp_compustat(&panel, &links).unwrap();
    assert_eq!(column_dates(&linked, "yearmonth").unwrap(), vec![d(2024, 12, 31)]);
}

#[rstest]
#[case("LC", "P", true)]
#[case("LU", "C", true)]
#[case("LS", "P", true)]
#[case("LC", "J", false)]
#[case("NR", "P", false)]
#[case("NU", "C", false)]
fn test_official_link_filter(#[case] linktype: &str, #[case] linkprim: &str, #[case] kept: bool) {
    let links = ccm(&["A"], &[linktype], &[linkprim], &[d(2000, 1, 1)], &[None]);
    let official = official_links(&links).unwrap();
    assert_eq!(official.height() == 1, kept);
}

fn iclink(scores: &[Option<f64>]) -> DataFrame {
    let n = scores.len();
    let tickers: Vec<String> = (0..n).map(|i| format!("T{}", i)).collect();
    DataFrame::new(vec![
        Column::new("permno".into(), vec![10001i64; n]),
        Column::new("ticker".into(), tickers),
        date_column("sdate", &vec![d(2000, 1, 1); n]).unwrap(),
        date_column("edate", &vec![None; n]).unwrap(),
        Column::new("score".into(), scores),
    ])
    .unwrap()
}

#[test]
fn test_ibes_merge_applies_score_threshold() {
    let panel = crsp_m(vec![10001], &[d(2021, 6, 30)]);
    let links = iclink(&[Some(0.0), Some(1.0), Some(2.0), Some(5.0), None]);

    let linked = merge_crsp_ibes(&panel, &links).unwrap();
    let mut tickers = strings(&linked, "ticker");
    tickers.sort();
    assert_eq!(
        tickers,
        vec![Some("T0".to_string()), Some("T1".to_string()), Some("T4".to_string())]
    );
}

#[test]
fn test_ibes_merge_without_score_column() {
    let panel = crsp_m(vec![10001, 10002], &[d(2021, 6, 30), d(2021, 6, 30)]);
    let links = iclink(&[Some(9.0)]).drop("score").unwrap();

    let linked = merge_crsp_ibes(&panel, &links).unwrap();
    assert_eq!(linked.height(), 1);
}

#[test]
fn test_generic_join_keeps_every_covering_interval() {
    let left = crsp_m(vec![10001], &[d(2021, 6, 30)]);
    let right = DataFrame::new(vec![
        Column::new("permno".into(), [10001i64, 10001]),
        Column::new("label".into(), ["a", "b"]),
        date_column("from", &[d(2021, 1, 1), None]).unwrap(),
        date_column("to", &[None, d(2021, 12, 31)]).unwrap(),
    ])
    .unwrap();

    let joined = IntervalJoin::new("permno", "yearmonth", "from", "to")
        .join(&left, &right)
        .unwrap();
    assert_eq!(joined.height(), 2);
}
