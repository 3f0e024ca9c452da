//! Snapshot store round trips on disk.

use panelkit_output::{Dataset, ExportFormat, RunReport, SnapshotError, SnapshotStore};
use polars::prelude::*;
use rstest::rstest;
use tempfile::TempDir;

fn sample(n: i64) -> DataFrame {
    df! {
        "permno" => (0..n).collect::<Vec<i64>>(),
        "ret" => (0..n).map(|i| Some(i as f64 / 100.0)).collect::<Vec<_>>(),
        "ticker" => (0..n).map(|i| format!("T{}", i)).collect::<Vec<_>>(),
    }
    .unwrap()
}

#[rstest]
#[case(ExportFormat::Parquet)]
#[case(ExportFormat::Csv)]
#[case(ExportFormat::Json)]
fn test_write_then_read(#[case] format: ExportFormat) {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path(), format);

    let path = store.write(Dataset::CrspMonthly, &mut sample(3)).unwrap();
    assert!(path.ends_with(format!("crsp_m.{}", format.extension())));
    assert!(store.exists(Dataset::CrspMonthly));

    let back = store.read(Dataset::CrspMonthly).unwrap();
    assert_eq!(back.height(), 3);
    assert_eq!(back.width(), 3);
}

fn link_rows() -> DataFrame {
    let day = |y, m, d| chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap();
    df! {
        "gvkey" => ["001690", "012141"],
        "permno" => [14593i64, 10107],
        "linkdt" => [day(1980, 12, 12), day(1986, 3, 13)],
        "linkenddt" => [None::<chrono::NaiveDate>, None],
        "at" => [Some(351.0), None],
    }
    .unwrap()
}

#[rstest]
#[case(ExportFormat::Parquet)]
#[case(ExportFormat::Csv)]
#[case(ExportFormat::Json)]
fn test_read_keeps_column_types(#[case] format: ExportFormat) {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path(), format);

    let original = link_rows();
    store.write(Dataset::CcmLink, &mut original.clone()).unwrap();
    let back = store.read(Dataset::CcmLink).unwrap();

    assert_eq!(back.schema(), original.schema());
    assert!(back.equals_missing(&original));

    let gvkey = back.column("gvkey").unwrap().str().unwrap();
    assert_eq!(gvkey.get(0), Some("001690"));
    assert_eq!(back.column("linkenddt").unwrap().null_count(), 2);
}

#[test]
fn test_text_snapshot_without_sidecar_is_inferred() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path(), ExportFormat::Csv);

    store.write(Dataset::CcmLink, &mut link_rows()).unwrap();
    std::fs::remove_file(store.schema_path(Dataset::CcmLink)).unwrap();

    let back = store.read(Dataset::CcmLink).unwrap();
    assert_eq!(back.height(), 2);
    assert_ne!(back.column("gvkey").unwrap().dtype(), &DataType::String);
}

#[test]
fn test_parquet_snapshot_has_no_sidecar() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path(), ExportFormat::Parquet);
    store.write(Dataset::CcmLink, &mut link_rows()).unwrap();
    assert!(!store.schema_path(Dataset::CcmLink).exists());
}

#[test]
fn test_write_overwrites_previous_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path(), ExportFormat::Parquet);

    store.write(Dataset::CompustatAnnual, &mut sample(5)).unwrap();
    store.write(Dataset::CompustatAnnual, &mut sample(2)).unwrap();

    let back = store.read(Dataset::CompustatAnnual).unwrap();
    assert_eq!(back.height(), 2);

    // No temporary files left behind
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_read_missing_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().join("nested"), ExportFormat::Parquet);
    assert!(matches!(
        store.read(Dataset::Fred),
        Err(SnapshotError::NotFound(_))
    ));
}

#[test]
fn test_store_creates_directory() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().join("a").join("b"), ExportFormat::Csv);
    store.write(Dataset::FamaFrench, &mut sample(1)).unwrap();
    assert!(store.dir().join("FF_FACTORS.csv").is_file());
}

#[test]
fn test_report_written_to_disk() {
    let dir = TempDir::new().unwrap();
    let mut report = RunReport::new();
    report.record("pull", Dataset::CcmLink, 4, dir.path().join("ccm.parquet"));
    report.finish();

    let path = dir.path().join("reports").join("run.json");
    report.write(&path).unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("CcmLink"));
}
