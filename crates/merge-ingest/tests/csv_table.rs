//! File-based tests for CSV reading and writing.

use std::fs;

use merge_ingest::{CsvOptions, IngestError, read_csv_table, write_csv_table};
use merge_model::{Table, TableRole};

#[test]
fn reads_file_with_bom_and_custom_headers() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("tubular.csv");
    fs::write(&path, "\u{feff}Channel ID,Views (30d)\nUC1,500\nUC2,\n").expect("write file");

    let table = read_csv_table(&path, TableRole::Metrics, CsvOptions::default()).expect("read csv");
    assert_eq!(table.role, TableRole::Metrics);
    assert_eq!(table.headers, vec!["Channel ID", "Views (30d)"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1], vec!["UC2", ""]);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent.csv");
    let err = read_csv_table(&path, TableRole::Primary, CsvOptions::default())
        .expect_err("missing file");
    assert!(matches!(err, IngestError::FileNotFound { .. }));
    assert!(err.to_string().contains("absent.csv"));
}

#[test]
fn written_file_reads_back() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("merged.csv");
    let table = Table::new(
        TableRole::Primary,
        vec!["Account.Name".to_string(), "views_30d".to_string()],
        vec![
            vec!["Acme".to_string(), "500".to_string()],
            vec!["Quote \"Co\"".to_string(), String::new()],
        ],
    );
    write_csv_table(&path, &table, CsvOptions::default()).expect("write csv");

    let read = read_csv_table(&path, TableRole::Primary, CsvOptions::default()).expect("read csv");
    assert_eq!(read.headers, table.headers);
    assert_eq!(read.rows, table.rows);
}

#[test]
fn write_overwrites_existing_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("merged.csv");
    fs::write(&path, "stale\n").expect("write stale");
    let table = Table::empty(TableRole::Primary, vec!["a".to_string()]);
    write_csv_table(&path, &table, CsvOptions::default()).expect("write csv");
    assert_eq!(fs::read_to_string(&path).expect("read back"), "a\n");
}

#[test]
fn failed_write_leaves_no_output() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("missing-dir").join("merged.csv");
    let table = Table::empty(TableRole::Primary, vec!["a".to_string()]);
    let err = write_csv_table(&path, &table, CsvOptions::default()).expect_err("no dir");
    assert!(matches!(err, IngestError::Io { .. }));
    assert!(!path.exists());
}
