//! CSV bar provider against real files on disk.

use chrono::NaiveDate;
use std::fs;

use stagelab_core::data::{DataError, DataProvider, TimestampKind};
use stagelab_runner::CsvBarProvider;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn write_csv(dir: &std::path::Path, symbol: &str, body: &str) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    content.push_str(body);
    fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}

#[test]
fn reads_naive_dated_file() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(
        dir.path(),
        "AAPL",
        "2023-01-03,130.28,130.90,124.17,125.07,112117500\n\
         2023-01-04,126.89,128.66,125.08,126.36,89113600\n",
    );

    let provider = CsvBarProvider::new(dir.path());
    let series = provider
        .fetch("AAPL", date("2023-01-01"), date("2023-12-31"))
        .unwrap();
    assert_eq!(series.timestamps, TimestampKind::Naive);
    assert_eq!(series.bars.len(), 2);
    assert_eq!(series.bars[0].date, date("2023-01-03"));
    assert_eq!(series.bars[0].close, 125.07);
    assert_eq!(series.bars[1].volume, 89_113_600);
}

#[test]
fn reads_rfc3339_dated_file_as_utc() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(
        dir.path(),
        "DAX",
        "2023-01-03T00:00:00+00:00,100.0,101.0,99.0,100.5,500000\n",
    );

    let provider = CsvBarProvider::new(dir.path());
    let series = provider
        .fetch("DAX", date("2023-01-01"), date("2023-12-31"))
        .unwrap();
    assert_eq!(series.timestamps, TimestampKind::Utc);
    assert_eq!(series.bars[0].date, date("2023-01-03"));
}

#[test]
fn range_filter_applies() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(
        dir.path(),
        "AAPL",
        "2023-01-03,1,2,0.5,1.5,100\n\
         2023-06-01,1,2,0.5,1.5,100\n\
         2023-12-01,1,2,0.5,1.5,100\n",
    );

    let provider = CsvBarProvider::new(dir.path());
    let series = provider
        .fetch("AAPL", date("2023-05-01"), date("2023-07-01"))
        .unwrap();
    assert_eq!(series.bars.len(), 1);
    assert_eq!(series.bars[0].date, date("2023-06-01"));
}

#[test]
fn missing_file_is_symbol_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let provider = CsvBarProvider::new(dir.path());
    let err = provider
        .fetch("GHOST", date("2023-01-01"), date("2023-12-31"))
        .unwrap_err();
    assert!(matches!(err, DataError::SymbolNotFound { .. }));
}

#[test]
fn mixed_date_styles_within_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(
        dir.path(),
        "MIXED",
        "2023-01-03,1,2,0.5,1.5,100\n\
         2023-01-04T00:00:00+00:00,1,2,0.5,1.5,100\n",
    );

    let provider = CsvBarProvider::new(dir.path());
    let err = provider
        .fetch("MIXED", date("2023-01-01"), date("2023-12-31"))
        .unwrap_err();
    assert!(matches!(err, DataError::Malformed { .. }));
}

#[test]
fn garbage_numbers_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "BAD", "2023-01-03,abc,2,0.5,1.5,100\n");

    let provider = CsvBarProvider::new(dir.path());
    let err = provider
        .fetch("BAD", date("2023-01-01"), date("2023-12-31"))
        .unwrap_err();
    match err {
        DataError::Malformed { reason, .. } => assert!(reason.contains("bad number")),
        other => panic!("expected Malformed, got {other:?}"),
    }
}

#[test]
fn empty_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "EMPTY", "");

    let provider = CsvBarProvider::new(dir.path());
    let err = provider
        .fetch("EMPTY", date("2023-01-01"), date("2023-12-31"))
        .unwrap_err();
    assert!(matches!(err, DataError::Malformed { .. }));
}
