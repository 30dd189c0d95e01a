//! End-to-end tests: CSV upload through normalization, fit and forecast.

use std::io::Write;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use scrub_forecast::config::ModelConfig;
use scrub_forecast::csv_processor;
use scrub_forecast::engine::{AdditiveModel, ForecastEngine};
use scrub_forecast::normalize;
use scrub_forecast::pipeline;
use scrub_forecast::series::RawRecord;
use scrub_forecast::ErrorKind;

fn engine() -> ForecastEngine<AdditiveModel> {
    ForecastEngine::new(AdditiveModel::default())
}

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Hourly scrubbing export over `days` days, with a daily cycle and a slow
/// upward drift.
fn hourly_export(days: i64) -> String {
    let mut csv = String::from("host,timestamp,scrubbing,deep_scrubbing\n");
    for h in 0..days * 24 {
        let ts = start() + Duration::hours(h);
        let cycle = if (h % 24) < 6 { 12 } else { 3 };
        let count = cycle + h / 48;
        csv.push_str(&format!(
            "ceph-osd-{},{},{},0\n",
            h % 3,
            ts.format("%d-%m-%Y %H:%M:%S"),
            count
        ));
    }
    csv
}

#[test]
fn test_upload_from_file_forecasts_horizon() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(hourly_export(10).as_bytes()).unwrap();

    let rows = csv_processor::read_records_from_path(file.path()).unwrap();
    assert_eq!(rows.len(), 240);

    let output = pipeline::run(&rows, 5, &engine()).unwrap();
    assert_eq!(output.forecast.len(), 245);
    assert_eq!(output.forecast.components, vec!["daily".to_string()]);

    let last_history = start() + Duration::hours(239);
    let future: Vec<NaiveDateTime> = output.forecast.horizon().map(|r| r.ds).collect();
    let expected: Vec<NaiveDateTime> = (1..=5).map(|d| last_history + Duration::days(d)).collect();
    assert_eq!(future, expected);
}

#[test]
fn test_scenario_non_numeric_row_dropped() {
    let rows = vec![
        RawRecord::new("01/01/2024", "5"),
        RawRecord::new("02/01/2024", "7"),
        RawRecord::new("03/01/2024", "x"),
    ];
    assert_eq!(normalize::normalize(&rows).len(), 2);
}

#[test]
fn test_scenario_horizon_bounds() {
    let rows: Vec<RawRecord> = (1..=10)
        .map(|d| RawRecord::new(&format!("{:02}/01/2024", d), "4"))
        .collect();
    for days in [0, 31] {
        let err = pipeline::run(&rows, days, &engine()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHorizon);
    }
    assert!(pipeline::run(&rows, 1, &engine()).is_ok());
    assert!(pipeline::run(&rows, 30, &engine()).is_ok());
}

#[test]
fn test_scenario_empty_dataset() {
    let err = pipeline::run_upload("timestamp,scrubbing\n".as_bytes(), 7, &engine()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn test_scenario_missing_column() {
    let data = "time,scrubbing\n01/01/2024,5\n";
    let err = pipeline::run_upload(data.as_bytes(), 7, &engine()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn test_scenario_single_row() {
    let data = "timestamp,scrubbing\n01/01/2024,5\n";
    let err = pipeline::run_upload(data.as_bytes(), 7, &engine()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientData);
}

#[test]
fn test_configured_minimum_applies() {
    let strict = ForecastEngine::new(
        AdditiveModel::new(ModelConfig::default().with_min_distinct_points(5)).unwrap(),
    );
    let data = "timestamp,scrubbing\n01/01/2024,5\n02/01/2024,6\n03/01/2024,7\n";
    let err = pipeline::run_upload(data.as_bytes(), 7, &strict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientData);
    assert!(pipeline::run_upload(data.as_bytes(), 7, &engine()).is_ok());
}

#[test]
fn test_forecast_written_as_csv() {
    let output = pipeline::run_upload(hourly_export(3).as_bytes(), 2, &engine()).unwrap();
    let file = tempfile::NamedTempFile::new().unwrap();
    csv_processor::write_forecast(std::fs::File::create(file.path()).unwrap(), &output.forecast).unwrap();

    let mut reader = csv::Reader::from_path(file.path()).unwrap();
    let headers = reader.headers().unwrap().clone();
    for column in ["ds", "yhat", "yhat_lower", "yhat_upper", "trend", "daily", "is_forecast"] {
        assert!(headers.iter().any(|h| h == column), "missing column {}", column);
    }
    assert_eq!(reader.records().count(), output.forecast.len());
}

#[test]
fn test_run_is_deterministic_across_engines() {
    let data = hourly_export(5);
    let a = pipeline::run_upload(data.as_bytes(), 14, &engine()).unwrap();
    let b = pipeline::run_upload(data.as_bytes(), 14, &engine()).unwrap();
    assert_eq!(a.forecast, b.forecast);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_intervals_ordered_and_timeline_complete(
        values in proptest::collection::vec(0u32..500, 2..60),
        horizon in 1i64..=30,
    ) {
        let rows: Vec<RawRecord> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let ts = start() + Duration::days(i as i64);
                RawRecord::new(&ts.format("%d/%m/%Y").to_string(), &v.to_string())
            })
            .collect();

        let output = pipeline::run(&rows, horizon, &engine()).unwrap();
        prop_assert_eq!(output.forecast.len(), values.len() + horizon as usize);
        for row in &output.forecast.rows {
            prop_assert!(row.yhat_lower <= row.yhat && row.yhat <= row.yhat_upper);
        }
    }
}
