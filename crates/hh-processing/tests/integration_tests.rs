//! Integration tests for the HH preprocessing pipeline.
//!
//! These tests run the full chain over small CSV fixtures shaped like the
//! real HH export.

use hh_processing::output::{X_FILE, Y_FILE, save_arrays};
use hh_processing::{
    DataError, DataErrorKind, FeatureMatrix, Pipeline, PipelineConfig, ProgressUpdate, StageStatus,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(filename: &str) -> PathBuf {
    fixtures_path().join(filename)
}

fn default_pipeline() -> Pipeline {
    Pipeline::builder()
        .build()
        .expect("default configuration is valid")
}

fn run_sample() -> (FeatureMatrix, Vec<f64>) {
    default_pipeline()
        .run(fixture("hh_sample.csv"))
        .expect("sample fixture should process")
}

fn column(matrix: &FeatureMatrix, name: &str) -> Vec<f64> {
    let idx = matrix
        .column_index(name)
        .unwrap_or_else(|| panic!("missing feature column '{name}'"));
    (0..matrix.nrows())
        .map(|row| matrix.get(row, idx).unwrap())
        .collect()
}

fn columns_with_prefix<'a>(matrix: &'a FeatureMatrix, prefix: &str) -> Vec<&'a str> {
    matrix
        .column_names()
        .iter()
        .filter(|name| name.starts_with(prefix))
        .map(String::as_str)
        .collect()
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_missing_salary_row_is_dropped() {
    let (x, y) = run_sample();

    assert_eq!(x.nrows(), 4);
    assert_eq!(y.len(), 4);
}

#[test]
fn test_targets_match_hand_computed_values() {
    let (_, y) = run_sample();

    // 60000 руб. | 50000-70000 руб. | 1 000 USD at 90 | 80000
    assert_eq!(y, vec![60000.0, 60000.0, 90000.0, 80000.0]);
}

#[test]
fn test_no_missing_values_in_output() {
    let (x, y) = run_sample();

    assert!(x.as_slice().iter().all(|v| v.is_finite()));
    assert!(y.iter().all(|v| v.is_finite()));
}

#[test]
fn test_runs_are_bit_identical() {
    let (x1, y1) = run_sample();
    let (x2, y2) = run_sample();

    assert_eq!(x1.column_names(), x2.column_names());
    let bits = |values: &[f64]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(x1.as_slice()), bits(x2.as_slice()));
    assert_eq!(bits(&y1), bits(&y2));
}

#[test]
fn test_numeric_features_lead_in_registration_order() {
    let (x, _) = run_sample();

    assert_eq!(
        &x.column_names()[..6],
        &[
            "relocate_ready",
            "trips_ready",
            "age",
            "experience_years",
            "education_year",
            "has_car",
        ]
    );
}

#[test]
fn test_numeric_features_values() {
    let (x, _) = run_sample();

    assert_eq!(column(&x, "age"), vec![42.0, 23.0, 28.0, 35.0]);
    assert_eq!(column(&x, "relocate_ready"), vec![0.0, 1.0, 1.0, 0.0]);
    assert_eq!(column(&x, "trips_ready"), vec![1.0, 0.0, 1.0, 0.0]);
    assert_eq!(column(&x, "has_car"), vec![1.0, 0.0, 0.0, 1.0]);
    assert_eq!(column(&x, "education_year"), vec![2000.0, 2018.0, 2013.0, 2005.0]);

    let experience = column(&x, "experience_years");
    assert!((experience[0] - (16.0 + 10.0 / 12.0)).abs() < 1e-9);
    assert!((experience[1] - 2.25).abs() < 1e-9);
    assert_eq!(experience[3], 10.0);
}

#[test]
fn test_one_hot_rows_sum_to_one() {
    let (x, _) = run_sample();

    let education = columns_with_prefix(&x, "education_level=");
    assert_eq!(
        education,
        vec![
            "education_level=Высшее",
            "education_level=Неоконченное высшее",
            "education_level=Среднее специальное",
        ]
    );

    for row in 0..x.nrows() {
        let sum: f64 = education
            .iter()
            .map(|name| x.get(row, x.column_index(name).unwrap()).unwrap())
            .sum();
        assert_eq!(sum, 1.0, "row {row}");
    }
}

#[test]
fn test_city_aliases_share_one_indicator() {
    let (x, _) = run_sample();

    assert_eq!(
        columns_with_prefix(&x, "city="),
        vec!["city=москва", "city=санкт-петербург"]
    );
    assert_eq!(column(&x, "city=москва"), vec![1.0, 0.0, 1.0, 1.0]);
}

#[test]
fn test_multi_label_indicators() {
    let (x, _) = run_sample();

    assert_eq!(
        column(&x, "employment=частичная занятость"),
        vec![0.0, 1.0, 1.0, 0.0]
    );
    assert_eq!(
        column(&x, "employment=полная занятость"),
        vec![1.0, 1.0, 0.0, 1.0]
    );
    assert_eq!(columns_with_prefix(&x, "schedule=").len(), 3);
}

#[test]
fn test_raw_text_columns_never_reach_matrix() {
    let (x, _) = run_sample();

    for name in x.column_names() {
        assert!(
            !name.contains("Unnamed") && !name.contains("ЗП") && !name.contains("должность"),
            "unexpected column {name}"
        );
    }
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_missing_salary_column_is_schema_error() {
    let err = default_pipeline()
        .run(fixture("hh_no_salary.csv"))
        .unwrap_err();

    assert_eq!(err.kind(), DataErrorKind::SchemaError);
    assert!(matches!(err, DataError::ColumnNotFound(ref name) if name == "ЗП"));
}

#[test]
fn test_missing_file_is_io_failure() {
    let err = default_pipeline()
        .run(fixture("does_not_exist.csv"))
        .unwrap_err();

    assert_eq!(err.kind(), DataErrorKind::IoFailure);
}

#[test]
fn test_truncated_row_is_io_failure() {
    let err = default_pipeline()
        .run(fixture("hh_truncated.csv"))
        .unwrap_err();

    assert_eq!(err.kind(), DataErrorKind::IoFailure);
    assert!(err.to_string().contains("line 3"));
}

#[test]
fn test_wrong_delimiter_is_io_failure() {
    let err = default_pipeline()
        .run(fixture("hh_semicolon.csv"))
        .unwrap_err();

    assert_eq!(err.kind(), DataErrorKind::IoFailure);
    assert!(matches!(err, DataError::Malformed { .. }));
}

#[test]
fn test_all_rows_dropped_gives_empty_arrays() {
    let output = default_pipeline()
        .run_detailed(fixture("hh_only_negotiable.csv"))
        .unwrap();

    assert_eq!(output.features.nrows(), 0);
    assert!(output.target.is_empty());
    assert_eq!(output.diagnostics.rows_dropped, 2);
    assert_eq!(
        output.diagnostics.dropped_salary_examples,
        vec!["по договорённости".to_string()]
    );
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_custom_exchange_rate_changes_target() {
    let mut fx = hh_processing::FxRates::default();
    fx.rates.insert("USD".to_string(), 100.0);
    let config = PipelineConfig::builder().fx_rates(fx).build().unwrap();

    let (_, y) = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run(fixture("hh_sample.csv"))
        .unwrap();

    assert_eq!(y[2], 100000.0);
}

#[test]
fn test_configured_separator() {
    let config = PipelineConfig::builder().separator(';').build().unwrap();

    let (x, y) = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run(fixture("hh_semicolon.csv"))
        .unwrap();

    assert_eq!(y, vec![50000.0, 60000.0]);
    assert_eq!(
        columns_with_prefix(&x, "city="),
        vec!["city=казань", "city=москва"]
    );
}

#[test]
fn test_empty_categorical_list_keeps_only_numeric_and_multi_label() {
    let config = PipelineConfig::builder()
        .categorical_columns(Vec::<String>::new())
        .build()
        .unwrap();

    let (x, _) = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run(fixture("hh_sample.csv"))
        .unwrap();

    assert!(columns_with_prefix(&x, "city=").is_empty());
    assert!(x.column_index("age").is_some());
}

// ============================================================================
// Progress and diagnostics
// ============================================================================

#[test]
fn test_progress_updates_cover_chain() {
    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();

    Pipeline::builder()
        .on_progress(move |update| sink.lock().unwrap().push(update))
        .build()
        .unwrap()
        .run(fixture("hh_sample.csv"))
        .unwrap();

    let updates = updates.lock().unwrap();
    let last = updates.last().unwrap();
    assert_eq!(last.stage, "assembler");
    assert_eq!(last.status, StageStatus::Finished);
    assert_eq!(last.fraction(), 1.0);

    let row_cleaner = updates
        .iter()
        .find(|u| u.stage == "row_cleaner" && u.status == StageStatus::Finished)
        .unwrap();
    assert!(row_cleaner.message.contains("4 rows"));
}

#[test]
fn test_diagnostics() {
    let output = default_pipeline()
        .run_detailed(fixture("hh_sample.csv"))
        .unwrap();
    let d = &output.diagnostics;

    assert_eq!(d.rows_loaded, 5);
    assert_eq!(d.rows_dropped, 1);
    assert_eq!(d.currency_counts.get("RUB"), Some(&3));
    assert_eq!(d.currency_counts.get("USD"), Some(&1));
    assert_eq!(d.fx_rates_source.as_deref(), Some("builtin"));
    assert!(d.columns_dropped.contains(&"Unnamed: 0".to_string()));

    let json = serde_json::to_value(output.summary()).unwrap();
    assert_eq!(json["rows"], 4);
    assert_eq!(json["diagnostics"]["rows_dropped"], 1);
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_saved_arrays_have_expected_sizes() {
    let (x, y) = run_sample();
    let dir = tempfile::tempdir().unwrap();

    let (x_path, y_path) = save_arrays(dir.path(), &x, &y).unwrap();

    assert_eq!(x_path.file_name().unwrap(), X_FILE);
    assert_eq!(y_path.file_name().unwrap(), Y_FILE);

    let x_bytes = std::fs::read(&x_path).unwrap();
    let y_bytes = std::fs::read(&y_path).unwrap();
    assert!(x_bytes.starts_with(b"\x93NUMPY"));
    assert_eq!(y_bytes.len() % 8, 0);
    assert!(x_bytes.len() >= x.nrows() * x.ncols() * 8);
    assert!(y_bytes.ends_with(&80000.0f64.to_le_bytes()));
}
