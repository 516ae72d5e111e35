//! Integration tests for the fairness audit.
//!
//! These tests run the audit end to end on a small COMPAS-shaped CSV and on
//! a workbook holding the same rows.

use compas_audit::{
    AuditConfig, AuditError, AuditPipeline, AuditReport, AuditStage, DatasetFilter,
    MetricsCalculator, ReportGenerator, ReportParams, TextReport, load_dataset,
    remediation_recommendations,
};
use polars::prelude::{DataFrame, DataType};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn sample_config() -> AuditConfig {
    AuditConfig::builder()
        .input_path(fixtures_path().join("compas_sample.csv"))
        .charts_enabled(false)
        .build()
        .unwrap()
}

// ============================================================================
// Loading and Filtering
// ============================================================================

#[test]
fn test_load_sample_csv() {
    let df = load_dataset(fixtures_path().join("compas_sample.csv")).unwrap();
    assert_eq!(df.height(), 15);
    assert_eq!(df.width(), 15);
}

#[test]
fn test_filter_summary_on_sample() {
    let config = sample_config();
    let df = load_dataset(&config.input_path).unwrap();

    let (clean, summary) = DatasetFilter::new(&config.filter, &config.groups)
        .apply(df)
        .unwrap();

    assert_eq!(summary.rows_before, 15);
    assert_eq!(summary.rows_after, 10);
    assert_eq!(summary.dropped_screening_window, 2);
    assert_eq!(summary.dropped_recid_sentinel, 1);
    assert_eq!(summary.dropped_charge_degree, 1);
    assert_eq!(summary.dropped_missing_score, 1);
    assert_eq!(summary.rows_dropped(), 5);
    assert_eq!(summary.group_a_rows, 5);
    assert_eq!(summary.group_b_rows, 4);

    // 13 analysis columns plus 4 derived indicators; id and name are gone
    assert_eq!(clean.width(), 17);
    assert!(clean.column("name").is_err());
}

#[test]
fn test_workbook_matches_csv() {
    let config = sample_config();
    let filter = DatasetFilter::new(&config.filter, &config.groups);

    let raw_csv = load_dataset(fixtures_path().join("compas_sample.csv")).unwrap();
    let raw_xlsx = load_dataset(fixtures_path().join("compas_sample.xlsx")).unwrap();
    assert_eq!(raw_xlsx.shape(), raw_csv.shape());

    // workbook numbers arrive as floats, dates as CSV-style text
    assert_eq!(raw_xlsx.column("is_recid").unwrap().dtype(), &DataType::Float64);
    assert_eq!(raw_xlsx.column("two_year_recid").unwrap().dtype(), &DataType::Float64);
    assert_eq!(raw_xlsx.column("c_jail_in").unwrap().dtype(), &DataType::String);
    let jail_in = |df: &DataFrame| {
        df.column("c_jail_in").unwrap().as_materialized_series().clone()
    };
    assert!(jail_in(&raw_xlsx).equals_missing(&jail_in(&raw_csv)));

    let (clean_csv, summary_csv) = filter.apply(raw_csv).unwrap();
    let (clean_xlsx, summary_xlsx) = filter.apply(raw_xlsx).unwrap();

    assert_eq!(summary_xlsx, summary_csv);
    assert_eq!(clean_xlsx.column("is_recid").unwrap().dtype(), &DataType::Int64);
    assert_eq!(clean_xlsx.column("two_year_recid").unwrap().dtype(), &DataType::Int64);
    assert!(clean_xlsx.equals_missing(&clean_csv));

    let calculator = MetricsCalculator::new(&config.groups);
    assert_eq!(
        calculator.calculate(&clean_xlsx).unwrap(),
        calculator.calculate(&clean_csv).unwrap()
    );
}

#[test]
fn test_full_audit_on_workbook() {
    let config = AuditConfig::builder()
        .input_path(fixtures_path().join("compas_sample.xlsx"))
        .charts_enabled(false)
        .build()
        .unwrap();

    let from_xlsx = AuditPipeline::new(config).run().unwrap();
    let from_csv = AuditPipeline::new(sample_config()).run().unwrap();

    assert_eq!(from_xlsx.summary.rows_after, 10);
    assert_eq!(from_xlsx.metrics, from_csv.metrics);
    assert_eq!(from_xlsx.per_group, from_csv.per_group);
}

// ============================================================================
// Full Pipeline
// ============================================================================

#[test]
fn test_full_audit_on_sample() {
    let outcome = AuditPipeline::new(sample_config()).run().unwrap();
    let m = &outcome.metrics;

    assert_eq!(m.group_a.counts.total, 5);
    assert_eq!(m.group_a.high_risk_rate, 0.6);
    assert_eq!(m.group_a.recid_rate, 0.4);
    assert!((m.group_a.false_positive_rate - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(m.group_a.false_negative_rate, 0.5);

    assert_eq!(m.group_b.counts.total, 4);
    assert_eq!(m.group_b.high_risk_rate, 0.25);
    assert_eq!(m.group_b.recid_rate, 0.5);
    assert_eq!(m.group_b.false_positive_rate, 0.0);
    assert_eq!(m.group_b.false_negative_rate, 0.5);

    assert!((m.disparate_impact - 2.4).abs() < 1e-12);
    assert!(m.passes_four_fifths_rule());

    let labels: Vec<&str> = outcome.per_group.keys().map(String::as_str).collect();
    assert_eq!(labels, vec!["African-American", "Caucasian", "Hispanic"]);
    assert!(outcome.chart_path.is_none());
}

#[test]
fn test_metrics_are_deterministic() {
    let config = sample_config();
    let first = AuditPipeline::new(config.clone()).run().unwrap();
    let second = AuditPipeline::new(config).run().unwrap();
    assert_eq!(first.metrics, second.metrics);
}

#[test]
fn test_filter_is_idempotent_on_sample() {
    let config = sample_config();
    let df = load_dataset(&config.input_path).unwrap();
    let filter = DatasetFilter::new(&config.filter, &config.groups);

    let (once, _) = filter.apply(df).unwrap();
    let (twice, summary) = filter.apply(once.clone()).unwrap();

    assert_eq!(summary.rows_dropped(), 0);
    assert!(once.equals_missing(&twice));
}

#[test]
fn test_alternate_group_comparison() {
    let config = AuditConfig::builder()
        .input_path(fixtures_path().join("compas_sample.csv"))
        .group_a_label("Hispanic")
        .charts_enabled(false)
        .build()
        .unwrap();

    let outcome = AuditPipeline::new(config).run().unwrap();
    assert_eq!(outcome.metrics.group_a.label, "Hispanic");
    assert_eq!(outcome.metrics.group_a.counts.total, 1);
    assert_eq!(outcome.metrics.group_a.high_risk_rate, 1.0);
    assert!((outcome.metrics.disparate_impact - 4.0).abs() < 1e-12);
}

#[test]
fn test_label_override_renames_flat_metrics() {
    let config = AuditConfig::builder()
        .input_path(fixtures_path().join("compas_sample.csv"))
        .group_a_label("Hispanic")
        .charts_enabled(false)
        .build()
        .unwrap();

    let map = AuditPipeline::new(config).run().unwrap().metrics.to_map();
    assert_eq!(map["hispanic_high_risk_rate"], 1.0);
    assert_eq!(map["cauc_high_risk_rate"], 0.25);
    assert!(!map.contains_key("aa_high_risk_rate"));
}

#[test]
fn test_explicit_group_key() {
    let config = AuditConfig::builder()
        .input_path(fixtures_path().join("compas_sample.csv"))
        .group_b_label("Hispanic")
        .group_b_key("hisp")
        .charts_enabled(false)
        .build()
        .unwrap();

    let map = AuditPipeline::new(config).run().unwrap().metrics.to_map();
    assert_eq!(map["hisp_high_risk_rate"], 1.0);
    assert_eq!(map["aa_high_risk_rate"], 0.6);
}

#[test]
fn test_findings_available_before_charts() {
    let dir = tempfile::tempdir().unwrap();
    let config = AuditConfig::builder()
        .input_path(fixtures_path().join("compas_sample.csv"))
        .output_dir(dir.path())
        .build()
        .unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let pipeline =
        AuditPipeline::new(config).on_progress(move |update| sink.lock().unwrap().push(update.stage));

    let analysed = pipeline.analyze().unwrap();
    let text = TextReport::render(&analysed.metrics);
    assert!(text.contains("2.400"));
    assert!(!seen.lock().unwrap().contains(&AuditStage::Charts));

    let outcome = pipeline.finish(analysed);
    assert_eq!(outcome.metrics.group_a.counts.total, 5);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            AuditStage::Loading,
            AuditStage::Filtering,
            AuditStage::Metrics,
            AuditStage::Charts,
            AuditStage::Complete
        ]
    );
}

#[test]
fn test_progress_reports_every_stage() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    AuditPipeline::new(sample_config())
        .on_progress(move |update| sink.lock().unwrap().push(update.stage))
        .run()
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            AuditStage::Loading,
            AuditStage::Filtering,
            AuditStage::Metrics,
            AuditStage::Complete
        ]
    );
}

#[test]
fn test_chart_failure_does_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let config = AuditConfig::builder()
        .input_path(fixtures_path().join("compas_sample.csv"))
        .output_dir(dir.path())
        .build()
        .unwrap();

    let outcome = AuditPipeline::new(config).run().unwrap();

    // Headless environments may lack fonts; either way the metrics are produced.
    if let Some(path) = &outcome.chart_path {
        assert!(path.exists());
    }
    assert_eq!(outcome.metrics.group_a.counts.total, 5);
}

// ============================================================================
// Error Handling
// ============================================================================

#[test]
fn test_missing_input_is_load_failure() {
    let config = AuditConfig::builder()
        .input_path(fixtures_path().join("missing.xlsx"))
        .build()
        .unwrap();

    let err = AuditPipeline::new(config).run().unwrap_err();
    assert!(matches!(err, AuditError::InputNotFound(_)));
    assert!(err.is_load_failure());
    assert_eq!(err.error_code(), "INPUT_NOT_FOUND");
}

#[test]
fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("compas.parquet");
    std::fs::write(&path, b"not a table").unwrap();

    let err = load_dataset(&path).unwrap_err();
    assert!(matches!(err, AuditError::UnsupportedFormat { .. }));
    assert!(err.is_load_failure());
}

#[test]
fn test_unreadable_inputs_are_load_failures() {
    let dir = tempfile::tempdir().unwrap();

    let not_utf8 = dir.path().join("latin1.csv");
    std::fs::write(&not_utf8, b"race,score_text\nCaucasian,\xe9\xff\n").unwrap();
    let directory = dir.path().join("x.csv");
    std::fs::create_dir(&directory).unwrap();

    for path in [not_utf8, directory] {
        let config = AuditConfig::builder()
            .input_path(&path)
            .charts_enabled(false)
            .build()
            .unwrap();
        let err = AuditPipeline::new(config).run().unwrap_err();
        assert!(err.is_load_failure(), "{} gave {:?}", path.display(), err);
        assert_eq!(err.error_code(), "LOAD_FAILED");

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "LOAD_FAILED");
    }
}

#[test]
fn test_config_from_json_file() {
    let json = r#"{
        "groups": { "group_b": { "label": "Hispanic", "key": "hisp" } },
        "charts": { "enabled": false }
    }"#;
    let mut config: AuditConfig = serde_json::from_str(json).unwrap();
    config.input_path = fixtures_path().join("compas_sample.csv");
    config.validate().unwrap();

    let outcome = AuditPipeline::new(config).run().unwrap();
    let map = outcome.metrics.to_map();
    assert_eq!(map["hisp_high_risk_rate"], 1.0);
    assert_eq!(map["aa_high_risk_rate"], 0.6);
}

// ============================================================================
// Reporting
// ============================================================================

#[test]
fn test_text_report_on_sample() {
    let outcome = AuditPipeline::new(sample_config()).run().unwrap();
    let text = TextReport::new(&outcome.metrics)
        .with_all_groups(&outcome.per_group)
        .to_string();

    assert!(text.contains("60.00%"));
    assert!(text.contains("35.00 percentage points"));
    // group B has no false positives
    assert!(text.contains("African-American defendants are n/a more likely to be false positives"));
    assert!(text.contains("Caucasian defendants are 1.00x more likely to be false negatives"));
    assert!(text.contains("2.400"));
    assert!(text.contains("Passes 80% rule"));
    assert!(text.contains("Hispanic"));
}

#[test]
fn test_emit_report_file() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = AuditPipeline::new(sample_config()).run().unwrap();

    let report = ReportGenerator::build_report(ReportParams {
        input_file: "compas_sample.csv",
        chart_file: None,
        filter_summary: &outcome.summary,
        metrics: &outcome.metrics,
        all_groups: &outcome.per_group,
    });
    let path = ReportGenerator::new(dir.path().to_path_buf())
        .write_report_to_file(&report, "compas_sample")
        .unwrap();

    assert_eq!(path, dir.path().join("compas_sample_audit.json"));
    let parsed: AuditReport =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed.metrics, outcome.metrics);
    assert_eq!(parsed.filter_summary.rows_after, 10);
    assert_eq!(parsed.metric_values.len(), 9);
    assert!(parsed.passes_four_fifths_rule);
    assert_eq!(parsed.all_groups.len(), 3);
}

#[test]
fn test_recommendations_are_static() {
    let text = remediation_recommendations();
    assert!(text.starts_with("REMEDIATION RECOMMENDATIONS:"));
    assert!(text.contains("5. POLICY REFORMS:"));
}

#[test]
fn test_calculator_ignores_unrelated_groups() {
    let config = sample_config();
    let df = load_dataset(&config.input_path).unwrap();
    let (clean, _) = DatasetFilter::new(&config.filter, &config.groups)
        .apply(df)
        .unwrap();

    let report = MetricsCalculator::new(&config.groups).calculate(&clean).unwrap();
    assert_eq!(
        report.group_a.counts.total + report.group_b.counts.total,
        clean.height() - 1
    );
}
