use crate::error::Result;
use crate::metrics::{GroupMetrics, MetricsReport};
use crate::types::FilterSummary;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

// ============================================================================
// Audit Report Types
// ============================================================================

/// Machine-readable audit report.
///
/// Used for both JSON output (`--json`) and file writing (`--emit-report`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    // Metadata
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Path to the chart image (if written)
    pub chart_file: Option<String>,

    /// Row counts from the filter step
    pub filter_summary: FilterSummary,

    /// Two-group comparison
    pub metrics: MetricsReport,
    /// Flat `metric name -> value` view of `metrics`
    pub metric_values: BTreeMap<String, f64>,
    /// Whether disparate impact reaches 0.8
    pub passes_four_fifths_rule: bool,

    /// Same rates for every label of the group column
    pub all_groups: BTreeMap<String, GroupMetrics>,
}

/// Everything needed to assemble an [`AuditReport`].
pub struct ReportParams<'a> {
    pub input_file: &'a str,
    pub chart_file: Option<&'a str>,
    pub filter_summary: &'a FilterSummary,
    pub metrics: &'a MetricsReport,
    pub all_groups: &'a BTreeMap<String, GroupMetrics>,
}

/// Builds and persists audit reports.
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Assemble the report, stamping it with the local time.
    pub fn build_report(params: ReportParams<'_>) -> AuditReport {
        AuditReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: params.input_file.to_string(),
            chart_file: params.chart_file.map(str::to_string),
            filter_summary: params.filter_summary.clone(),
            metrics: params.metrics.clone(),
            metric_values: params.metrics.to_map(),
            passes_four_fifths_rule: params.metrics.passes_four_fifths_rule(),
            all_groups: params.all_groups.clone(),
        }
    }

    /// Write the report as pretty JSON to `<output_dir>/<base_name>_audit.json`.
    pub fn write_report_to_file(&self, report: &AuditReport, base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.output_dir.join(format!("{}_audit.json", base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}
