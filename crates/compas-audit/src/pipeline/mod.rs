//! The audit pipeline: load, filter, calculate, chart.

pub mod progress;

pub use progress::{AuditStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate};

use crate::charts::{ChartData, render_charts};
use crate::config::AuditConfig;
use crate::error::Result;
use crate::filter::DatasetFilter;
use crate::loader::load_dataset;
use crate::metrics::{GroupMetrics, MetricsCalculator, MetricsReport};
use crate::types::FilterSummary;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a single audit run produces.
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    /// Filtered, projected dataset with derived indicator columns
    pub clean: DataFrame,
    pub summary: FilterSummary,
    pub metrics: MetricsReport,
    /// Rates for every label of the group column
    pub per_group: BTreeMap<String, GroupMetrics>,
    /// Set when the chart image was written
    pub chart_path: Option<PathBuf>,
}

/// Runs the audit for one configuration.
pub struct AuditPipeline {
    config: AuditConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl AuditPipeline {
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config,
            progress_reporter: None,
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Attach a reporter that receives every stage transition.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Receive stage transitions through a closure.
    pub fn on_progress<F>(self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter(Arc::new(ClosureProgressReporter::new(callback)))
    }

    fn report_progress(&self, stage: AuditStage, message: impl Into<String>) {
        let message = message.into();
        info!("[{}] {}", stage.display_name(), message);
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(ProgressUpdate::new(stage, message));
        }
    }

    /// Load the configured input and run the audit on it, charts included.
    ///
    /// A load failure is returned as is; callers can tell it apart with
    /// [`AuditError::is_load_failure`](crate::AuditError::is_load_failure).
    pub fn run(&self) -> Result<AuditOutcome> {
        let outcome = self.analyze()?;
        Ok(self.finish(outcome))
    }

    /// Run the audit on an already loaded frame, charts included.
    pub fn run_on_frame(&self, df: DataFrame) -> Result<AuditOutcome> {
        let outcome = self.analyze_frame(df)?;
        Ok(self.finish(outcome))
    }

    /// Load, filter and compute metrics without drawing charts.
    ///
    /// Lets a caller show the findings before [`draw_charts`](Self::draw_charts)
    /// runs. The returned outcome has no `chart_path`.
    pub fn analyze(&self) -> Result<AuditOutcome> {
        self.config.validate()?;

        let input = &self.config.input_path;
        self.report_progress(AuditStage::Loading, format!("Reading {}", input.display()));
        let df = load_dataset(input)?;

        self.analyze_frame(df)
    }

    /// Filter and compute metrics on an already loaded frame.
    pub fn analyze_frame(&self, df: DataFrame) -> Result<AuditOutcome> {
        self.config.validate()?;
        let groups = &self.config.groups;

        self.report_progress(
            AuditStage::Filtering,
            format!("Filtering {} rows", df.height()),
        );
        let (clean, summary) = DatasetFilter::new(&self.config.filter, groups).apply(df)?;
        info!(
            "Clean dataset: {} rows ({}: {}, {}: {})",
            summary.rows_after,
            groups.group_a.label,
            summary.group_a_rows,
            groups.group_b.label,
            summary.group_b_rows
        );

        self.report_progress(
            AuditStage::Metrics,
            format!("Comparing {} and {}", groups.group_a.label, groups.group_b.label),
        );
        let calculator = MetricsCalculator::new(groups);
        let metrics = calculator.calculate(&clean)?;
        let per_group = calculator.per_group(&clean)?;

        Ok(AuditOutcome {
            clean,
            summary,
            metrics,
            per_group,
            chart_path: None,
        })
    }

    /// Render the chart image for an analysed outcome.
    ///
    /// Returns `None` when charts are disabled or rendering failed; a
    /// failure is logged and never aborts the audit.
    pub fn draw_charts(&self, outcome: &AuditOutcome) -> Option<PathBuf> {
        if !self.config.charts.enabled {
            return None;
        }

        let path = self.config.chart_path();
        self.report_progress(AuditStage::Charts, format!("Rendering {}", path.display()));
        match self.write_charts(&outcome.clean, &outcome.metrics, &path) {
            Ok(()) => {
                info!("Visualization saved as '{}'", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Chart rendering failed: {}", e);
                None
            }
        }
    }

    /// Draw the charts and report completion.
    pub fn finish(&self, mut outcome: AuditOutcome) -> AuditOutcome {
        outcome.chart_path = self.draw_charts(&outcome);
        self.report_progress(AuditStage::Complete, "Analysis complete");
        outcome
    }

    fn write_charts(&self, clean: &DataFrame, metrics: &MetricsReport, path: &std::path::Path) -> Result<()> {
        let data = ChartData::from_frame(clean, &self.config.groups)?;
        render_charts(path, &data, metrics, &self.config.charts)
    }
}
