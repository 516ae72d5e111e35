//! COMPAS Fairness Audit Library
//!
//! Measures whether the COMPAS recidivism risk scores treat two racial groups
//! differently, following the ProPublica analysis.
//!
//! # Overview
//!
//! - **Loading**: spreadsheet (`calamine`) or CSV (polars) input into a [`DataFrame`](polars::prelude::DataFrame)
//! - **Filtering**: ProPublica validity predicates, column projection, derived indicators
//! - **Metrics**: high-risk rate, recidivism rate, FPR, FNR and disparate impact per group
//! - **Reporting**: console findings, a JSON report and a six-panel PNG chart
//! - **Recommendations**: fixed remediation guidance
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use compas_audit::{AuditConfig, AuditPipeline, TextReport, remediation_recommendations};
//!
//! let config = AuditConfig::builder()
//!     .input_path("DocRedacted.xlsx")
//!     .output_dir("output")
//!     .build()?;
//!
//! let outcome = AuditPipeline::new(config).run()?;
//!
//! println!("{}", TextReport::render(&outcome.metrics));
//! println!("{}", remediation_recommendations());
//! ```
//!
//! # Configuration
//!
//! Use [`AuditConfig`] to change the compared groups, the screening window or
//! the chart output:
//!
//! ```rust,ignore
//! use compas_audit::config::*;
//!
//! let config = AuditConfig::builder()
//!     .screening_window(-30.0, 30.0)
//!     .group_a(GroupSpec::new("Hispanic", "hisp"))
//!     .high_risk_categories(["High"])
//!     .charts_enabled(false)
//!     .build()?;
//! ```

pub mod charts;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod pipeline;
pub mod recommendations;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use charts::{ChartData, GroupChartData, render_charts};
pub use config::{
    AuditConfig, AuditConfigBuilder, ChartConfig, ConfigValidationError, FilterConfig,
    GroupConfig, GroupSpec,
};
pub use error::{AuditError, Result as AuditResult, ResultExt};
pub use filter::DatasetFilter;
pub use loader::{InputFormat, load_dataset};
pub use metrics::{
    FOUR_FIFTHS_THRESHOLD, GroupCounts, GroupMetrics, MetricsCalculator, MetricsReport,
};
pub use pipeline::{
    AuditOutcome, AuditPipeline, AuditStage, ClosureProgressReporter, ProgressReporter,
    ProgressUpdate,
};
pub use recommendations::remediation_recommendations;
pub use reporting::{AuditReport, ReportGenerator, ReportParams, TextReport};
pub use types::FilterSummary;
