//! Audit output.
//!
//! - [`TextReport`]: the console findings, optionally with a table over all groups
//! - [`AuditReport`]: the same results as JSON, printed with `--json` or
//!   written to `<output_dir>/<input_stem>_audit.json` with `--emit-report`
//!
//! # Example
//!
//! ```rust,ignore
//! use compas_audit::reporting::{ReportGenerator, ReportParams, TextReport};
//!
//! println!("{}", TextReport::render(&outcome.metrics));
//!
//! let report = ReportGenerator::build_report(ReportParams {
//!     input_file: "DocRedacted.xlsx",
//!     chart_file: None,
//!     filter_summary: &outcome.summary,
//!     metrics: &outcome.metrics,
//!     all_groups: &outcome.per_group,
//! });
//! ReportGenerator::new(PathBuf::from("output")).write_report_to_file(&report, "DocRedacted")?;
//! ```

mod generator;
mod text;

pub use generator::{AuditReport, ReportGenerator, ReportParams};
pub use text::{TextReport, ratio_multiplier};
