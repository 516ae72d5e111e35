//! Stage reporting for the audit pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use compas_audit::{AuditConfig, AuditPipeline};
//!
//! let outcome = AuditPipeline::new(AuditConfig::default())
//!     .on_progress(|update| {
//!         println!("{}. {}...", update.stage.step(), update.stage.display_name());
//!     })
//!     .run()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the audit, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStage {
    /// Reading the input file
    Loading,
    /// Dropping invalid rows and deriving indicators
    Filtering,
    /// Computing group rates
    Metrics,
    /// Rendering the chart image
    Charts,
    /// Audit finished
    Complete,
}

impl AuditStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading dataset",
            Self::Filtering => "Preprocessing data",
            Self::Metrics => "Calculating fairness metrics",
            Self::Charts => "Generating visualizations",
            Self::Complete => "Complete",
        }
    }

    /// One-based position of the stage in the run.
    pub fn step(&self) -> usize {
        match self {
            Self::Loading => 1,
            Self::Filtering => 2,
            Self::Metrics => 3,
            Self::Charts => 4,
            Self::Complete => 5,
        }
    }
}

/// A stage transition with a short message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: AuditStage,
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: AuditStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Receives stage updates while the audit runs.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}
