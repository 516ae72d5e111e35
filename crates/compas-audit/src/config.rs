//! Configuration types for the fairness audit.
//!
//! This module provides configuration options using the builder pattern.
//! Defaults reproduce the ProPublica COMPAS analysis: a 30-day screening
//! window, African-American vs Caucasian, and "High"/"Medium" as high risk.

use crate::types::ANALYSIS_COLUMNS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default spreadsheet looked up when no input is given.
pub const DEFAULT_INPUT_FILE: &str = "DocRedacted.xlsx";

/// Default chart file name.
pub const DEFAULT_CHART_FILE: &str = "compas_bias_analysis.png";

/// One side of the two-group comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Value of the group column identifying this group.
    pub label: String,
    /// Short prefix used for flat metric names (e.g. "aa" gives "aa_fpr").
    pub key: String,
}

impl GroupSpec {
    pub fn new(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
        }
    }

    /// Group whose metric key is derived from its label, so "Hispanic"
    /// gives "hispanic" and "Native American" gives "native_american".
    pub fn from_label(label: impl Into<String>) -> Self {
        let label = label.into();
        let key = key_from_label(&label);
        Self { label, key }
    }
}

/// Lowercase the label and join its alphanumeric runs with `_`.
pub fn key_from_label(label: &str) -> String {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Which groups are compared and what counts as a high-risk prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Column holding the group label.
    /// Default: "race"
    pub group_column: String,

    /// Group whose high-risk rate is the numerator of disparate impact.
    /// Default: African-American ("aa")
    pub group_a: GroupSpec,

    /// Reference group, denominator of disparate impact.
    /// Default: Caucasian ("cauc")
    pub group_b: GroupSpec,

    /// `score_text` categories treated as a high-risk prediction.
    /// Default: ["High", "Medium"]
    pub high_risk_categories: Vec<String>,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            group_column: "race".to_string(),
            group_a: GroupSpec::new("African-American", "aa"),
            group_b: GroupSpec::new("Caucasian", "cauc"),
            high_risk_categories: vec!["High".to_string(), "Medium".to_string()],
        }
    }
}

impl GroupConfig {
    /// Whether a score category counts as high risk.
    pub fn is_high_risk(&self, score_text: &str) -> bool {
        self.high_risk_categories.iter().any(|c| c == score_text)
    }
}

/// Row validity predicates applied before analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Lowest accepted `days_b_screening_arrest` (inclusive).
    /// Default: -30
    pub min_screening_offset: f64,

    /// Highest accepted `days_b_screening_arrest` (inclusive).
    /// Default: 30
    pub max_screening_offset: f64,

    /// `is_recid` value marking a missing COMPAS case.
    /// Default: -1
    pub recid_sentinel: i64,

    /// Charge degree excluded from analysis (ordinary traffic offenses).
    /// Default: "O"
    pub excluded_charge_degree: String,

    /// Placeholder meaning the score text is missing.
    /// Default: "N/A"
    pub missing_score_text: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_screening_offset: -30.0,
            max_screening_offset: 30.0,
            recid_sentinel: -1,
            excluded_charge_degree: "O".to_string(),
            missing_score_text: "N/A".to_string(),
        }
    }
}

/// Chart output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Whether to render the PNG at all.
    pub enabled: bool,
    /// File name inside the output directory.
    pub file_name: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file_name: DEFAULT_CHART_FILE.to_string(),
            width: 1800,
            height: 1000,
        }
    }
}

/// Configuration for a full audit run.
///
/// Use [`AuditConfig::builder()`] for a validated configuration, or
/// deserialize one from JSON (missing fields take their defaults).
///
/// # Example
///
/// ```rust,ignore
/// use compas_audit::config::AuditConfig;
///
/// let config = AuditConfig::builder()
///     .input_path("data/compas.csv")
///     .output_dir("out")
///     .charts_enabled(false)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Spreadsheet or CSV file to audit.
    /// Default: "DocRedacted.xlsx"
    pub input_path: PathBuf,

    /// Directory receiving the chart and the JSON report.
    /// Default: "."
    pub output_dir: PathBuf,

    pub filter: FilterConfig,
    pub groups: GroupConfig,
    pub charts: ChartConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_FILE),
            output_dir: PathBuf::from("."),
            filter: FilterConfig::default(),
            groups: GroupConfig::default(),
            charts: ChartConfig::default(),
        }
    }
}

impl AuditConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }

    /// Full path of the chart image.
    pub fn chart_path(&self) -> PathBuf {
        self.output_dir.join(&self.charts.file_name)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let filter = &self.filter;
        if !filter.min_screening_offset.is_finite()
            || !filter.max_screening_offset.is_finite()
            || filter.min_screening_offset > filter.max_screening_offset
        {
            return Err(ConfigValidationError::InvalidScreeningWindow {
                min: filter.min_screening_offset,
                max: filter.max_screening_offset,
            });
        }

        let groups = &self.groups;
        if !ANALYSIS_COLUMNS.contains(&groups.group_column.as_str()) {
            return Err(ConfigValidationError::UnknownGroupColumn(
                groups.group_column.clone(),
            ));
        }
        for (field, value) in [
            ("group_a.label", &groups.group_a.label),
            ("group_b.label", &groups.group_b.label),
            ("group_a.key", &groups.group_a.key),
            ("group_b.key", &groups.group_b.key),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigValidationError::EmptyField(field.to_string()));
            }
        }
        if groups.group_a.label == groups.group_b.label {
            return Err(ConfigValidationError::DuplicateGroup(
                groups.group_a.label.clone(),
            ));
        }
        if groups.group_a.key == groups.group_b.key {
            return Err(ConfigValidationError::DuplicateGroup(groups.group_a.key.clone()));
        }
        if groups.high_risk_categories.is_empty() {
            return Err(ConfigValidationError::NoHighRiskCategories);
        }

        if self.charts.width == 0 || self.charts.height == 0 {
            return Err(ConfigValidationError::InvalidChartSize {
                width: self.charts.width,
                height: self.charts.height,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid screening window [{min}, {max}] (min must not exceed max)")]
    InvalidScreeningWindow { min: f64, max: f64 },

    #[error("Group column '{0}' is not one of the analysis columns")]
    UnknownGroupColumn(String),

    #[error("Configuration field '{0}' must not be empty")]
    EmptyField(String),

    #[error("Both compared groups use '{0}'")]
    DuplicateGroup(String),

    #[error("At least one high-risk score category is required")]
    NoHighRiskCategories,

    #[error("Invalid chart size {width}x{height}")]
    InvalidChartSize { width: u32, height: u32 },
}

impl From<ConfigValidationError> for crate::error::AuditError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::AuditError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`AuditConfig`] with fluent API.
///
/// Starts from [`AuditConfig::default()`] or from a base configuration
/// (e.g. one loaded from a file) and overrides individual fields.
#[derive(Debug, Default)]
pub struct AuditConfigBuilder {
    config: AuditConfig,
}

impl AuditConfigBuilder {
    /// Start from an existing configuration instead of the defaults.
    pub fn from_config(config: AuditConfig) -> Self {
        Self { config }
    }

    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input_path = path.into();
        self
    }

    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_dir = path.into();
        self
    }

    /// Set the accepted `days_b_screening_arrest` window (inclusive).
    pub fn screening_window(mut self, min: f64, max: f64) -> Self {
        self.config.filter.min_screening_offset = min;
        self.config.filter.max_screening_offset = max;
        self
    }

    /// Compare a different group in the disparate impact numerator.
    ///
    /// The metric key is derived from the label; call
    /// [`group_a_key`](Self::group_a_key) afterwards to pick another one.
    pub fn group_a_label(mut self, label: impl Into<String>) -> Self {
        self.config.groups.group_a = GroupSpec::from_label(label);
        self
    }

    /// Compare against a different reference group, deriving its key.
    pub fn group_b_label(mut self, label: impl Into<String>) -> Self {
        self.config.groups.group_b = GroupSpec::from_label(label);
        self
    }

    pub fn group_a_key(mut self, key: impl Into<String>) -> Self {
        self.config.groups.group_a.key = key.into();
        self
    }

    pub fn group_b_key(mut self, key: impl Into<String>) -> Self {
        self.config.groups.group_b.key = key.into();
        self
    }

    pub fn group_a(mut self, spec: GroupSpec) -> Self {
        self.config.groups.group_a = spec;
        self
    }

    pub fn group_b(mut self, spec: GroupSpec) -> Self {
        self.config.groups.group_b = spec;
        self
    }

    pub fn high_risk_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.groups.high_risk_categories =
            categories.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable chart rendering.
    pub fn charts_enabled(mut self, enabled: bool) -> Self {
        self.config.charts.enabled = enabled;
        self
    }

    pub fn chart_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.charts.file_name = name.into();
        self
    }

    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.config.charts.width = width;
        self.config.charts.height = height;
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AuditConfig` or an error if validation fails.
    pub fn build(self) -> Result<AuditConfig, ConfigValidationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
