//! Custom error types for the fairness audit.
//!
//! All library failures funnel into [`AuditError`]. Rate computations never
//! produce errors: a zero denominator yields a rate of 0.
//!
//! Errors are serializable so the JSON report mode can emit them in the same
//! `{code, message}` shape as successful output.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the audit pipeline.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Input file does not exist.
    #[error("Input file not found: {0}")]
    InputNotFound(String),

    /// Input file extension is not a supported table format.
    #[error("Unsupported input format '{extension}' for file {path}")]
    UnsupportedFormat { path: String, extension: String },

    /// Input exists but could not be read or parsed.
    #[error("Failed to load {path}: {source}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<AuditError>,
    },

    /// Spreadsheet contained no worksheet or no header row.
    #[error("Spreadsheet is empty: {0}")]
    EmptySpreadsheet(String),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Chart rendering failed.
    #[error("Failed to render charts: {0}")]
    ChartRenderFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Spreadsheet reader error wrapper.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AuditError>,
    },
}

impl AuditError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AuditError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, used as the `code` field of the serialized form.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InputNotFound(_) => "INPUT_NOT_FOUND",
            Self::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            Self::LoadFailed { .. } => "LOAD_FAILED",
            Self::EmptySpreadsheet(_) => "EMPTY_SPREADSHEET",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ChartRenderFailed(_) => "CHART_RENDER_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Spreadsheet(_) => "SPREADSHEET_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether this error happened while loading the input.
    ///
    /// Load failures are the single abort point of the audit.
    pub fn is_load_failure(&self) -> bool {
        match self {
            Self::InputNotFound(_)
            | Self::UnsupportedFormat { .. }
            | Self::LoadFailed { .. }
            | Self::EmptySpreadsheet(_)
            | Self::Spreadsheet(_) => true,
            Self::WithContext { source, .. } => source.is_load_failure(),
            _ => false,
        }
    }
}

impl Serialize for AuditError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AuditError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AuditError::Polars(e).with_context(context))
    }
}
