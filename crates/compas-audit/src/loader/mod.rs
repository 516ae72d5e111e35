//! Dataset loading.
//!
//! Reads the COMPAS table from disk into a polars [`DataFrame`]. Spreadsheets
//! (`.xlsx`, `.xlsm`, `.xls`, `.ods`) go through `calamine`; `.csv` files go
//! through the polars CSV reader, with one retry on cleaned content for
//! sloppy exports.

mod csv;
mod spreadsheet;

use crate::error::{AuditError, Result};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

pub use self::csv::load_csv;
pub use self::spreadsheet::load_spreadsheet;

/// Input formats understood by [`load_dataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Spreadsheet,
}

impl InputFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

/// Load the dataset at `path`.
///
/// Fails with [`AuditError::InputNotFound`] when the file is absent, with
/// [`AuditError::UnsupportedFormat`] for unknown extensions and with
/// [`AuditError::LoadFailed`] when the file cannot be read or parsed.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AuditError::InputNotFound(path.display().to_string()));
    }

    let format = InputFormat::from_path(path).ok_or_else(|| AuditError::UnsupportedFormat {
        path: path.display().to_string(),
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string(),
    })?;

    let loaded = match format {
        InputFormat::Csv => load_csv(path),
        InputFormat::Spreadsheet => load_spreadsheet(path),
    };
    let df = loaded.map_err(|e| match e {
        AuditError::EmptySpreadsheet(_) => e,
        other => AuditError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(other),
        },
    })?;

    info!(
        "Loaded COMPAS dataset from {}: {} rows, {} columns",
        path.display(),
        df.height(),
        df.width()
    );

    Ok(df)
}
