//! CSV loading for COMPAS exports.
//!
//! Blank cells and the literal `N/A` are read as nulls. Exports that the
//! strict parser rejects are retried once after collapsing doubled quotes
//! and dropping blank lines.

use crate::error::Result;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

/// Number of rows polars inspects when inferring column types.
const INFER_SCHEMA_ROWS: usize = 1000;

/// Cell values read as null besides empty fields.
const NULL_MARKERS: [&str; 1] = ["N/A"];

fn read_options() -> CsvReadOptions {
    let null_values = NullValues::AllColumns(NULL_MARKERS.iter().map(|v| (*v).into()).collect());
    CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_missing_is_null(true)
                .with_null_values(Some(null_values)),
        )
}

/// Load a CSV file, retrying on cleaned content when the strict parse fails.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let strict = read_options()
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish());

    match strict {
        Ok(df) => Ok(df),
        Err(e) => {
            debug!("Strict CSV parse of {} failed: {}", path.display(), e);
            let content = std::fs::read_to_string(path)?;
            let df = read_options()
                .into_reader_with_file_handle(Cursor::new(clean_csv_content(&content)))
                .finish()?;
            warn!("{} needed quote cleanup before parsing", path.display());
            Ok(df)
        }
    }
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
