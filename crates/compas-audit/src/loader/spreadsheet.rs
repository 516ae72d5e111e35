//! Spreadsheet loading through `calamine`.
//!
//! The first worksheet is read; its first row is the header. A column whose
//! non-empty cells are all numbers becomes `Float64`, anything else becomes
//! `String`. Empty and error cells become nulls. Date cells are written as
//! `YYYY-MM-DD HH:MM:SS` text, the way CSV exports carry them.

use crate::error::{AuditError, Result};
use calamine::{Data, Reader, open_workbook_auto};
use chrono::SubsecRound;
use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

static EMPTY_CELL: Data = Data::Empty;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Load the first worksheet of a workbook into a DataFrame.
pub fn load_spreadsheet(path: &Path) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook.sheet_names().first().cloned();
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AuditError::EmptySpreadsheet(path.display().to_string()))??;

    debug!(
        "Reading worksheet {:?} ({} x {} cells)",
        sheet_name,
        range.height(),
        range.width()
    );

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| AuditError::EmptySpreadsheet(path.display().to_string()))?;
    let names = header_names(header);
    let body: Vec<&[Data]> = rows.collect();

    frame_from_cells(&names, &body)
}

/// Turn header cells into unique, non-empty column names.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let raw = cell.to_string();
            let base = if raw.trim().is_empty() {
                format!("column_{}", idx)
            } else {
                raw.trim().to_string()
            };
            let mut name = base.clone();
            if !seen.insert(name.clone()) {
                name = format!("{}_{}", base, idx);
                seen.insert(name.clone());
            }
            name
        })
        .collect()
}

fn frame_from_cells(names: &[String], body: &[&[Data]]) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(names.len());

    for (idx, name) in names.iter().enumerate() {
        let cells = body.iter().map(move |row| row.get(idx).unwrap_or(&EMPTY_CELL));
        let series = if is_numeric_column(cells.clone()) {
            let values: Vec<Option<f64>> = cells.map(numeric_value).collect();
            Series::new(name.as_str().into(), values)
        } else {
            let values: Vec<Option<String>> = cells.map(text_value).collect();
            Series::new(name.as_str().into(), values)
        };
        columns.push(series.into());
    }

    Ok(DataFrame::new(columns)?)
}

fn is_numeric_column<'a>(mut cells: impl Iterator<Item = &'a Data>) -> bool {
    let mut any_value = false;
    let all_numeric = cells.all(|cell| match cell {
        Data::Int(_) | Data::Float(_) => {
            any_value = true;
            true
        }
        Data::Empty | Data::Error(_) => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    });
    all_numeric && any_value
}

fn numeric_value(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(v) => Some(*v as f64),
        Data::Float(v) => Some(*v),
        _ => None,
    }
}

fn text_value(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(v) if v.fract() == 0.0 => Some(format!("{}", *v as i64)),
        // serials carry float noise below a second
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => Some(value.round_subsecs(0).format(DATETIME_FORMAT).to_string()),
            None => Some(dt.as_f64().to_string()),
        },
        other => Some(other.to_string()),
    }
}
