//! Column access helpers shared by the filter, metrics and chart modules.
//!
//! Input columns arrive with whatever dtype the loader inferred (a spreadsheet
//! yields `Float64` where a CSV yields `Int64`), so every accessor casts to
//! the type it needs before reading values.

use crate::error::{AuditError, Result};
use polars::prelude::*;

/// Fail with [`AuditError::ColumnNotFound`] for the first missing column.
pub fn require_columns(df: &DataFrame, names: &[&str]) -> Result<()> {
    let present: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    match names.iter().find(|name| !present.iter().any(|p| p == *name)) {
        Some(missing) => Err(AuditError::ColumnNotFound(missing.to_string())),
        None => Ok(()),
    }
}

/// Look up a column and cast it, reporting missing columns by name.
pub fn cast_column(df: &DataFrame, name: &str, dtype: &DataType) -> Result<Series> {
    let column = df
        .column(name)
        .map_err(|_| AuditError::ColumnNotFound(name.to_string()))?;
    Ok(column.as_materialized_series().cast(dtype)?)
}

/// Values of a column as `f64`; unparseable values become `None`.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = cast_column(df, name, &DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

/// Values of a column as `i64`; unparseable values become `None`.
pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let series = cast_column(df, name, &DataType::Int64)?;
    Ok(series.i64()?.into_iter().collect())
}

/// Values of a column as owned strings.
pub fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = cast_column(df, name, &DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// `numerator / denominator`, or 0 when the denominator is 0.
#[inline]
pub fn safe_ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_columns() {
        let df = df![
            "race" => ["Caucasian"],
            "score_text" => ["Low"],
        ]
        .unwrap();

        assert!(require_columns(&df, &["race", "score_text"]).is_ok());
        let err = require_columns(&df, &["race", "decile_score"]).unwrap_err();
        assert!(matches!(err, AuditError::ColumnNotFound(ref c) if c == "decile_score"));
    }

    #[test]
    fn test_value_accessors_cast() {
        let df = df![
            "is_recid" => [1.0f64, -1.0, 0.0],
            "decile_score" => ["3", "x", "10"],
        ]
        .unwrap();

        assert_eq!(i64_values(&df, "is_recid").unwrap(), vec![Some(1), Some(-1), Some(0)]);
        assert_eq!(
            f64_values(&df, "decile_score").unwrap(),
            vec![Some(3.0), None, Some(10.0)]
        );
        assert!(matches!(
            str_values(&df, "missing").unwrap_err(),
            AuditError::ColumnNotFound(_)
        ));
    }

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(30, 40), 0.75);
        assert_eq!(safe_ratio(0, 0), 0.0);
        assert_eq!(safe_ratio(5, 0), 0.0);
    }
}
