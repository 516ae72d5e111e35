//! Row filtering, column projection and derived indicator columns.
//!
//! Applies the ProPublica validity predicates to the raw COMPAS table:
//!
//! - `days_b_screening_arrest` within the configured window (null fails)
//! - `is_recid` not equal to the `-1` sentinel (null passes)
//! - `c_charge_degree` not `"O"` (null passes)
//! - `score_text` neither null nor `"N/A"`
//!
//! then keeps the analysis columns and appends `race_binary`, `high_risk`,
//! `sex_binary` and `charge_degree`.

use crate::config::{FilterConfig, GroupConfig};
use crate::error::{Result, ResultExt};
use crate::types::*;
use crate::utils::{f64_values, require_columns, str_values};
use polars::prelude::*;
use tracing::{debug, info};

/// Columns the predicates read before projection.
const PREDICATE_COLUMNS: [&str; 4] = [DAYS_B_SCREENING_ARREST, IS_RECID, C_CHARGE_DEGREE, SCORE_TEXT];

/// Why a row was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    ScreeningWindow,
    RecidSentinel,
    ChargeDegree,
    MissingScore,
}

/// Filters a raw dataset into the clean analysis dataset.
#[derive(Debug, Clone)]
pub struct DatasetFilter {
    filter: FilterConfig,
    groups: GroupConfig,
}

impl DatasetFilter {
    pub fn new(filter: &FilterConfig, groups: &GroupConfig) -> Self {
        Self {
            filter: filter.clone(),
            groups: groups.clone(),
        }
    }

    /// Filter, project and derive indicators.
    ///
    /// Applying this to its own output returns an equal frame.
    pub fn apply(&self, df: DataFrame) -> Result<(DataFrame, FilterSummary)> {
        require_columns(&df, &ANALYSIS_COLUMNS)?;

        let mut summary = FilterSummary {
            rows_before: df.height(),
            ..FilterSummary::default()
        };

        let mask = self.build_mask(&df, &mut summary)?;
        let filtered = df
            .filter(&BooleanChunked::from_slice("mask".into(), &mask))
            .context("Filtering invalid rows")?;

        let projected = filtered
            .select(ANALYSIS_COLUMNS)
            .context("Projecting analysis columns")?;
        let normalised = normalise_types(projected)?;
        let clean = self.derive_indicators(normalised)?;

        summary.rows_after = clean.height();
        let races = str_values(&clean, &self.groups.group_column)?;
        summary.group_a_rows = count_label(&races, &self.groups.group_a.label);
        summary.group_b_rows = count_label(&races, &self.groups.group_b.label);

        info!(
            "Preprocessed data: {} rows ({} dropped)",
            summary.rows_after,
            summary.rows_dropped()
        );
        info!("  - {}: {}", self.groups.group_a.label, summary.group_a_rows);
        info!("  - {}: {}", self.groups.group_b.label, summary.group_b_rows);

        Ok((clean, summary))
    }

    fn build_mask(&self, df: &DataFrame, summary: &mut FilterSummary) -> Result<Vec<bool>> {
        require_columns(df, &PREDICATE_COLUMNS)?;
        let days = f64_values(df, DAYS_B_SCREENING_ARREST)?;
        let is_recid = f64_values(df, IS_RECID)?;
        let charge = str_values(df, C_CHARGE_DEGREE)?;
        let score = str_values(df, SCORE_TEXT)?;

        let mut mask = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let verdict = self.check_row(
                days[row],
                is_recid[row],
                charge[row].as_deref(),
                score[row].as_deref(),
            );
            match verdict {
                None => mask.push(true),
                Some(rejection) => {
                    match rejection {
                        Rejection::ScreeningWindow => summary.dropped_screening_window += 1,
                        Rejection::RecidSentinel => summary.dropped_recid_sentinel += 1,
                        Rejection::ChargeDegree => summary.dropped_charge_degree += 1,
                        Rejection::MissingScore => summary.dropped_missing_score += 1,
                    }
                    mask.push(false);
                }
            }
        }

        debug!(
            "Rejected rows: screening window {}, recid sentinel {}, charge degree {}, missing score {}",
            summary.dropped_screening_window,
            summary.dropped_recid_sentinel,
            summary.dropped_charge_degree,
            summary.dropped_missing_score
        );

        Ok(mask)
    }

    fn check_row(
        &self,
        days: Option<f64>,
        is_recid: Option<f64>,
        charge: Option<&str>,
        score: Option<&str>,
    ) -> Option<Rejection> {
        let in_window = days
            .map(|d| d >= self.filter.min_screening_offset && d <= self.filter.max_screening_offset)
            .unwrap_or(false);
        if !in_window {
            return Some(Rejection::ScreeningWindow);
        }
        if is_recid == Some(self.filter.recid_sentinel as f64) {
            return Some(Rejection::RecidSentinel);
        }
        if charge == Some(self.filter.excluded_charge_degree.as_str()) {
            return Some(Rejection::ChargeDegree);
        }
        match score {
            None => Some(Rejection::MissingScore),
            Some(s) if s == self.filter.missing_score_text => Some(Rejection::MissingScore),
            Some(_) => None,
        }
    }

    fn derive_indicators(&self, mut df: DataFrame) -> Result<DataFrame> {
        let race = str_values(&df, &self.groups.group_column)?;
        let score = str_values(&df, SCORE_TEXT)?;
        let sex = str_values(&df, SEX)?;
        let charge = str_values(&df, C_CHARGE_DEGREE)?;

        let group_a = self.groups.group_a.label.as_str();
        let indicators = [
            (RACE_BINARY, indicator(&race, |v| v == group_a)),
            (HIGH_RISK, indicator(&score, |v| self.groups.is_high_risk(v))),
            (SEX_BINARY, indicator(&sex, |v| v == "Male")),
            (CHARGE_DEGREE, indicator(&charge, |v| v == "F")),
        ];

        for (name, values) in indicators {
            df.with_column(Series::new(name.into(), values))
                .context(format!("Adding derived column '{}'", name))?;
        }

        Ok(df)
    }
}

/// Cast analysis columns to the dtypes the rest of the crate expects.
fn normalise_types(mut df: DataFrame) -> Result<DataFrame> {
    let casts = INTEGER_COLUMNS
        .iter()
        .map(|c| (*c, DataType::Int64))
        .chain(TEXT_COLUMNS.iter().map(|c| (*c, DataType::String)))
        .chain(std::iter::once((DAYS_B_SCREENING_ARREST, DataType::Float64)));

    for (name, dtype) in casts {
        let cast = df
            .column(name)?
            .as_materialized_series()
            .cast(&dtype)
            .context(format!("Casting '{}' to {}", name, dtype))?;
        df.with_column(cast)?;
    }

    Ok(df)
}

/// 1/0 indicator from a predicate over string values; nulls map to 0.
fn indicator(values: &[Option<String>], predicate: impl Fn(&str) -> bool) -> Vec<i32> {
    values
        .iter()
        .map(|v| match v {
            Some(s) if predicate(s) => 1,
            _ => 0,
        })
        .collect()
}

fn count_label(values: &[Option<String>], label: &str) -> usize {
    values.iter().filter(|v| v.as_deref() == Some(label)).count()
}
