//! Shared schema constants and summary types.

use serde::{Deserialize, Serialize};

pub const DAYS_B_SCREENING_ARREST: &str = "days_b_screening_arrest";
pub const IS_RECID: &str = "is_recid";
pub const C_CHARGE_DEGREE: &str = "c_charge_degree";
pub const SCORE_TEXT: &str = "score_text";
pub const AGE: &str = "age";
pub const RACE: &str = "race";
pub const AGE_CAT: &str = "age_cat";
pub const SEX: &str = "sex";
pub const PRIORS_COUNT: &str = "priors_count";
pub const DECILE_SCORE: &str = "decile_score";
pub const TWO_YEAR_RECID: &str = "two_year_recid";
pub const C_JAIL_IN: &str = "c_jail_in";
pub const C_JAIL_OUT: &str = "c_jail_out";

/// Derived: 1 when the row belongs to the first compared group.
pub const RACE_BINARY: &str = "race_binary";
/// Derived: 1 when the score category is a high-risk prediction.
pub const HIGH_RISK: &str = "high_risk";
/// Derived: 1 when `sex == "Male"`.
pub const SEX_BINARY: &str = "sex_binary";
/// Derived: 1 for felony charges (`c_charge_degree == "F"`).
pub const CHARGE_DEGREE: &str = "charge_degree";

/// Columns kept by the projection step, in output order.
pub const ANALYSIS_COLUMNS: [&str; 13] = [
    AGE,
    C_CHARGE_DEGREE,
    RACE,
    AGE_CAT,
    SCORE_TEXT,
    SEX,
    PRIORS_COUNT,
    DAYS_B_SCREENING_ARREST,
    DECILE_SCORE,
    IS_RECID,
    TWO_YEAR_RECID,
    C_JAIL_IN,
    C_JAIL_OUT,
];

/// Analysis columns normalised to `Int64`.
pub const INTEGER_COLUMNS: [&str; 5] = [AGE, PRIORS_COUNT, DECILE_SCORE, IS_RECID, TWO_YEAR_RECID];

/// Analysis columns normalised to `String`.
pub const TEXT_COLUMNS: [&str; 7] = [
    C_CHARGE_DEGREE,
    RACE,
    AGE_CAT,
    SCORE_TEXT,
    SEX,
    C_JAIL_IN,
    C_JAIL_OUT,
];

/// Score categories in ascending risk order.
pub const SCORE_CATEGORIES: [&str; 3] = ["Low", "Medium", "High"];

/// Row counts recorded while filtering the raw dataset.
///
/// Each dropped row is attributed to the first predicate it failed, in the
/// order screening window, recidivism sentinel, charge degree, score text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    pub dropped_screening_window: usize,
    pub dropped_recid_sentinel: usize,
    pub dropped_charge_degree: usize,
    pub dropped_missing_score: usize,
    /// Rows of the first compared group left after filtering.
    pub group_a_rows: usize,
    /// Rows of the reference group left after filtering.
    pub group_b_rows: usize,
}

impl FilterSummary {
    pub fn rows_dropped(&self) -> usize {
        self.rows_before - self.rows_after
    }
}
