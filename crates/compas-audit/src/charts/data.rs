//! Aggregates behind the chart panels.

use crate::config::GroupConfig;
use crate::error::Result;
use crate::types::{DECILE_SCORE, SCORE_CATEGORIES, SCORE_TEXT, TWO_YEAR_RECID};
use crate::utils::{i64_values, require_columns, safe_ratio, str_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-group aggregates for the distribution panels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupChartData {
    pub label: String,
    /// Share of each score category (Low, Medium, High) in percent.
    pub score_distribution: [f64; 3],
    /// Number of records per decile score 1..=10.
    pub decile_counts: [usize; 10],
    /// Two-year recidivism rate in percent per score category.
    pub recid_by_score: [f64; 3],
}

/// Chart input for both compared groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub group_a: GroupChartData,
    pub group_b: GroupChartData,
}

#[derive(Default)]
struct Accumulator {
    score_counts: [usize; 3],
    /// Rows per category with a known two-year outcome.
    score_known: [usize; 3],
    score_recid: [usize; 3],
    decile_counts: [usize; 10],
}

impl Accumulator {
    fn finish(self, label: &str) -> GroupChartData {
        let scored: usize = self.score_counts.iter().sum();
        let mut distribution = [0.0; 3];
        let mut recid = [0.0; 3];
        for i in 0..3 {
            distribution[i] = safe_ratio(self.score_counts[i], scored) * 100.0;
            recid[i] = safe_ratio(self.score_recid[i], self.score_known[i]) * 100.0;
        }
        GroupChartData {
            label: label.to_string(),
            score_distribution: distribution,
            decile_counts: self.decile_counts,
            recid_by_score: recid,
        }
    }
}

impl ChartData {
    /// Aggregate the clean dataset for the two configured groups.
    ///
    /// Score categories outside Low/Medium/High and deciles outside 1..=10
    /// are left out of the respective panels.
    pub fn from_frame(df: &DataFrame, groups: &GroupConfig) -> Result<Self> {
        let group_column = groups.group_column.as_str();
        require_columns(df, &[group_column, SCORE_TEXT, DECILE_SCORE, TWO_YEAR_RECID])?;

        let labels = str_values(df, group_column)?;
        let scores = str_values(df, SCORE_TEXT)?;
        let deciles = i64_values(df, DECILE_SCORE)?;
        let recid = i64_values(df, TWO_YEAR_RECID)?;

        let mut acc = [Accumulator::default(), Accumulator::default()];
        for row in 0..df.height() {
            let slot = match labels[row].as_deref() {
                Some(l) if l == groups.group_a.label => 0,
                Some(l) if l == groups.group_b.label => 1,
                _ => continue,
            };
            let group = &mut acc[slot];

            if let Some(category) = scores[row]
                .as_deref()
                .and_then(|s| SCORE_CATEGORIES.iter().position(|c| *c == s))
            {
                group.score_counts[category] += 1;
                match recid[row] {
                    Some(1) => {
                        group.score_known[category] += 1;
                        group.score_recid[category] += 1;
                    }
                    Some(0) => group.score_known[category] += 1,
                    _ => {}
                }
            }

            if let Some(decile) = deciles[row].filter(|d| (1..=10).contains(d)) {
                group.decile_counts[(decile - 1) as usize] += 1;
            }
        }

        let [a, b] = acc;
        Ok(Self {
            group_a: a.finish(&groups.group_a.label),
            group_b: b.finish(&groups.group_b.label),
        })
    }
}
