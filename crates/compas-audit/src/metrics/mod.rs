//! Group fairness metrics.
//!
//! All rates are plain ratios of integer counts. A zero denominator yields 0
//! so the report can always be rendered.
//!
//! - high-risk rate: `high_risk / n`
//! - recidivism rate: `two_year_recid / n`
//! - false positive rate: high-risk among non-recidivists
//! - false negative rate: not-high-risk among recidivists
//! - disparate impact: group A high-risk rate over group B high-risk rate

use crate::config::{GroupConfig, GroupSpec};
use crate::error::Result;
use crate::types::{HIGH_RISK, TWO_YEAR_RECID};
use crate::utils::{i64_values, require_columns, safe_ratio, str_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Disparate impact below this value fails the 80% rule.
pub const FOUR_FIFTHS_THRESHOLD: f64 = 0.8;

/// Raw tallies for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCounts {
    pub total: usize,
    pub high_risk: usize,
    pub recidivists: usize,
    pub non_recidivists: usize,
    /// High risk but did not reoffend.
    pub false_positives: usize,
    /// Not high risk but did reoffend.
    pub false_negatives: usize,
}

impl GroupCounts {
    /// Add one record. `recidivated` is `None` when the outcome is unknown;
    /// such a record counts toward the group size only.
    pub fn record(&mut self, high_risk: bool, recidivated: Option<bool>) {
        self.total += 1;
        if high_risk {
            self.high_risk += 1;
        }
        match recidivated {
            Some(true) => {
                self.recidivists += 1;
                if !high_risk {
                    self.false_negatives += 1;
                }
            }
            Some(false) => {
                self.non_recidivists += 1;
                if high_risk {
                    self.false_positives += 1;
                }
            }
            None => {}
        }
    }
}

/// Rates for one group together with the counts behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMetrics {
    pub label: String,
    pub counts: GroupCounts,
    pub high_risk_rate: f64,
    pub recid_rate: f64,
    pub false_positive_rate: f64,
    pub false_negative_rate: f64,
}

impl GroupMetrics {
    pub fn from_counts(label: impl Into<String>, counts: GroupCounts) -> Self {
        Self {
            label: label.into(),
            counts,
            high_risk_rate: safe_ratio(counts.high_risk, counts.total),
            recid_rate: safe_ratio(counts.recidivists, counts.total),
            false_positive_rate: safe_ratio(counts.false_positives, counts.non_recidivists),
            false_negative_rate: safe_ratio(counts.false_negatives, counts.recidivists),
        }
    }

    /// All four rates, for range checks.
    pub fn rates(&self) -> [f64; 4] {
        [
            self.high_risk_rate,
            self.recid_rate,
            self.false_positive_rate,
            self.false_negative_rate,
        ]
    }
}

/// Two-group comparison produced by [`MetricsCalculator::calculate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub group_a_key: String,
    pub group_b_key: String,
    pub group_a: GroupMetrics,
    pub group_b: GroupMetrics,
    /// Group A high-risk rate over group B high-risk rate.
    ///
    /// Set to 0 when group B's rate is 0. That is a display placeholder kept
    /// for parity with the published analysis, not a meaningful ratio.
    pub disparate_impact: f64,
}

impl MetricsReport {
    pub fn new(group_a: &GroupSpec, a: GroupMetrics, group_b: &GroupSpec, b: GroupMetrics) -> Self {
        let disparate_impact = disparate_impact(a.high_risk_rate, b.high_risk_rate);
        Self {
            group_a_key: group_a.key.clone(),
            group_b_key: group_b.key.clone(),
            group_a: a,
            group_b: b,
            disparate_impact,
        }
    }

    /// Whether disparate impact reaches the four-fifths threshold.
    pub fn passes_four_fifths_rule(&self) -> bool {
        self.disparate_impact >= FOUR_FIFTHS_THRESHOLD
    }

    /// Flat `metric name -> value` view, e.g. `aa_fpr` or `disparate_impact`.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        for (key, group) in [(&self.group_a_key, &self.group_a), (&self.group_b_key, &self.group_b)] {
            map.insert(format!("{}_high_risk_rate", key), group.high_risk_rate);
            map.insert(format!("{}_recid_rate", key), group.recid_rate);
            map.insert(format!("{}_fpr", key), group.false_positive_rate);
            map.insert(format!("{}_fnr", key), group.false_negative_rate);
        }
        map.insert("disparate_impact".to_string(), self.disparate_impact);
        map
    }
}

/// `rate_a / rate_b`, or 0 when `rate_b` is not positive.
pub fn disparate_impact(rate_a: f64, rate_b: f64) -> f64 {
    if rate_b > 0.0 { rate_a / rate_b } else { 0.0 }
}

/// Computes group metrics from a clean dataset.
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    groups: GroupConfig,
}

impl MetricsCalculator {
    pub fn new(groups: &GroupConfig) -> Self {
        Self {
            groups: groups.clone(),
        }
    }

    /// Compare the two configured groups.
    ///
    /// Rows belonging to other groups are ignored here but stay in the dataset.
    pub fn calculate(&self, df: &DataFrame) -> Result<MetricsReport> {
        let tallies = self.tally(df)?;
        let counts_for = |label: &str| tallies.get(label).copied().unwrap_or_default();

        let a = &self.groups.group_a;
        let b = &self.groups.group_b;
        let report = MetricsReport::new(
            a,
            GroupMetrics::from_counts(&a.label, counts_for(&a.label)),
            b,
            GroupMetrics::from_counts(&b.label, counts_for(&b.label)),
        );

        debug!(
            "Disparate impact {} / {} = {:.3}",
            a.label, b.label, report.disparate_impact
        );
        Ok(report)
    }

    /// The same rates for every label of the group column, in label order.
    pub fn per_group(&self, df: &DataFrame) -> Result<BTreeMap<String, GroupMetrics>> {
        Ok(self
            .tally(df)?
            .into_iter()
            .map(|(label, counts)| {
                let metrics = GroupMetrics::from_counts(label.clone(), counts);
                (label, metrics)
            })
            .collect())
    }

    fn tally(&self, df: &DataFrame) -> Result<BTreeMap<String, GroupCounts>> {
        let group_column = self.groups.group_column.as_str();
        require_columns(df, &[group_column, HIGH_RISK, TWO_YEAR_RECID])?;

        let labels = str_values(df, group_column)?;
        let high_risk = i64_values(df, HIGH_RISK)?;
        let recid = i64_values(df, TWO_YEAR_RECID)?;

        let mut tallies: BTreeMap<String, GroupCounts> = BTreeMap::new();
        for ((label, high_risk), recid) in labels.iter().zip(&high_risk).zip(&recid) {
            let Some(label) = label else { continue };
            let recidivated = match recid {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            };
            tallies
                .entry(label.clone())
                .or_default()
                .record(*high_risk == Some(1), recidivated);
        }

        Ok(tallies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn clean_frame() -> DataFrame {
        df![
            "race" => ["African-American", "African-American", "African-American", "African-American",
                       "Caucasian", "Caucasian", "Caucasian", "Hispanic"],
            "high_risk" => [1i32, 1, 0, 0, 1, 0, 0, 1],
            "two_year_recid" => [1i64, 0, 1, 0, 0, 0, 1, 0],
        ]
        .unwrap()
    }

    fn counts(total: usize, high_risk: usize, non_recid: usize, fp: usize, recid: usize, fn_: usize) -> GroupCounts {
        GroupCounts {
            total,
            high_risk,
            recidivists: recid,
            non_recidivists: non_recid,
            false_positives: fp,
            false_negatives: fn_,
        }
    }

    #[test]
    fn test_false_positive_rate_example() {
        // 100 records, 60 high risk, 40 non-recidivists of which 30 are high risk
        let mut c = GroupCounts::default();
        for i in 0..100 {
            let non_recid = i < 40;
            let high_risk = if non_recid { i < 30 } else { i < 70 };
            c.record(high_risk, Some(!non_recid));
        }
        assert_eq!(c.high_risk, 60);
        assert_eq!(c.non_recidivists, 40);

        let m = GroupMetrics::from_counts("A", c);
        assert_eq!(m.false_positive_rate, 0.75);
        assert_eq!(m.high_risk_rate, 0.6);
    }

    #[test]
    fn test_calculate_two_groups() {
        let report = MetricsCalculator::new(&GroupConfig::default())
            .calculate(&clean_frame())
            .unwrap();

        assert_eq!(report.group_a.counts, counts(4, 2, 2, 1, 2, 1));
        assert_eq!(report.group_a.high_risk_rate, 0.5);
        assert_eq!(report.group_a.recid_rate, 0.5);
        assert_eq!(report.group_a.false_positive_rate, 0.5);
        assert_eq!(report.group_a.false_negative_rate, 0.5);

        assert_eq!(report.group_b.counts, counts(3, 1, 2, 1, 1, 1));
        assert!((report.group_b.high_risk_rate - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.group_b.false_positive_rate, 0.5);
        assert_eq!(report.group_b.false_negative_rate, 1.0);

        assert!((report.disparate_impact - 1.5).abs() < 1e-12);
        assert!(report.passes_four_fifths_rule());
    }

    #[test]
    fn test_empty_group_yields_zero_rates() {
        let groups = GroupConfig {
            group_b: GroupSpec::new("Native American", "na"),
            ..GroupConfig::default()
        };
        let report = MetricsCalculator::new(&groups).calculate(&clean_frame()).unwrap();

        assert_eq!(report.group_b.counts.total, 0);
        assert_eq!(report.group_b.rates(), [0.0; 4]);
        assert_eq!(report.disparate_impact, 0.0);
        assert!(!report.passes_four_fifths_rule());
    }

    #[test]
    fn test_disparate_impact_zero_only_for_zero_reference() {
        assert_eq!(disparate_impact(0.4, 0.0), 0.0);
        assert_eq!(disparate_impact(0.0, 0.5), 0.0);
        assert_eq!(disparate_impact(0.6, 0.3), 2.0);
    }

    #[test]
    fn test_rates_within_unit_interval() {
        for total in 0..6 {
            for mask in 0..(1u32 << (2 * total)) {
                let mut c = GroupCounts::default();
                for i in 0..total {
                    let bits = (mask >> (2 * i)) & 0b11;
                    c.record(bits & 1 == 1, Some(bits & 2 == 2));
                }
                let m = GroupMetrics::from_counts("g", c);
                for rate in m.rates() {
                    assert!((0.0..=1.0).contains(&rate), "rate {} out of range for {:?}", rate, c);
                }
            }
        }
    }

    #[test]
    fn test_unknown_outcome_counts_toward_size_only() {
        let mut c = GroupCounts::default();
        c.record(true, None);
        c.record(false, Some(true));
        let m = GroupMetrics::from_counts("g", c);

        assert_eq!(m.high_risk_rate, 0.5);
        assert_eq!(m.recid_rate, 0.5);
        assert_eq!(m.false_positive_rate, 0.0);
        assert_eq!(m.false_negative_rate, 1.0);
    }

    #[test]
    fn test_per_group_includes_other_labels() {
        let groups = MetricsCalculator::new(&GroupConfig::default())
            .per_group(&clean_frame())
            .unwrap();

        let labels: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["African-American", "Caucasian", "Hispanic"]);
        assert_eq!(groups["Hispanic"].false_positive_rate, 1.0);
    }

    #[test]
    fn test_flat_metric_names() {
        let report = MetricsCalculator::new(&GroupConfig::default())
            .calculate(&clean_frame())
            .unwrap();
        let map = report.to_map();

        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "aa_fnr",
                "aa_fpr",
                "aa_high_risk_rate",
                "aa_recid_rate",
                "cauc_fnr",
                "cauc_fpr",
                "cauc_high_risk_rate",
                "cauc_recid_rate",
                "disparate_impact",
            ]
        );
        assert_eq!(map["aa_high_risk_rate"], 0.5);
    }
}
