//! Console rendering of the metrics report.

use crate::metrics::{FOUR_FIFTHS_THRESHOLD, GroupMetrics, MetricsReport};
use std::collections::BTreeMap;
use std::fmt;

const RULE_WIDTH: usize = 70;

/// Human-readable findings for a [`MetricsReport`].
///
/// Five numbered sections: high-risk rates, false positive rates, false
/// negative rates, recidivism rates and the disparate impact verdict.
/// A table over every group label is appended when one is attached with
/// [`TextReport::with_all_groups`].
pub struct TextReport<'a> {
    metrics: &'a MetricsReport,
    all_groups: Option<&'a BTreeMap<String, GroupMetrics>>,
}

impl<'a> TextReport<'a> {
    pub fn new(metrics: &'a MetricsReport) -> Self {
        Self {
            metrics,
            all_groups: None,
        }
    }

    pub fn with_all_groups(mut self, all_groups: &'a BTreeMap<String, GroupMetrics>) -> Self {
        self.all_groups = Some(all_groups);
        self
    }

    /// Render the five-section report.
    pub fn render(metrics: &MetricsReport) -> String {
        TextReport::new(metrics).to_string()
    }
}

fn pct(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn gap(a: f64, b: f64) -> String {
    format!("{:.2} percentage points", (a - b) * 100.0)
}

/// `numerator / denominator` as `"1.91x"`, or `"n/a"` for a zero denominator.
pub fn ratio_multiplier(numerator: f64, denominator: f64) -> String {
    if denominator > 0.0 {
        format!("{:.2}x", numerator / denominator)
    } else {
        "n/a".to_string()
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.metrics;
        let (a, b) = (&m.group_a, &m.group_b);
        let width = a.label.len().max(b.label.len()) + 3;

        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(f, "COMPAS BIAS ANALYSIS - KEY FINDINGS")?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;

        writeln!(f, "\n1. HIGH RISK CLASSIFICATION RATES:")?;
        write_row(f, width, &a.label, pct(a.high_risk_rate))?;
        write_row(f, width, &b.label, pct(b.high_risk_rate))?;
        write_row(f, width, "Disparity", gap(a.high_risk_rate, b.high_risk_rate))?;

        writeln!(f, "\n2. FALSE POSITIVE RATES (Predicted high risk, did NOT recidivate):")?;
        write_row(f, width, &a.label, pct(a.false_positive_rate))?;
        write_row(f, width, &b.label, pct(b.false_positive_rate))?;
        write_row(f, width, "Disparity", gap(a.false_positive_rate, b.false_positive_rate))?;
        writeln!(
            f,
            "   ! {} defendants are {} more likely to be false positives",
            a.label,
            ratio_multiplier(a.false_positive_rate, b.false_positive_rate)
        )?;

        writeln!(f, "\n3. FALSE NEGATIVE RATES (Predicted low risk, DID recidivate):")?;
        write_row(f, width, &a.label, pct(a.false_negative_rate))?;
        write_row(f, width, &b.label, pct(b.false_negative_rate))?;
        write_row(f, width, "Disparity", gap(a.false_negative_rate, b.false_negative_rate))?;
        writeln!(
            f,
            "   ! {} defendants are {} more likely to be false negatives",
            b.label,
            ratio_multiplier(b.false_negative_rate, a.false_negative_rate)
        )?;

        writeln!(f, "\n4. ACTUAL RECIDIVISM RATES:")?;
        write_row(f, width, &a.label, pct(a.recid_rate))?;
        write_row(f, width, &b.label, pct(b.recid_rate))?;

        writeln!(f, "\n5. DISPARATE IMPACT RATIO:")?;
        writeln!(f, "   {:.3}", m.disparate_impact)?;
        if m.passes_four_fifths_rule() {
            writeln!(f, "   Passes {:.0}% rule", FOUR_FIFTHS_THRESHOLD * 100.0)?;
        } else {
            writeln!(
                f,
                "   ! FAILS {:.0}% rule (indicates adverse impact)",
                FOUR_FIFTHS_THRESHOLD * 100.0
            )?;
        }

        if let Some(groups) = self.all_groups {
            write_group_table(f, groups)?;
        }

        write!(f, "\n{}", "=".repeat(RULE_WIDTH))
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, width: usize, label: &str, value: String) -> fmt::Result {
    writeln!(f, "   {:<width$}{}", format!("{}:", label), value, width = width)
}

fn write_group_table(f: &mut fmt::Formatter<'_>, groups: &BTreeMap<String, GroupMetrics>) -> fmt::Result {
    let width = groups.keys().map(String::len).max().unwrap_or(0).max("Group".len());

    writeln!(f, "\nALL GROUPS:")?;
    writeln!(
        f,
        "   {:<width$} {:>7} {:>10} {:>8} {:>8} {:>8}",
        "Group",
        "n",
        "High risk",
        "Recid",
        "FPR",
        "FNR",
        width = width
    )?;
    writeln!(f, "   {}", "-".repeat(width + 46))?;
    for (label, g) in groups {
        writeln!(
            f,
            "   {:<width$} {:>7} {:>10} {:>8} {:>8} {:>8}",
            label,
            g.counts.total,
            pct(g.high_risk_rate),
            pct(g.recid_rate),
            pct(g.false_positive_rate),
            pct(g.false_negative_rate),
            width = width
        )?;
    }
    Ok(())
}
