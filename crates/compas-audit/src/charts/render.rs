//! Six-panel PNG rendering with `plotters`.

use super::data::ChartData;
use crate::config::ChartConfig;
use crate::error::{AuditError, Result};
use crate::metrics::MetricsReport;
use crate::types::SCORE_CATEGORIES;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

const GROUP_A_COLOR: RGBColor = RGBColor(0xe7, 0x4c, 0x3c);
const GROUP_B_COLOR: RGBColor = RGBColor(0x34, 0x98, 0xdb);
const FNR_A_COLOR: RGBColor = RGBColor(0x2e, 0xcc, 0x71);
const FNR_B_COLOR: RGBColor = RGBColor(0xf3, 0x9c, 0x12);
const RISK_COLORS: [RGBColor; 3] = [
    RGBColor(0x2e, 0x8b, 0x57),
    RGBColor(0xff, 0xa5, 0x00),
    RGBColor(0xd6, 0x27, 0x28),
];

/// One bar series. Bar `i` uses `colors[i % colors.len()]`.
#[derive(Debug, Clone)]
pub struct BarSeries {
    /// Legend entry; unnamed series get no legend.
    pub name: Option<String>,
    pub colors: Vec<RGBColor>,
    pub values: Vec<f64>,
}

/// A grouped bar chart: one cluster per category, one bar per series.
#[derive(Debug, Clone)]
pub struct BarPanel {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
    pub y_max: f64,
    /// Print `"{:.1}%"` above each bar.
    pub value_labels: bool,
}

impl BarPanel {
    /// Upper y bound: the configured maximum, stretched to fit the tallest bar.
    fn y_upper(&self) -> f64 {
        let tallest = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0_f64, f64::max);
        if tallest > self.y_max {
            tallest * 1.1
        } else {
            self.y_max.max(1.0)
        }
    }
}

/// Build the six panels in display order (row-major, 2 x 3).
pub fn build_panels(data: &ChartData, metrics: &MetricsReport) -> Vec<BarPanel> {
    let groups = vec![data.group_a.label.clone(), data.group_b.label.clone()];
    let risk_levels: Vec<String> = SCORE_CATEGORIES.iter().map(|s| s.to_string()).collect();
    let pct = |v: f64| v * 100.0;

    let per_level = |values: [[f64; 3]; 2]| -> Vec<BarSeries> {
        (0..3)
            .map(|level| BarSeries {
                name: Some(risk_levels[level].clone()),
                colors: vec![RISK_COLORS[level]],
                values: values.iter().map(|group| group[level]).collect(),
            })
            .collect()
    };

    let rate_series = |a: f64, b: f64, colors: Vec<RGBColor>| {
        vec![BarSeries {
            name: None,
            colors,
            values: vec![pct(a), pct(b)],
        }]
    };

    vec![
        BarPanel {
            title: "Risk Score Distribution by Race".to_string(),
            x_desc: "Race".to_string(),
            y_desc: "Percentage (%)".to_string(),
            categories: groups.clone(),
            series: per_level([data.group_a.score_distribution, data.group_b.score_distribution]),
            y_max: 100.0,
            value_labels: false,
        },
        BarPanel {
            title: "High Risk Classification Rate".to_string(),
            x_desc: String::new(),
            y_desc: "Percentage (%)".to_string(),
            categories: groups.clone(),
            series: rate_series(
                metrics.group_a.high_risk_rate,
                metrics.group_b.high_risk_rate,
                vec![GROUP_A_COLOR, GROUP_B_COLOR],
            ),
            y_max: 100.0,
            value_labels: true,
        },
        BarPanel {
            title: "False Positive Rate (high risk, did NOT recidivate)".to_string(),
            x_desc: String::new(),
            y_desc: "Percentage (%)".to_string(),
            categories: groups.clone(),
            series: rate_series(
                metrics.group_a.false_positive_rate,
                metrics.group_b.false_positive_rate,
                vec![GROUP_A_COLOR, GROUP_B_COLOR],
            ),
            y_max: 60.0,
            value_labels: true,
        },
        BarPanel {
            title: "False Negative Rate (low risk, DID recidivate)".to_string(),
            x_desc: String::new(),
            y_desc: "Percentage (%)".to_string(),
            categories: groups.clone(),
            series: rate_series(
                metrics.group_a.false_negative_rate,
                metrics.group_b.false_negative_rate,
                vec![FNR_A_COLOR, FNR_B_COLOR],
            ),
            y_max: 60.0,
            value_labels: true,
        },
        BarPanel {
            title: "Decile Score Distribution".to_string(),
            x_desc: "Decile Score (1-10)".to_string(),
            y_desc: "Frequency".to_string(),
            categories: (1..=10).map(|d| d.to_string()).collect(),
            series: [&data.group_a, &data.group_b]
                .into_iter()
                .zip([GROUP_A_COLOR, GROUP_B_COLOR])
                .map(|(group, color)| BarSeries {
                    name: Some(group.label.clone()),
                    colors: vec![color],
                    values: group.decile_counts.iter().map(|c| *c as f64).collect(),
                })
                .collect(),
            y_max: 1.0,
            value_labels: false,
        },
        BarPanel {
            title: "Actual Recidivism Rate by Risk Score".to_string(),
            x_desc: "Race".to_string(),
            y_desc: "Recidivism Rate (%)".to_string(),
            categories: groups,
            series: per_level([data.group_a.recid_by_score, data.group_b.recid_by_score]),
            y_max: 100.0,
            value_labels: false,
        },
    ]
}

/// Render all panels into a PNG at `path`, creating parent directories.
pub fn render_charts(
    path: &Path,
    data: &ChartData,
    metrics: &MetricsReport,
    config: &ChartConfig,
) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;
    let root = root
        .titled(
            "COMPAS Racial Bias Analysis",
            ("sans-serif", 32).into_font().style(FontStyle::Bold),
        )
        .map_err(chart_error)?;

    let areas = root.split_evenly((2, 3));
    for (area, panel) in areas.iter().zip(build_panels(data, metrics)) {
        draw_bar_panel(area, &panel)?;
    }

    root.present().map_err(chart_error)?;
    Ok(())
}

fn draw_bar_panel<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, panel: &BarPanel) -> Result<()> {
    let n = panel.categories.len().max(1);
    let x_range = -0.5..(n as f64 - 0.5);
    let y_max = panel.y_upper();

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 18).into_font().style(FontStyle::Bold))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(x_range, 0.0..y_max)
        .map_err(chart_error)?;

    let categories = panel.categories.clone();
    let label_for = move |x: &f64| {
        let idx = x.round();
        if (x - idx).abs() < 1e-6 && idx >= 0.0 && (idx as usize) < categories.len() {
            categories[idx as usize].clone()
        } else {
            String::new()
        }
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(2 * n + 1)
        .x_label_formatter(&label_for)
        .x_desc(panel.x_desc.as_str())
        .y_desc(panel.y_desc.as_str())
        .draw()
        .map_err(chart_error)?;

    let slots = panel.series.len().max(1) as f64;
    let width = 0.8 / slots;

    for (slot, series) in panel.series.iter().enumerate() {
        let bars: Vec<(f64, f64, f64, RGBColor)> = series
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let x0 = i as f64 - 0.4 + slot as f64 * width;
                let color = series.colors[i % series.colors.len().max(1)];
                (x0, x0 + width, *v, color)
            })
            .collect();

        let drawn = chart
            .draw_series(
                bars.iter()
                    .map(|(x0, x1, v, color)| Rectangle::new([(*x0, 0.0), (*x1, *v)], color.filled())),
            )
            .map_err(chart_error)?;

        if let (Some(name), Some(color)) = (&series.name, series.colors.first().copied()) {
            drawn
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        if panel.value_labels {
            chart
                .draw_series(bars.iter().map(|(x0, x1, v, _)| {
                    Text::new(
                        format!("{:.1}%", v),
                        ((x0 + x1) / 2.0 - width / 4.0, v + y_max * 0.02),
                        ("sans-serif", 14).into_font(),
                    )
                }))
                .map_err(chart_error)?;
        }
    }

    if panel.series.iter().any(|s| s.name.is_some()) {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(chart_error)?;
    }

    Ok(())
}

fn chart_error<E: std::fmt::Display>(err: E) -> AuditError {
    AuditError::ChartRenderFailed(err.to_string())
}
