//! Chart generation.
//!
//! [`ChartData`] aggregates the clean dataset for the distribution panels;
//! [`render_charts`] draws the six-panel figure (2 x 3 grid) with `plotters`:
//!
//! 1. risk score distribution by group
//! 2. high-risk classification rate
//! 3. false positive rate
//! 4. false negative rate
//! 5. decile score histogram
//! 6. actual recidivism rate by risk score

mod data;
mod render;

pub use data::{ChartData, GroupChartData};
pub use render::{BarPanel, BarSeries, build_panels, render_charts};
