//! Rendering boundary
//!
//! Charts are drawn by a caller-supplied [`Renderer`]. All figure settings
//! travel in a [`RenderConfig`] value; nothing here keeps global plotting
//! state.

use crate::error::Result;
use crate::evaluate::EvaluationResult;
use crate::models::Prediction;
use crate::series::PriceSeries;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Figure settings passed to every render call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
    pub title_prefix: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 12,
            height: 8,
            dpi: 300,
            title_prefix: "AvoCast".to_string(),
        }
    }
}

/// Charts a pipeline run can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Actual against predicted over the held-out range, with interval band
    TestPerformance,
    /// Residuals over time and their distribution
    Residuals,
    /// Mean absolute error per calendar month
    MonthlyError,
    /// Interval width over time
    IntervalWidth,
    /// History plus future horizon
    Forecast,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::TestPerformance,
        ChartKind::Residuals,
        ChartKind::MonthlyError,
        ChartKind::IntervalWidth,
        ChartKind::Forecast,
    ];

    /// Default file name for the chart
    pub fn file_name(&self) -> &'static str {
        match self {
            ChartKind::TestPerformance => "test_performance.png",
            ChartKind::Residuals => "model_diagnostics.png",
            ChartKind::MonthlyError => "performance_metrics.png",
            ChartKind::IntervalWidth => "forecast_uncertainty.png",
            ChartKind::Forecast => "forecast_plot.png",
        }
    }
}

/// Borrowed data a renderer draws from
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub train: &'a PriceSeries,
    pub test: &'a PriceSeries,
    pub forecast: &'a [Prediction],
    pub evaluation: &'a EvaluationResult,
}

/// Turns pipeline output into image files
pub trait Renderer {
    /// Draw one chart into `output_dir` and return the written path
    fn render(
        &self,
        kind: ChartKind,
        input: &RenderInput<'_>,
        config: &RenderConfig,
        output_dir: &Path,
    ) -> Result<PathBuf>;
}

/// Draw every chart kind in order, stopping at the first failure
pub fn render_all(
    renderer: &dyn Renderer,
    input: &RenderInput<'_>,
    config: &RenderConfig,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    ChartKind::ALL
        .iter()
        .map(|kind| renderer.render(*kind, input, config, output_dir))
        .collect()
}
