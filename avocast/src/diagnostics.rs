//! Read-only diagnostic views over evaluation output

use crate::evaluate::{EvaluationResult, PointEvaluation};
use crate::models::Prediction;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use series_math::fit_line;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// A value attached to a date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DatedValue {
    #[serde(rename = "ds")]
    pub date: NaiveDate,
    pub value: f64,
}

/// Mean absolute error for one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyError {
    /// Calendar month, 1 to 12
    pub month: u32,
    pub mean_absolute_error: f64,
    pub count: usize,
}

/// Spread of the residuals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResidualSummary {
    pub mean: f64,
    /// Sample standard deviation; NaN for a single residual
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

fn sorted_points(evaluation: &EvaluationResult) -> Vec<PointEvaluation> {
    let mut points = evaluation.points.clone();
    points.sort_by_key(|p| p.date);
    points
}

/// Average absolute error grouped by calendar month, in month order
pub fn monthly_error(evaluation: &EvaluationResult) -> Vec<MonthlyError> {
    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for point in &evaluation.points {
        by_month
            .entry(point.date.month())
            .or_default()
            .push(point.absolute_error);
    }

    by_month
        .into_iter()
        .map(|(month, errors)| MonthlyError {
            month,
            mean_absolute_error: errors.iter().sum::<f64>() / errors.len() as f64,
            count: errors.len(),
        })
        .collect()
}

/// Residuals (actual - predicted) ordered by date
pub fn residuals_over_time(evaluation: &EvaluationResult) -> Vec<DatedValue> {
    sorted_points(evaluation)
        .into_iter()
        .map(|p| DatedValue {
            date: p.date,
            value: p.residual,
        })
        .collect()
}

/// Actual and predicted values with bounds, ordered by date
pub fn predictions_over_time(evaluation: &EvaluationResult) -> Vec<PointEvaluation> {
    sorted_points(evaluation)
}

/// Absolute percentage error by date; dates with a zero actual are skipped
pub fn accuracy_over_time(evaluation: &EvaluationResult) -> Vec<DatedValue> {
    sorted_points(evaluation)
        .into_iter()
        .filter_map(|p| {
            p.percentage_error.map(|value| DatedValue {
                date: p.date,
                value,
            })
        })
        .collect()
}

/// Interval width (upper - lower) for each prediction, ordered by date
pub fn interval_widths(predictions: &[Prediction]) -> Vec<DatedValue> {
    let mut widths: Vec<DatedValue> = predictions
        .iter()
        .filter(|p| p.is_complete())
        .map(|p| DatedValue {
            date: p.date,
            value: p.interval_width(),
        })
        .collect();
    widths.sort_by_key(|w| w.date);
    widths
}

/// Interval widths of the evaluated points
pub fn evaluation_interval_widths(evaluation: &EvaluationResult) -> Vec<DatedValue> {
    sorted_points(evaluation)
        .into_iter()
        .map(|p| DatedValue {
            date: p.date,
            value: p.upper - p.lower,
        })
        .collect()
}

/// Least-squares change in width per day; `None` with fewer than two dates
pub fn interval_width_trend(widths: &[DatedValue]) -> Option<f64> {
    let origin = widths.first()?.date;
    let xs: Vec<f64> = widths
        .iter()
        .map(|w| (w.date - origin).num_days() as f64)
        .collect();
    let ys: Vec<f64> = widths.iter().map(|w| w.value).collect();
    fit_line(&xs, &ys).ok().map(|fit| fit.slope)
}

/// Mean, spread and range of the residuals; `None` when nothing was evaluated
pub fn residual_summary(evaluation: &EvaluationResult) -> Option<ResidualSummary> {
    if evaluation.points.is_empty() {
        return None;
    }
    let residuals: Vec<f64> = evaluation.points.iter().map(|p| p.residual).collect();
    Some(ResidualSummary {
        mean: residuals.iter().mean(),
        std_dev: residuals.iter().std_dev(),
        min: Statistics::min(residuals.iter()),
        max: Statistics::max(residuals.iter()),
    })
}

/// Interval widths of the predictions strictly after `after`
pub fn future_uncertainty(forecast: &[Prediction], after: NaiveDate) -> Vec<DatedValue> {
    let future: Vec<Prediction> = forecast
        .iter()
        .filter(|p| p.date > after)
        .copied()
        .collect();
    interval_widths(&future)
}

/// All diagnostic views of one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsReport {
    pub monthly_error: Vec<MonthlyError>,
    pub residuals: Vec<DatedValue>,
    pub residual_summary: Option<ResidualSummary>,
    pub accuracy: Vec<DatedValue>,
    pub interval_widths: Vec<DatedValue>,
    pub interval_width_trend: Option<f64>,
    pub future_uncertainty: Vec<DatedValue>,
    pub future_width_trend: Option<f64>,
}

impl DiagnosticsReport {
    /// Build every view; `horizon_start` is the last held-out date
    pub fn build(
        evaluation: &EvaluationResult,
        forecast: &[Prediction],
        horizon_start: NaiveDate,
    ) -> Self {
        let interval_widths = evaluation_interval_widths(evaluation);
        let future_uncertainty = future_uncertainty(forecast, horizon_start);

        Self {
            monthly_error: monthly_error(evaluation),
            residuals: residuals_over_time(evaluation),
            residual_summary: residual_summary(evaluation),
            accuracy: accuracy_over_time(evaluation),
            interval_width_trend: interval_width_trend(&interval_widths),
            interval_widths,
            future_width_trend: interval_width_trend(&future_uncertainty),
            future_uncertainty,
        }
    }
}
