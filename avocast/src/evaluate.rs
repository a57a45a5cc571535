//! Forecast evaluation against held-out observations

use crate::error::{AvocastError, Result};
use crate::models::Prediction;
use crate::series::PriceSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// What to do with MAPE when an actual value is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapePolicy {
    /// Stop with a division-by-zero error
    #[default]
    Fail,
    /// Leave MAPE unset and count the zero actuals
    ReportGap,
}

/// Evaluation of a single held-out date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointEvaluation {
    #[serde(rename = "ds")]
    pub date: NaiveDate,
    pub actual: f64,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
    /// actual - predicted
    pub residual: f64,
    pub absolute_error: f64,
    /// |residual| / |actual| * 100, unset when actual is zero
    pub percentage_error: Option<f64>,
    /// actual lies inside [lower, upper]
    pub covered: bool,
}

/// Aggregate forecast performance metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error
    pub mape: Option<f64>,
    /// Share of points inside their prediction interval
    pub coverage_rate: f64,
    /// Points with complete data
    pub evaluated: usize,
    /// Points left out because the prediction had non-finite values
    pub excluded: usize,
    /// Points with a zero actual value
    pub zero_actuals: usize,
}

impl fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Forecast Performance Metrics:")?;
        writeln!(f, "  MAE:      {:.4}", self.mae)?;
        writeln!(f, "  MSE:      {:.4}", self.mse)?;
        writeln!(f, "  RMSE:     {:.4}", self.rmse)?;
        match self.mape {
            Some(mape) => writeln!(f, "  MAPE:     {:.4}%", mape)?,
            None => writeln!(f, "  MAPE:     n/a ({} zero actuals)", self.zero_actuals)?,
        }
        writeln!(f, "  Coverage: {:.2}%", self.coverage_rate * 100.0)?;
        writeln!(
            f,
            "  Points:   {} evaluated, {} excluded",
            self.evaluated, self.excluded
        )?;
        Ok(())
    }
}

/// Per-point evaluations plus aggregate metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub points: Vec<PointEvaluation>,
    pub metrics: ForecastMetrics,
}

fn index_by_date(predictions: &[Prediction]) -> Result<HashMap<NaiveDate, Prediction>> {
    let mut by_date = HashMap::with_capacity(predictions.len());
    for prediction in predictions {
        if by_date.insert(prediction.date, *prediction).is_some() {
            return Err(AvocastError::Alignment {
                date: prediction.date.to_string(),
                reason: "duplicate prediction date".to_string(),
            });
        }
    }
    Ok(by_date)
}

/// Pick the predictions for the test dates out of a longer forecast
pub fn align_predictions(test: &PriceSeries, predictions: &[Prediction]) -> Result<Vec<Prediction>> {
    let by_date = index_by_date(predictions)?;
    test.observations()
        .iter()
        .map(|obs| {
            by_date
                .get(&obs.date)
                .copied()
                .ok_or_else(|| AvocastError::Alignment {
                    date: obs.date.to_string(),
                    reason: format!("forecast has no prediction for {}", test.key()),
                })
        })
        .collect()
}

/// Evaluate `predictions` against the held-out `test` series.
///
/// Prediction dates must match the test dates exactly. Predictions with
/// non-finite values are excluded from the aggregates and counted.
pub fn evaluate(
    test: &PriceSeries,
    predictions: &[Prediction],
    policy: MapePolicy,
) -> Result<EvaluationResult> {
    let by_date = index_by_date(predictions)?;

    if let Some(obs) = test
        .observations()
        .iter()
        .find(|obs| !by_date.contains_key(&obs.date))
    {
        return Err(AvocastError::Alignment {
            date: obs.date.to_string(),
            reason: "test observation has no prediction".to_string(),
        });
    }
    let mut extra: Vec<NaiveDate> = by_date
        .keys()
        .filter(|date| test.value_at(**date).is_none())
        .copied()
        .collect();
    extra.sort();
    if let Some(date) = extra.first() {
        return Err(AvocastError::Alignment {
            date: date.to_string(),
            reason: format!("prediction has no test observation ({} extra)", extra.len()),
        });
    }

    let mut points = Vec::with_capacity(test.len());
    let mut excluded = 0usize;
    let mut zero_actuals = 0usize;

    for obs in test.observations() {
        let prediction = by_date[&obs.date];
        if !prediction.is_complete() {
            warn!(date = %obs.date, "Prediction has non-finite values, excluded from metrics");
            excluded += 1;
            continue;
        }
        prediction.validate()?;

        let residual = obs.value - prediction.point;
        let absolute_error = residual.abs();
        let percentage_error = if obs.value == 0.0 {
            match policy {
                MapePolicy::Fail => return Err(AvocastError::DivisionByZero { date: obs.date }),
                MapePolicy::ReportGap => {
                    zero_actuals += 1;
                    None
                }
            }
        } else {
            Some(absolute_error / obs.value.abs() * 100.0)
        };

        points.push(PointEvaluation {
            date: obs.date,
            actual: obs.value,
            predicted: prediction.point,
            lower: prediction.lower,
            upper: prediction.upper,
            residual,
            absolute_error,
            percentage_error,
            covered: obs.value >= prediction.lower && obs.value <= prediction.upper,
        });
    }

    if points.is_empty() {
        return Err(AvocastError::Alignment {
            date: test
                .first_date()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            reason: format!("no complete predictions for {}", test.key()),
        });
    }

    let n = points.len() as f64;
    let mae = points.iter().map(|p| p.absolute_error).sum::<f64>() / n;
    let mse = points.iter().map(|p| p.residual.powi(2)).sum::<f64>() / n;
    let mape = if zero_actuals > 0 {
        None
    } else {
        Some(points.iter().filter_map(|p| p.percentage_error).sum::<f64>() / n)
    };
    let coverage_rate = points.iter().filter(|p| p.covered).count() as f64 / n;

    let metrics = ForecastMetrics {
        mae,
        mse,
        rmse: mse.sqrt(),
        mape,
        coverage_rate,
        evaluated: points.len(),
        excluded,
        zero_actuals,
    };

    Ok(EvaluationResult { points, metrics })
}
