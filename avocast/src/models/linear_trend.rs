//! Baseline forecasting engine: linear trend with week-of-year seasonality

use crate::error::{AvocastError, Result};
use crate::holidays::HolidayTable;
use crate::models::{ForecastModel, ModelConfig, Prediction, SeasonalityMode, TrainedForecastModel};
use crate::series::PriceSeries;
use chrono::{Datelike, NaiveDate};
use series_math::{fit_line, LineFit};
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::HashMap;

/// Least-squares trend model.
///
/// Components, all estimated from the training series:
/// - a straight-line trend over days since the first observation;
/// - with `yearly_seasonality`, one effect per ISO week, additive or
///   multiplicative per `seasonality_mode`;
/// - one additive offset per holiday name, the mean remaining residual of
///   training dates inside that holiday's effect windows.
///
/// The interval is symmetric and normal with the residual spread. Weekly and
/// daily seasonality have nothing to act on at one observation per week and
/// are ignored, as are the prior scales.
#[derive(Debug, Clone)]
pub struct LinearTrendModel {
    name: String,
}

/// Fitted state of a [`LinearTrendModel`]
#[derive(Debug, Clone)]
pub struct TrainedLinearTrend {
    origin: NaiveDate,
    line: LineFit,
    mode: SeasonalityMode,
    seasonal: HashMap<u32, f64>,
    holidays: Option<HolidayTable>,
    holiday_offsets: HashMap<String, f64>,
    residual_std: f64,
    z_score: f64,
}

impl LinearTrendModel {
    pub fn new() -> Self {
        Self {
            name: "Linear Trend".to_string(),
        }
    }
}

impl Default for LinearTrendModel {
    fn default() -> Self {
        Self::new()
    }
}

fn days_since(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

impl ForecastModel for LinearTrendModel {
    type Trained = TrainedLinearTrend;

    fn name(&self) -> &str {
        &self.name
    }

    fn train(
        &self,
        train: &PriceSeries,
        holidays: Option<&HolidayTable>,
        config: &ModelConfig,
    ) -> Result<Self::Trained> {
        config.validate()?;
        let origin = train.first_date().ok_or_else(|| {
            AvocastError::ModelError(format!("Empty training series {}", train.key()))
        })?;

        let observations = train.observations();
        let xs: Vec<f64> = observations
            .iter()
            .map(|obs| days_since(origin, obs.date))
            .collect();
        let ys = train.values();
        let line = fit_line(&xs, &ys)?;

        let mut seasonal = HashMap::new();
        if config.yearly_seasonality {
            let mut by_week: HashMap<u32, Vec<f64>> = HashMap::new();
            for (obs, &x) in observations.iter().zip(&xs) {
                let trend = line.value_at(x);
                let effect = match config.seasonality_mode {
                    SeasonalityMode::Additive => obs.value - trend,
                    SeasonalityMode::Multiplicative if trend > 0.0 => obs.value / trend,
                    SeasonalityMode::Multiplicative => continue,
                };
                by_week
                    .entry(obs.date.iso_week().week())
                    .or_default()
                    .push(effect);
            }
            seasonal = by_week
                .into_iter()
                .map(|(week, effects)| (week, mean(&effects)))
                .collect();
        }

        let mut fitted = TrainedLinearTrend {
            origin,
            line,
            mode: config.seasonality_mode,
            seasonal,
            holidays: holidays.cloned(),
            holiday_offsets: HashMap::new(),
            residual_std: 0.0,
            z_score: 0.0,
        };

        if let Some(table) = holidays {
            let mut by_name: HashMap<String, Vec<f64>> = HashMap::new();
            for obs in observations {
                let residual = obs.value - fitted.base_value(obs.date);
                let mut names: Vec<&str> =
                    table.active_on(obs.date).map(|e| e.name.as_str()).collect();
                names.sort_unstable();
                names.dedup();
                for name in names {
                    by_name.entry(name.to_string()).or_default().push(residual);
                }
            }
            fitted.holiday_offsets = by_name
                .into_iter()
                .map(|(name, residuals)| (name, mean(&residuals)))
                .collect();
        }

        let residuals: Vec<f64> = observations
            .iter()
            .map(|obs| obs.value - fitted.point(obs.date))
            .collect();
        fitted.residual_std = if residuals.len() > 2 {
            (residuals.iter().map(|r| r * r).sum::<f64>() / (residuals.len() - 2) as f64).sqrt()
        } else {
            0.0
        };

        let normal = Normal::new(0.0, 1.0).map_err(|e| AvocastError::ModelError(e.to_string()))?;
        fitted.z_score = normal.inverse_cdf(0.5 + config.interval_width / 2.0);

        Ok(fitted)
    }
}

impl TrainedLinearTrend {
    /// Trend with seasonality, before holiday offsets
    fn base_value(&self, date: NaiveDate) -> f64 {
        let trend = self.line.value_at(days_since(self.origin, date));
        let week = date.iso_week().week();
        match self.mode {
            SeasonalityMode::Additive => trend + self.seasonal.get(&week).copied().unwrap_or(0.0),
            SeasonalityMode::Multiplicative => {
                trend * self.seasonal.get(&week).copied().unwrap_or(1.0)
            }
        }
    }

    fn holiday_effect(&self, date: NaiveDate) -> f64 {
        let Some(table) = &self.holidays else {
            return 0.0;
        };
        let mut names: Vec<&str> = table.active_on(date).map(|e| e.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
            .into_iter()
            .filter_map(|name| self.holiday_offsets.get(name))
            .sum()
    }

    fn point(&self, date: NaiveDate) -> f64 {
        self.base_value(date) + self.holiday_effect(date)
    }

    /// Fitted trend line (slope per day)
    pub fn line(&self) -> LineFit {
        self.line
    }

    /// Standard deviation of the training residuals
    pub fn residual_std(&self) -> f64 {
        self.residual_std
    }
}

impl TrainedForecastModel for TrainedLinearTrend {
    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<Prediction>> {
        let half_width = self.z_score * self.residual_std;
        Ok(dates
            .iter()
            .map(|&date| {
                let point = self.point(date);
                Prediction::new(date, point, point - half_width, point + half_width)
            })
            .collect())
    }
}
