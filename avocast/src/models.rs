//! Forecasting model boundary
//!
//! The pipeline never looks inside a model. It hands a training series, an
//! optional holiday table and a [`ModelConfig`] to [`ForecastModel::train`],
//! then asks the trained model for [`Prediction`]s on explicit dates.

use crate::error::{AvocastError, Result};
use crate::holidays::HolidayTable;
use crate::series::PriceSeries;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// How seasonal effects combine with the trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    #[default]
    Additive,
    Multiplicative,
}

/// Options understood by forecasting engines.
///
/// Engines may ignore options they have no use for, but every value is
/// validated before training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub yearly_seasonality: bool,
    pub weekly_seasonality: bool,
    pub daily_seasonality: bool,
    pub seasonality_mode: SeasonalityMode,
    /// Flexibility of trend changes
    pub changepoint_prior_scale: f64,
    /// Strength of holiday effects
    pub holidays_prior_scale: f64,
    /// Strength of seasonal effects
    pub seasonality_prior_scale: f64,
    /// Coverage of the prediction interval, in (0, 1)
    pub interval_width: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            yearly_seasonality: true,
            weekly_seasonality: true,
            // Weekly data carries no intra-day signal.
            daily_seasonality: false,
            seasonality_mode: SeasonalityMode::Additive,
            changepoint_prior_scale: 0.05,
            holidays_prior_scale: 10.0,
            seasonality_prior_scale: 10.0,
            interval_width: 0.80,
        }
    }
}

impl ModelConfig {
    /// Validate option ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(AvocastError::InvalidParameter(format!(
                "interval_width must be between 0 and 1, got {}",
                self.interval_width
            )));
        }
        for (name, value) in [
            ("changepoint_prior_scale", self.changepoint_prior_scale),
            ("holidays_prior_scale", self.holidays_prior_scale),
            ("seasonality_prior_scale", self.seasonality_prior_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(AvocastError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// A point forecast with its prediction interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "ds")]
    pub date: NaiveDate,
    #[serde(rename = "yhat")]
    pub point: f64,
    #[serde(rename = "yhat_lower")]
    pub lower: f64,
    #[serde(rename = "yhat_upper")]
    pub upper: f64,
}

impl Prediction {
    pub fn new(date: NaiveDate, point: f64, lower: f64, upper: f64) -> Self {
        Self {
            date,
            point,
            lower,
            upper,
        }
    }

    /// Whether every field is a finite number
    pub fn is_complete(&self) -> bool {
        self.point.is_finite() && self.lower.is_finite() && self.upper.is_finite()
    }

    /// Width of the prediction interval
    pub fn interval_width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Check `lower <= point <= upper` on finite values
    pub fn validate(&self) -> Result<()> {
        if !self.is_complete() {
            return Err(AvocastError::InvalidPrediction {
                date: self.date,
                reason: "non-finite value".to_string(),
            });
        }
        if self.lower > self.point || self.point > self.upper {
            return Err(AvocastError::InvalidPrediction {
                date: self.date,
                reason: format!(
                    "expected lower <= point <= upper, got {} / {} / {}",
                    self.lower, self.point, self.upper
                ),
            });
        }
        Ok(())
    }
}

/// Common interface for forecasting engines
pub trait ForecastModel {
    /// The fitted state produced by training
    type Trained: TrainedForecastModel;

    /// Get the model name
    fn name(&self) -> &str;

    /// Fit the model to a training series
    fn train(
        &self,
        train: &PriceSeries,
        holidays: Option<&HolidayTable>,
        config: &ModelConfig,
    ) -> Result<Self::Trained>;
}

/// A fitted forecasting model
pub trait TrainedForecastModel {
    /// Predict the value and interval on each date, in the order given
    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<Prediction>>;
}

/// `periods` dates following `last`, `period` apart
pub fn future_dates(last: NaiveDate, periods: usize, period: Duration) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(periods);
    let mut current = last;
    for step in 1..=periods {
        current = current.checked_add_signed(period).ok_or_else(|| {
            AvocastError::InvalidParameter(format!(
                "Horizon step {} of {} after {} is past the last representable date",
                step, period, last
            ))
        })?;
        dates.push(current);
    }
    Ok(dates)
}

/// The history's own dates followed by `periods` future dates
pub fn forecast_dates(
    history: &PriceSeries,
    periods: usize,
    period: Duration,
) -> Result<Vec<NaiveDate>> {
    let mut dates = history.dates();
    if let Some(last) = history.last_date() {
        dates.extend(future_dates(last, periods, period)?);
    }
    Ok(dates)
}

pub mod linear_trend;

pub use linear_trend::{LinearTrendModel, TrainedLinearTrend};
