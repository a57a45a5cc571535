//! Temporal train/test split at a quantile of the timestamps

use crate::error::{AvocastError, Result};
use crate::series::{Observation, PriceSeries};
use chrono::{DateTime, NaiveDateTime, NaiveTime};
use series_math::quantile_linear;

/// Share of the timeline used for training by default
pub const DEFAULT_SPLIT_QUANTILE: f64 = 0.8;

/// A borrowed train/test view over a series.
///
/// `train` holds every observation dated at or before `cutoff`, `test` every
/// observation after it. Both are non-empty and contiguous.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSplit<'a> {
    source: &'a PriceSeries,
    /// Training observations
    pub train: &'a [Observation],
    /// Held-out observations
    pub test: &'a [Observation],
    /// Timestamp at the requested quantile
    pub cutoff: NaiveDateTime,
    /// Quantile the cutoff was computed at
    pub quantile: f64,
}

impl<'a> SeriesSplit<'a> {
    /// The series this split is a view of
    pub fn source(&self) -> &'a PriceSeries {
        self.source
    }

    /// Copy the training range into its own series
    pub fn train_series(&self) -> Result<PriceSeries> {
        PriceSeries::new(self.source.key().clone(), self.train.to_vec())
    }

    /// Copy the held-out range into its own series
    pub fn test_series(&self) -> Result<PriceSeries> {
        PriceSeries::new(self.source.key().clone(), self.test.to_vec())
    }
}

/// Split `series` at the `q` quantile of its timestamps.
///
/// The cutoff is interpolated linearly between the two bracketing timestamps,
/// so it may fall between observation dates.
pub fn split_at_quantile(series: &PriceSeries, q: f64) -> Result<SeriesSplit<'_>> {
    let key = series.key().to_string();
    if !(q > 0.0 && q < 1.0) {
        return Err(AvocastError::Split {
            key,
            reason: format!("quantile must be strictly between 0 and 1, got {}", q),
        });
    }
    if series.len() < 2 {
        return Err(AvocastError::Split {
            key,
            reason: format!("need at least 2 observations, got {}", series.len()),
        });
    }

    let seconds: Vec<f64> = series
        .observations()
        .iter()
        .map(|obs| obs.date.and_time(NaiveTime::MIN).and_utc().timestamp() as f64)
        .collect();
    let cutoff_seconds = quantile_linear(&seconds, q)?.floor() as i64;
    let cutoff = DateTime::from_timestamp(cutoff_seconds, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| AvocastError::Split {
            key: key.clone(),
            reason: format!("cutoff {} is out of range", cutoff_seconds),
        })?;

    let observations = series.observations();
    let boundary = observations.partition_point(|obs| obs.date.and_time(NaiveTime::MIN) <= cutoff);
    let (train, test) = observations.split_at(boundary);

    if train.is_empty() || test.is_empty() {
        return Err(AvocastError::Split {
            key,
            reason: format!(
                "quantile {} leaves {} training and {} test observations",
                q,
                train.len(),
                test.len()
            ),
        });
    }

    Ok(SeriesSplit {
        source: series,
        train,
        test,
        cutoff,
        quantile: q,
    })
}
