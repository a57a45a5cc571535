//! Price series types shared by every pipeline stage

use crate::error::{AvocastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single dated price observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Date of the observation
    pub date: NaiveDate,
    /// Observed price
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Identifies one series inside a multi-series table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    /// Region name as it appears in the source table
    pub region: String,
    /// Product category, e.g. "conventional" or "organic"
    pub category: String,
}

impl SeriesKey {
    pub fn new(region: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            category: category.into(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.category)
    }
}

/// A time-ordered price series for one region and category.
///
/// Dates are strictly increasing and values are finite and non-negative.
/// The series cannot be mutated once built; every stage derives a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    key: SeriesKey,
    observations: Vec<Observation>,
}

impl PriceSeries {
    /// Create a series from observations that are already in date order
    pub fn new(key: SeriesKey, observations: Vec<Observation>) -> Result<Self> {
        for obs in &observations {
            if !obs.value.is_finite() || obs.value < 0.0 {
                return Err(AvocastError::DataError(format!(
                    "Series {} has invalid price {} at {}",
                    key, obs.value, obs.date
                )));
            }
        }

        if let Some(pair) = observations.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(AvocastError::DataError(format!(
                "Series {} is not strictly increasing at {} (previous {})",
                key, pair[1].date, pair[0].date
            )));
        }

        Ok(Self { key, observations })
    }

    /// Create a series from observations in any order.
    ///
    /// Duplicate dates are still rejected.
    pub fn from_unsorted(key: SeriesKey, mut observations: Vec<Observation>) -> Result<Self> {
        observations.sort_by_key(|obs| obs.date);
        Self::new(key, observations)
    }

    /// Get the series key
    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    /// Get the observations in date order
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Get the dates as a vector
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|obs| obs.date).collect()
    }

    /// Get the prices as a vector
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|obs| obs.value).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|obs| obs.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|obs| obs.date)
    }

    /// Look up the value observed on `date`
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.observations
            .binary_search_by_key(&date, |obs| obs.date)
            .ok()
            .map(|idx| self.observations[idx].value)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
