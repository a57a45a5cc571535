//! Date-grid normalization: one observation per period, gaps interpolated

use crate::error::{AvocastError, Result};
use crate::series::{Observation, PriceSeries};
use chrono::{Duration, NaiveDate};
use series_math::{fill_gaps, MathError};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Weekly grid used by the avocado data
pub const WEEKLY_PERIOD_DAYS: i64 = 7;

/// Result of normalizing a series onto a regular date grid
#[derive(Debug, Clone, PartialEq)]
pub struct Normalization {
    /// Series with exactly one observation per grid date
    pub series: PriceSeries,
    /// Grid dates whose values were interpolated
    pub filled: Vec<NaiveDate>,
    /// Source dates that did not fall on the grid and were not emitted
    pub off_grid: Vec<NaiveDate>,
}

/// Build the inclusive grid `start, start + period, ...` up to `end`
pub fn date_grid(start: NaiveDate, end: NaiveDate, period: Duration) -> Result<Vec<NaiveDate>> {
    if period.num_days() < 1 || period != Duration::days(period.num_days()) {
        return Err(AvocastError::InvalidParameter(format!(
            "Grid period must be a positive whole number of days, got {}",
            period
        )));
    }
    if start > end {
        return Err(AvocastError::InvalidParameter(format!(
            "Grid start {} is after grid end {}",
            start, end
        )));
    }

    let mut grid = Vec::new();
    let mut current = start;
    while current <= end {
        grid.push(current);
        // Stepping past the last representable date also ends the grid.
        match current.checked_add_signed(period) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(grid)
}

/// Place `series` on a regular grid of `period` between `bounds` (inclusive).
///
/// Bounds default to the first and last observation. Values already on the
/// grid are kept as they are; missing grid dates are interpolated linearly in
/// time between the nearest known observations. Grid dates before the first or
/// after the last observation cannot be filled and produce
/// [`AvocastError::Interpolation`].
pub fn normalize(
    series: &PriceSeries,
    period: Duration,
    bounds: Option<(NaiveDate, NaiveDate)>,
) -> Result<Normalization> {
    let (start, end) = match bounds {
        Some(bounds) => bounds,
        None => match (series.first_date(), series.last_date()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(AvocastError::DataError(format!(
                    "Cannot normalize empty series {}",
                    series.key()
                )))
            }
        },
    };

    let grid = date_grid(start, end, period)?;

    // Every known observation is an interpolation anchor, on the grid or not.
    let mut timeline: BTreeMap<NaiveDate, Option<f64>> = series
        .observations()
        .iter()
        .map(|obs| (obs.date, Some(obs.value)))
        .collect();
    for date in &grid {
        timeline.entry(*date).or_insert(None);
    }

    let dates: Vec<NaiveDate> = timeline.keys().copied().collect();
    let positions: Vec<f64> = dates.iter().map(|d| (*d - start).num_days() as f64).collect();
    let values: Vec<Option<f64>> = timeline.values().copied().collect();

    let filled_values = fill_gaps(&positions, &values).map_err(|err| match err {
        MathError::BoundaryGap { index } => AvocastError::Interpolation {
            key: series.key().to_string(),
            date: dates[index],
        },
        other => AvocastError::MathError(other),
    })?;

    let on_grid = |date: &NaiveDate| {
        *date >= start && *date <= end && (*date - start).num_days() % period.num_days() == 0
    };

    let mut observations = Vec::with_capacity(grid.len());
    let mut filled = Vec::new();
    let mut off_grid = Vec::new();
    for ((date, original), value) in dates.iter().zip(&values).zip(filled_values) {
        if on_grid(date) {
            if original.is_none() {
                filled.push(*date);
            }
            observations.push(Observation::new(*date, value));
        } else {
            off_grid.push(*date);
        }
    }

    if !off_grid.is_empty() {
        warn!(
            series = %series.key(),
            count = off_grid.len(),
            first = %off_grid[0],
            "Observations off the date grid were used as anchors but not kept"
        );
    }
    debug!(
        series = %series.key(),
        grid = grid.len(),
        filled = filled.len(),
        "Normalized series onto date grid"
    );

    Ok(Normalization {
        series: PriceSeries::new(series.key().clone(), observations)?,
        filled,
        off_grid,
    })
}
