//! Ordinary least-squares line fit for trend estimation.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// A fitted line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineFit {
    /// Change in y per unit of x
    pub slope: f64,
    /// Value of the line at x = 0
    pub intercept: f64,
    /// Standard deviation of the residuals (n - 2 degrees of freedom)
    pub residual_std: f64,
}

impl LineFit {
    /// Evaluate the line at `x`
    pub fn value_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a least-squares line through the points `(xs[i], ys[i])`.
///
/// Needs at least two points with distinct x values. With exactly two points
/// the residual standard deviation is zero.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Result<LineFit> {
    if xs.len() != ys.len() {
        return Err(MathError::InvalidInput(format!(
            "x ({}) and y ({}) differ in length",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(MathError::InsufficientData(
            "Need at least 2 points for a line fit".to_string(),
        ));
    }

    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        numerator += (x - x_mean) * (y - y_mean);
        denominator += (x - x_mean) * (x - x_mean);
    }

    if denominator.abs() < 1e-10 {
        return Err(MathError::CalculationError(
            "Cannot calculate slope: x values are too similar".to_string(),
        ));
    }

    let slope = numerator / denominator;
    let intercept = y_mean - slope * x_mean;

    let residual_std = if xs.len() > 2 {
        let ss_residual: f64 = xs
            .iter()
            .zip(ys)
            .map(|(&x, &y)| (y - (slope * x + intercept)).powi(2))
            .sum();
        (ss_residual / (n - 2.0)).sqrt()
    } else {
        0.0
    };

    Ok(LineFit {
        slope,
        intercept,
        residual_std,
    })
}
