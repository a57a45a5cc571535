//! Linear interpolation over an explicit x axis.
//!
//! Positions are real numbers (typically days since an epoch), so gaps of
//! uneven width are filled proportionally to their distance from each anchor.

use crate::{MathError, Result};

/// Interpolate the value at `x` on the line through `(x0, y0)` and `(x1, y1)`.
///
/// Returns `y0` when both anchors share the same position.
pub fn lerp(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    let span = x1 - x0;
    if span.abs() < f64::EPSILON {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / span
}

/// Fill missing values by linear interpolation between the nearest known
/// neighbours on the `xs` axis.
///
/// `xs` must be strictly increasing and the same length as `ys`. Known values
/// are returned untouched. A missing value without a known neighbour on both
/// sides yields [`MathError::BoundaryGap`]; no extrapolation is attempted.
pub fn fill_gaps(xs: &[f64], ys: &[Option<f64>]) -> Result<Vec<f64>> {
    if xs.len() != ys.len() {
        return Err(MathError::InvalidInput(format!(
            "Positions ({}) and values ({}) differ in length",
            xs.len(),
            ys.len()
        )));
    }
    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(MathError::InvalidInput(
            "Positions must be strictly increasing".to_string(),
        ));
    }

    let mut filled = Vec::with_capacity(ys.len());
    let mut previous: Option<usize> = None;

    for (i, value) in ys.iter().enumerate() {
        match value {
            Some(v) => {
                filled.push(*v);
                previous = Some(i);
            }
            None => {
                let before = previous.ok_or(MathError::BoundaryGap { index: i })?;
                let after = ys[i + 1..]
                    .iter()
                    .position(Option::is_some)
                    .map(|offset| i + 1 + offset)
                    .ok_or(MathError::BoundaryGap { index: i })?;

                let (y0, y1) = match (ys[before], ys[after]) {
                    (Some(y0), Some(y1)) => (y0, y1),
                    _ => return Err(MathError::BoundaryGap { index: i }),
                };
                filled.push(lerp(xs[before], y0, xs[after], y1, xs[i]));
            }
        }
    }

    Ok(filled)
}
