//! Quantile estimation with linear interpolation between order statistics.

use crate::{MathError, Result};

/// Quantile `q` of `values` using linear interpolation between the two
/// bracketing order statistics (position `q * (n - 1)` on the sorted data).
///
/// `values` need not be sorted. `q` must lie in `[0, 1]`.
pub fn quantile_linear(values: &[f64], q: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take a quantile of an empty sample".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Quantile must be between 0 and 1, got {}",
            q
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Sample contains non-finite values".to_string(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile_linear(&values, 0.5).unwrap(), 3.0);
        assert!((quantile_linear(&values, 0.8).unwrap() - 4.2).abs() < 1e-12);
        assert_eq!(quantile_linear(&values, 0.0).unwrap(), 1.0);
        assert_eq!(quantile_linear(&values, 1.0).unwrap(), 5.0);
    }

    #[test]
    fn test_quantile_unsorted_input() {
        let values = [40.0, 10.0, 30.0, 20.0];
        // position 0.25 * 3 = 0.75 between 10 and 20
        assert_eq!(quantile_linear(&values, 0.25).unwrap(), 17.5);
    }

    #[test]
    fn test_quantile_errors() {
        assert!(quantile_linear(&[], 0.5).is_err());
        assert!(quantile_linear(&[1.0], 1.5).is_err());
        assert!(quantile_linear(&[1.0, f64::NAN], 0.5).is_err());
    }
}
