//! # Series Math
//!
//! Numeric kernels shared by the AvoCast pipeline.
//! This crate provides the small pieces of arithmetic the pipeline relies on:
//! linear interpolation on a time axis, linear quantile estimation and an
//! ordinary least-squares line fit.

use thiserror::Error;

pub mod interpolation;
pub mod quantile;
pub mod regression;

pub use interpolation::{fill_gaps, lerp};
pub use quantile::quantile_linear;
pub use regression::{fit_line, LineFit};

/// Errors that can occur in series calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No known value on both sides of position {index}")]
    BoundaryGap { index: usize },

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for series math operations
pub type Result<T> = std::result::Result<T, MathError>;
