//! Error types for the avocast crate

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use series_math::MathError;
use thiserror::Error;

/// Custom error types for the avocast crate
#[derive(Debug, Error)]
pub enum AvocastError {
    /// No series matches the requested region/category
    #[error("Selection error for region '{region}', category '{category}': {reason}")]
    Selection {
        region: String,
        category: String,
        reason: String,
    },

    /// A grid date could not be filled because it lies outside the known values
    #[error("Interpolation error for {key} at {date}: no known value on both sides")]
    Interpolation { key: String, date: NaiveDate },

    /// The temporal split produced a degenerate partition
    #[error("Split error for {key}: {reason}")]
    Split { key: String, reason: String },

    /// A holiday rule never resolved to a date
    #[error("Rule resolution error for '{rule}': {reason}")]
    RuleResolution { rule: String, reason: String },

    /// Predictions and ground truth do not cover the same dates
    #[error("Alignment error at {date}: {reason}")]
    Alignment { date: String, reason: String },

    /// MAPE requested with a zero actual value
    #[error("Division by zero: actual value is zero at {date}")]
    DivisionByZero { date: NaiveDate },

    /// A prediction violates lower <= point <= upper
    #[error("Invalid prediction at {date}: {reason}")]
    InvalidPrediction { date: NaiveDate, reason: String },

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error related to data validation or loading
    #[error("Data error: {0}")]
    DataError(String),

    /// Error raised by a forecasting engine
    #[error("Model error: {0}")]
    ModelError(String),

    /// Error from numeric kernels
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV serialization
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

impl AvocastError {
    /// Name of the pipeline stage that raises this kind of error
    pub fn stage(&self) -> &'static str {
        match self {
            AvocastError::Selection { .. } => "selection",
            AvocastError::Interpolation { .. } => "normalization",
            AvocastError::Split { .. } => "split",
            AvocastError::RuleResolution { .. } => "holidays",
            AvocastError::Alignment { .. }
            | AvocastError::DivisionByZero { .. }
            | AvocastError::InvalidPrediction { .. } => "evaluation",
            AvocastError::ModelError(_) => "model",
            AvocastError::InvalidParameter(_) => "configuration",
            AvocastError::DataError(_)
            | AvocastError::PolarsError(_)
            | AvocastError::CsvError(_) => "data",
            AvocastError::MathError(_) => "math",
            AvocastError::IoError(_) | AvocastError::JsonError(_) => "io",
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, AvocastError>;

impl From<PolarsError> for AvocastError {
    fn from(err: PolarsError) -> Self {
        AvocastError::PolarsError(err.to_string())
    }
}
