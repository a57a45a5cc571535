//! # AvoCast
//!
//! Data preparation and forecast evaluation for weekly avocado prices.
//!
//! ## Features
//!
//! - Market table loading with column detection (`Date`, `AveragePrice`, `type`, `region`)
//! - Region/category series selection with explicit fallback strategies
//! - Weekly grid normalization with time-based linear interpolation
//! - Quantile-based temporal train/test split
//! - Holiday table construction from declarative rules
//! - Point and interval forecast evaluation (MAE, MSE, RMSE, MAPE, coverage)
//! - Diagnostic views over residuals, monthly error and interval width
//!
//! The forecasting engine sits behind the [`ForecastModel`] trait. A simple
//! trend plus seasonality baseline, [`LinearTrendModel`], ships with the crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use avocast::{DataLoader, LinearTrendModel, Pipeline, PipelineConfig};
//!
//! let table = DataLoader::from_csv("avocado.csv")?;
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let output = pipeline.run(&table, &LinearTrendModel::new())?;
//!
//! println!("{}", output.evaluation.metrics);
//! output.write_artifacts("output")?;
//! # Ok::<(), avocast::AvocastError>(())
//! ```

pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod evaluate;
pub mod export;
pub mod holidays;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod selector;
pub mod series;
pub mod split;

// Re-export commonly used types
pub use crate::config::PipelineConfig;
pub use crate::data::{DataLoader, MarketRecord, MarketTable};
pub use crate::diagnostics::DiagnosticsReport;
pub use crate::error::{AvocastError, Result};
pub use crate::evaluate::{evaluate, EvaluationResult, ForecastMetrics, MapePolicy};
pub use crate::holidays::{
    EffectWindow, HolidayCalendar, HolidayEvent, HolidayRule, HolidayTable, HolidayTableBuilder,
    UsFederalCalendar,
};
pub use crate::models::{
    ForecastModel, LinearTrendModel, ModelConfig, Prediction, TrainedForecastModel,
};
pub use crate::normalize::normalize;
pub use crate::pipeline::{Pipeline, PipelineOutput};
pub use crate::selector::{select_series, MatchStrategy, Selection, SelectionPolicy};
pub use crate::series::{Observation, PriceSeries, SeriesKey};
pub use crate::split::{split_at_quantile, SeriesSplit};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
