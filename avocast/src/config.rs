//! Pipeline configuration
//!
//! Every section has defaults matching the weekly avocado study, so an empty
//! JSON object is a valid configuration:
//!
//! ```json
//! {
//!   "category": "conventional",
//!   "selection": { "strategies": [{ "strategy": "exact", "value": "TotalUS" }] },
//!   "split": { "quantile": 0.8 },
//!   "model": { "interval_width": 0.9 }
//! }
//! ```

use crate::data::ColumnOverrides;
use crate::error::{AvocastError, Result};
use crate::evaluate::MapePolicy;
use crate::holidays::{HolidayRule, HolidayTable, HolidayTableBuilder};
use crate::models::ModelConfig;
use crate::normalize::WEEKLY_PERIOD_DAYS;
use crate::selector::SelectionPolicy;
use crate::split::DEFAULT_SPLIT_QUANTILE;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Longest grid period accepted, in days
pub const MAX_PERIOD_DAYS: i64 = 366;

/// Longest forecast horizon accepted, in periods
pub const MAX_HORIZON_PERIODS: usize = 1040;

/// Years a holiday table may span
pub const HOLIDAY_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Date grid settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Days between consecutive observations
    pub period_days: i64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            period_days: WEEKLY_PERIOD_DAYS,
        }
    }
}

impl GridConfig {
    pub fn period(&self) -> Duration {
        Duration::days(self.period_days)
    }
}

/// Train/test split settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub quantile: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            quantile: DEFAULT_SPLIT_QUANTILE,
        }
    }
}

/// Holiday table settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolidayConfig {
    pub enabled: bool,
    pub start_year: i32,
    /// Inclusive
    pub end_year: i32,
    pub rules: Vec<HolidayRule>,
}

impl Default for HolidayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_year: 2015,
            end_year: 2019,
            rules: HolidayTable::default_rules(),
        }
    }
}

impl HolidayConfig {
    pub fn builder(&self) -> HolidayTableBuilder {
        HolidayTableBuilder::new(self.start_year, self.end_year).rules(self.rules.iter().cloned())
    }
}

/// Evaluation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub mape_policy: MapePolicy,
}

/// Future horizon settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Periods forecast beyond the end of the series
    pub horizon_periods: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_periods: 52,
        }
    }
}

/// Complete configuration of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub columns: ColumnOverrides,
    pub category: String,
    pub selection: SelectionPolicy,
    pub grid: GridConfig,
    pub split: SplitConfig,
    pub holidays: HolidayConfig,
    pub model: ModelConfig,
    pub evaluation: EvaluationConfig,
    pub forecast: ForecastConfig,
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            columns: ColumnOverrides::default(),
            category: "conventional".to_string(),
            selection: SelectionPolicy::default(),
            grid: GridConfig::default(),
            split: SplitConfig::default(),
            holidays: HolidayConfig::default(),
            model: ModelConfig::default(),
            evaluation: EvaluationConfig::default(),
            forecast: ForecastConfig::default(),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every setting before a run starts
    pub fn validate(&self) -> Result<()> {
        if self.category.trim().is_empty() {
            return Err(AvocastError::InvalidParameter(
                "category must not be empty".to_string(),
            ));
        }
        self.selection.validate()?;
        if !(1..=MAX_PERIOD_DAYS).contains(&self.grid.period_days) {
            return Err(AvocastError::InvalidParameter(format!(
                "grid.period_days must be between 1 and {}, got {}",
                MAX_PERIOD_DAYS, self.grid.period_days
            )));
        }
        if self.forecast.horizon_periods > MAX_HORIZON_PERIODS {
            return Err(AvocastError::InvalidParameter(format!(
                "forecast.horizon_periods must be at most {}, got {}",
                MAX_HORIZON_PERIODS, self.forecast.horizon_periods
            )));
        }
        if !(self.split.quantile > 0.0 && self.split.quantile < 1.0) {
            return Err(AvocastError::InvalidParameter(format!(
                "split.quantile must be between 0 and 1, got {}",
                self.split.quantile
            )));
        }
        if self.holidays.enabled {
            if self.holidays.start_year > self.holidays.end_year {
                return Err(AvocastError::InvalidParameter(format!(
                    "holidays.start_year {} is after end_year {}",
                    self.holidays.start_year, self.holidays.end_year
                )));
            }
            for year in [self.holidays.start_year, self.holidays.end_year] {
                if !HOLIDAY_YEARS.contains(&year) {
                    return Err(AvocastError::InvalidParameter(format!(
                        "holiday years must be between {} and {}, got {}",
                        HOLIDAY_YEARS.start(),
                        HOLIDAY_YEARS.end(),
                        year
                    )));
                }
            }
            for rule in &self.holidays.rules {
                rule.validate()?;
            }
        }
        self.model.validate()
    }
}
