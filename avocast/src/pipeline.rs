//! End-to-end pipeline: select, normalize, split, forecast, evaluate

use crate::config::PipelineConfig;
use crate::data::MarketTable;
use crate::diagnostics::DiagnosticsReport;
use crate::error::{AvocastError, Result};
use crate::evaluate::{align_predictions, evaluate, EvaluationResult, ForecastMetrics};
use crate::export;
use crate::holidays::{HolidayCalendar, HolidayTable, UsFederalCalendar};
use crate::models::{forecast_dates, ForecastModel, Prediction, TrainedForecastModel};
use crate::normalize::normalize;
use crate::selector::{select_series, MatchStrategy, Selection};
use crate::series::{PriceSeries, SeriesKey};
use crate::split::split_at_quantile;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Year-over-year movement of the point forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

/// Change in the point forecast between the end of the horizon and one year
/// (52 periods) before it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendChange {
    pub direction: TrendDirection,
    pub change: f64,
}

/// Everything one pipeline run produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub model_name: String,
    pub selection: Selection,
    /// Dates filled by interpolation
    pub filled: Vec<NaiveDate>,
    /// Source dates that were off the weekly grid
    pub off_grid: Vec<NaiveDate>,
    pub cutoff: NaiveDateTime,
    pub train: PriceSeries,
    pub test: PriceSeries,
    pub holidays: HolidayTable,
    /// Predictions over the full history and the future horizon
    pub forecast: Vec<Prediction>,
    pub evaluation: EvaluationResult,
    pub diagnostics: DiagnosticsReport,
}

/// Summary written to `report.json`
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    model: &'a str,
    series: &'a SeriesKey,
    requested_region: &'a str,
    resolved_by: &'a MatchStrategy,
    substituted: bool,
    filled_dates: &'a [NaiveDate],
    off_grid_dates: &'a [NaiveDate],
    cutoff: NaiveDateTime,
    train_observations: usize,
    test_observations: usize,
    holiday_events: usize,
    metrics: &'a ForecastMetrics,
    trend: Option<TrendChange>,
    diagnostics: &'a DiagnosticsReport,
}

impl PipelineOutput {
    /// Predictions after the last observed date
    pub fn future(&self) -> &[Prediction] {
        let last = self.test.last_date();
        let start = self
            .forecast
            .partition_point(|p| last.map_or(false, |last| p.date <= last));
        &self.forecast[start..]
    }

    /// The first `periods` predictions of the future horizon
    pub fn next_periods(&self, periods: usize) -> &[Prediction] {
        let future = self.future();
        &future[..periods.min(future.len())]
    }

    /// Direction of the point forecast over the final 52 periods
    pub fn trend_direction(&self) -> Option<TrendChange> {
        let last = self.forecast.last()?;
        let earlier = self
            .forecast
            .len()
            .checked_sub(53)
            .map(|idx| &self.forecast[idx])?;
        let change = last.point - earlier.point;
        let direction = if change > 1e-9 {
            TrendDirection::Up
        } else if change < -1e-9 {
            TrendDirection::Down
        } else {
            TrendDirection::Flat
        };
        Some(TrendChange { direction, change })
    }

    /// Write every artifact into `dir` and return the written paths
    pub fn write_artifacts<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let paths = [
            "train.csv",
            "test.csv",
            "forecast.csv",
            "holidays.csv",
            "evaluation.csv",
            "report.json",
        ]
        .map(|name| dir.join(name));

        export::write_series(&paths[0], &self.train)?;
        export::write_series(&paths[1], &self.test)?;
        export::write_predictions(&paths[2], &self.forecast)?;
        export::write_holidays(&paths[3], &self.holidays)?;
        export::write_evaluation(&paths[4], &self.evaluation.points)?;
        export::write_json(
            &paths[5],
            &RunReport {
                model: &self.model_name,
                series: self.selection.series.key(),
                requested_region: &self.selection.requested,
                resolved_by: &self.selection.resolved_by,
                substituted: self.selection.substituted,
                filled_dates: &self.filled,
                off_grid_dates: &self.off_grid,
                cutoff: self.cutoff,
                train_observations: self.train.len(),
                test_observations: self.test.len(),
                holiday_events: self.holidays.len(),
                metrics: &self.evaluation.metrics,
                trend: self.trend_direction(),
                diagnostics: &self.diagnostics,
            },
        )?;

        info!(dir = %dir.display(), files = paths.len(), "Wrote pipeline artifacts");
        Ok(paths.to_vec())
    }
}

/// Configured pipeline, reusable across tables and models
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline after validating its configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run against `table` with US federal holidays as the calendar
    pub fn run<M: ForecastModel>(&self, table: &MarketTable, model: &M) -> Result<PipelineOutput> {
        self.run_with_calendar(table, model, &UsFederalCalendar)
    }

    /// Run against `table` with an explicit holiday calendar
    pub fn run_with_calendar<M: ForecastModel>(
        &self,
        table: &MarketTable,
        model: &M,
        calendar: &dyn HolidayCalendar,
    ) -> Result<PipelineOutput> {
        let config = &self.config;

        let selection = select_series(table, &config.category, &config.selection)?;

        let normalization = normalize(&selection.series, config.grid.period(), None)?;
        info!(
            series = %normalization.series.key(),
            observations = normalization.series.len(),
            filled = normalization.filled.len(),
            "Normalized series"
        );

        let split = split_at_quantile(&normalization.series, config.split.quantile)?;
        let train = split.train_series()?;
        let test = split.test_series()?;
        info!(
            train = train.len(),
            test = test.len(),
            cutoff = %split.cutoff,
            "Split series"
        );

        let holidays = if config.holidays.enabled {
            config.holidays.builder().build(calendar)?
        } else {
            HolidayTable::default()
        };
        info!(events = holidays.len(), names = ?holidays.names(), "Built holiday table");

        let holiday_input = (!holidays.is_empty()).then_some(&holidays);
        let trained = model.train(&train, holiday_input, &config.model)?;
        info!(model = model.name(), "Trained model");

        let dates = forecast_dates(
            &normalization.series,
            config.forecast.horizon_periods,
            config.grid.period(),
        )?;
        let mut forecast = trained.predict(&dates)?;
        if forecast.len() != dates.len() {
            return Err(AvocastError::ModelError(format!(
                "{} returned {} predictions for {} dates",
                model.name(),
                forecast.len(),
                dates.len()
            )));
        }
        forecast.sort_by_key(|p| p.date);

        let test_predictions = align_predictions(&test, &forecast)?;
        let evaluation = evaluate(&test, &test_predictions, config.evaluation.mape_policy)?;
        info!(
            mae = evaluation.metrics.mae,
            rmse = evaluation.metrics.rmse,
            coverage = evaluation.metrics.coverage_rate,
            "Evaluated forecast"
        );

        let horizon_start = test.last_date().ok_or_else(|| AvocastError::Split {
            key: test.key().to_string(),
            reason: "empty test range".to_string(),
        })?;
        let diagnostics = DiagnosticsReport::build(&evaluation, &forecast, horizon_start);

        Ok(PipelineOutput {
            model_name: model.name().to_string(),
            filled: normalization.filled,
            off_grid: normalization.off_grid,
            cutoff: split.cutoff,
            selection,
            train,
            test,
            holidays,
            forecast,
            evaluation,
            diagnostics,
        })
    }
}
