//! Multi-series price table loading and access

use crate::error::{AvocastError, Result};
use crate::series::{Observation, PriceSeries, SeriesKey};
use chrono::NaiveDate;
use polars::prelude::{ChunkCompare, CsvReader, DataFrame, DataType, NamedFrom, SerReader, Series};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Days between 0001-01-01 and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Date formats accepted in text date columns
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Optional column name overrides; unset names are detected from the header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnOverrides {
    pub region: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub price: Option<String>,
}

/// Resolved names of the four columns the pipeline reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub region: String,
    pub category: String,
    pub date: String,
    pub price: String,
}

/// One row of a market table
#[derive(Debug, Clone, PartialEq)]
pub struct MarketRecord {
    pub region: String,
    pub category: String,
    pub date: NaiveDate,
    pub price: f64,
}

impl MarketRecord {
    pub fn new(region: &str, category: &str, date: NaiveDate, price: f64) -> Self {
        Self {
            region: region.to_string(),
            category: category.to_string(),
            date,
            price,
        }
    }
}

/// A multi-region, multi-category price table backed by a polars DataFrame
#[derive(Debug, Clone)]
pub struct MarketTable {
    df: DataFrame,
    columns: ColumnMapping,
}

/// Data loader for market tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a market table from a CSV file, detecting column names
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<MarketTable> {
        Self::from_csv_with(path, &ColumnOverrides::default())
    }

    /// Load a market table from a CSV file with explicit column names
    pub fn from_csv_with<P: AsRef<Path>>(
        path: P,
        overrides: &ColumnOverrides,
    ) -> Result<MarketTable> {
        let file = File::open(path.as_ref())?;
        let df = CsvReader::new(file)
            .infer_schema(Some(1000))
            .has_header(true)
            .finish()?;

        debug!(
            path = %path.as_ref().display(),
            rows = df.height(),
            "Loaded market table"
        );

        Self::from_dataframe_with(df, overrides)
    }

    /// Create a market table from an existing DataFrame
    pub fn from_dataframe(df: DataFrame) -> Result<MarketTable> {
        Self::from_dataframe_with(df, &ColumnOverrides::default())
    }

    /// Create a market table from an existing DataFrame with explicit column names
    pub fn from_dataframe_with(df: DataFrame, overrides: &ColumnOverrides) -> Result<MarketTable> {
        let columns = ColumnMapping {
            region: Self::resolve(&df, overrides.region.as_deref(), Self::detect_region_column)?,
            category: Self::resolve(
                &df,
                overrides.category.as_deref(),
                Self::detect_category_column,
            )?,
            date: Self::resolve(&df, overrides.date.as_deref(), Self::detect_date_column)?,
            price: Self::resolve(&df, overrides.price.as_deref(), Self::detect_price_column)?,
        };

        MarketTable::new(df, columns)
    }

    fn resolve(
        df: &DataFrame,
        requested: Option<&str>,
        detect: fn(&DataFrame) -> Result<String>,
    ) -> Result<String> {
        match requested {
            Some(name) => Ok(name.to_string()),
            None => detect(df),
        }
    }

    /// Detect the region column
    fn detect_region_column(df: &DataFrame) -> Result<String> {
        Self::find_column(df, |name| name.contains("region"))
            .ok_or_else(|| AvocastError::DataError("No region column found in data".to_string()))
    }

    /// Detect the product category column
    fn detect_category_column(df: &DataFrame) -> Result<String> {
        Self::find_column(df, |name| name == "type")
            .or_else(|| Self::find_column(df, |name| name.contains("category")))
            .ok_or_else(|| {
                AvocastError::DataError("No category/type column found in data".to_string())
            })
    }

    /// Detect the date column
    fn detect_date_column(df: &DataFrame) -> Result<String> {
        Self::find_column(df, |name| name.contains("date") || name.contains("time"))
            .or_else(|| {
                df.get_columns()
                    .iter()
                    .find(|col| col.dtype().is_temporal())
                    .map(|col| col.name().to_string())
            })
            .ok_or_else(|| AvocastError::DataError("No date column found in data".to_string()))
    }

    /// Detect the price column, preferring an average price
    fn detect_price_column(df: &DataFrame) -> Result<String> {
        Self::find_column(df, |name| name.contains("averageprice"))
            .or_else(|| Self::find_column(df, |name| name.contains("price")))
            .ok_or_else(|| AvocastError::DataError("No price column found in data".to_string()))
    }

    fn find_column(df: &DataFrame, matches: impl Fn(&str) -> bool) -> Option<String> {
        df.get_column_names()
            .into_iter()
            .find(|name| matches(&name.to_lowercase()))
            .map(|name| name.to_string())
    }
}

impl MarketTable {
    /// Wrap a DataFrame whose column names are already known
    pub fn new(df: DataFrame, columns: ColumnMapping) -> Result<Self> {
        for name in [
            &columns.region,
            &columns.category,
            &columns.date,
            &columns.price,
        ] {
            df.column(name).map_err(|e| {
                AvocastError::DataError(format!("Column '{}' not found: {}", name, e))
            })?;
        }

        Ok(Self { df, columns })
    }

    /// Build a table from in-memory records using the standard column names
    pub fn from_records(records: &[MarketRecord]) -> Result<Self> {
        let regions: Vec<&str> = records.iter().map(|r| r.region.as_str()).collect();
        let categories: Vec<&str> = records.iter().map(|r| r.category.as_str()).collect();
        let dates: Vec<String> = records
            .iter()
            .map(|r| r.date.format("%Y-%m-%d").to_string())
            .collect();
        let prices: Vec<f64> = records.iter().map(|r| r.price).collect();

        let df = DataFrame::new(vec![
            Series::new("Date", dates),
            Series::new("AveragePrice", prices),
            Series::new("type", categories),
            Series::new("region", regions),
        ])?;

        Self::new(
            df,
            ColumnMapping {
                region: "region".to_string(),
                category: "type".to_string(),
                date: "Date".to_string(),
                price: "AveragePrice".to_string(),
            },
        )
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Get the resolved column names
    pub fn columns(&self) -> &ColumnMapping {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Keep only the rows of one category (exact match)
    pub fn filter_category(&self, category: &str) -> Result<MarketTable> {
        let mask = self.df.column(&self.columns.category)?.utf8()?.equal(category);
        Ok(MarketTable {
            df: self.df.filter(&mask)?,
            columns: self.columns.clone(),
        })
    }

    /// Number of rows per region
    pub fn region_counts(&self) -> Result<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        for region in self.df.column(&self.columns.region)?.utf8()?.into_iter().flatten() {
            *counts.entry(region.to_string()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Distinct region names in sorted order
    pub fn regions(&self) -> Result<Vec<String>> {
        Ok(self.region_counts()?.into_keys().collect())
    }

    /// Extract the price series of one region and category
    pub fn series_for(&self, key: &SeriesKey) -> Result<PriceSeries> {
        let regions = self.df.column(&self.columns.region)?.utf8()?.equal(key.region.as_str());
        let categories = self
            .df
            .column(&self.columns.category)?
            .utf8()?
            .equal(key.category.as_str());
        let rows = self.df.filter(&(&regions & &categories))?;

        let dates = date_values(rows.column(&self.columns.date)?)?;
        let prices = price_values(rows.column(&self.columns.price)?)?;

        let mut observations = Vec::with_capacity(dates.len());
        for (idx, (date, price)) in dates.into_iter().zip(prices).enumerate() {
            match (date, price) {
                (Some(date), Some(price)) => observations.push(Observation::new(date, price)),
                _ => {
                    return Err(AvocastError::DataError(format!(
                        "Series {} has a missing date or price in row {}",
                        key, idx
                    )))
                }
            }
        }

        PriceSeries::from_unsorted(key.clone(), observations)
    }

    /// Describe the table: size, regions, date span and price statistics
    pub fn summary(&self) -> Result<TableSummary> {
        let dates: Vec<NaiveDate> = date_values(self.df.column(&self.columns.date)?)?
            .into_iter()
            .flatten()
            .collect();
        let prices = price_values(self.df.column(&self.columns.price)?)?;
        let categories = self.df.column(&self.columns.category)?.utf8()?;

        let mut by_category: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (category, price) in categories.into_iter().zip(prices) {
            if let (Some(category), Some(price)) = (category, price) {
                by_category
                    .entry(category.to_string())
                    .or_default()
                    .push(price);
            }
        }

        let categories = by_category
            .into_iter()
            .map(|(category, prices)| CategoryStats::from_prices(category, &prices))
            .collect();

        Ok(TableSummary {
            rows: self.len(),
            regions: self.region_counts()?,
            first_date: dates.iter().min().copied(),
            last_date: dates.iter().max().copied(),
            categories,
        })
    }
}

/// Price statistics for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl CategoryStats {
    fn from_prices(category: String, prices: &[f64]) -> Self {
        Self {
            category,
            count: prices.len(),
            mean: prices.iter().mean(),
            std_dev: prices.iter().std_dev(),
            min: Statistics::min(prices.iter()),
            max: Statistics::max(prices.iter()),
        }
    }
}

/// Overview of a market table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub rows: usize,
    pub regions: BTreeMap<String, usize>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub categories: Vec<CategoryStats>,
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Market Table Summary:")?;
        writeln!(f, "  Rows:     {}", self.rows)?;
        writeln!(f, "  Regions:  {}", self.regions.len())?;
        if let (Some(first), Some(last)) = (self.first_date, self.last_date) {
            writeln!(
                f,
                "  Dates:    {} to {} ({} days)",
                first,
                last,
                (last - first).num_days()
            )?;
        }
        for stats in &self.categories {
            writeln!(
                f,
                "  {:<14} n={:<6} mean={:.2} std={:.2} min={:.2} max={:.2}",
                stats.category, stats.count, stats.mean, stats.std_dev, stats.min, stats.max
            )?;
        }
        Ok(())
    }
}

/// Parse a text date in one of the accepted formats
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .ok_or_else(|| AvocastError::DataError(format!("Unparseable date '{}'", text)))
}

fn epoch_days_to_date(days: i32) -> Result<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
        .ok_or_else(|| AvocastError::DataError(format!("Date out of range: {} days", days)))
}

fn date_values(column: &Series) -> Result<Vec<Option<NaiveDate>>> {
    match column.dtype() {
        DataType::Utf8 => column
            .utf8()?
            .into_iter()
            .map(|opt| opt.map(parse_date).transpose())
            .collect(),
        DataType::Date | DataType::Datetime(_, _) => {
            let days = column.cast(&DataType::Date)?.cast(&DataType::Int32)?;
            let dates = days.i32()?;
            dates
                .into_iter()
                .map(|opt| opt.map(epoch_days_to_date).transpose())
                .collect()
        }
        other => Err(AvocastError::DataError(format!(
            "Column '{}' of type {} cannot be read as dates",
            column.name(),
            other
        ))),
    }
}

fn price_values(column: &Series) -> Result<Vec<Option<f64>>> {
    if !column.dtype().is_numeric() {
        return Err(AvocastError::DataError(format!(
            "Column '{}' cannot be converted to f64",
            column.name()
        )));
    }
    let prices = column.cast(&DataType::Float64)?;
    let values = prices.f64()?.into_iter().collect();
    Ok(values)
}
