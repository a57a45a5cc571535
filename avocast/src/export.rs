//! Flat-file artifacts keyed by date

use crate::error::Result;
use crate::evaluate::PointEvaluation;
use crate::holidays::{HolidayEvent, HolidayTable};
use crate::models::Prediction;
use crate::series::{Observation, PriceSeries, SeriesKey};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// One row of a series file
#[derive(Debug, Serialize, Deserialize)]
struct SeriesRow {
    ds: NaiveDate,
    y: f64,
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a series as `ds,y`
pub fn write_series<P: AsRef<Path>>(path: P, series: &PriceSeries) -> Result<()> {
    write_rows(
        path.as_ref(),
        series.observations().iter().map(|obs| SeriesRow {
            ds: obs.date,
            y: obs.value,
        }),
    )
}

/// Read a `ds,y` file back into a series tagged with `key`
pub fn read_series<P: AsRef<Path>>(path: P, key: SeriesKey) -> Result<PriceSeries> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let observations = reader
        .deserialize::<SeriesRow>()
        .map(|row| row.map(|row| Observation::new(row.ds, row.y)))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    PriceSeries::from_unsorted(key, observations)
}

/// Write predictions as `ds,yhat,yhat_lower,yhat_upper`
pub fn write_predictions<P: AsRef<Path>>(path: P, predictions: &[Prediction]) -> Result<()> {
    write_rows(path.as_ref(), predictions)
}

/// Read a prediction file written by [`write_predictions`]
pub fn read_predictions<P: AsRef<Path>>(path: P) -> Result<Vec<Prediction>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let predictions = reader
        .deserialize::<Prediction>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(predictions)
}

/// Write the holiday table as `holiday,ds,lower_window,upper_window`
pub fn write_holidays<P: AsRef<Path>>(path: P, holidays: &HolidayTable) -> Result<()> {
    write_rows(path.as_ref(), holidays.events())
}

/// Read a holiday table file
pub fn read_holidays<P: AsRef<Path>>(path: P) -> Result<HolidayTable> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let events = reader
        .deserialize::<HolidayEvent>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(HolidayTable::from_events(events))
}

/// Write per-point evaluation rows
pub fn write_evaluation<P: AsRef<Path>>(path: P, points: &[PointEvaluation]) -> Result<()> {
    write_rows(path.as_ref(), points)
}

/// Write any serializable report as pretty JSON
pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, report: &T) -> Result<()> {
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)?;
    Ok(())
}
