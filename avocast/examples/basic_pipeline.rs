use avocast::{LinearTrendModel, MarketRecord, MarketTable, Pipeline, PipelineConfig};
use chrono::{Datelike, Duration, NaiveDate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("AvoCast: Basic Pipeline Example");
    println!("===============================\n");

    let table = create_sample_table()?;
    println!("Sample table created: {} rows\n", table.len());
    print!("{}", table.summary()?);

    // Default policy: Washington area first, falling back to TotalUS
    let pipeline = Pipeline::new(PipelineConfig::default())?;
    let output = pipeline.run(&table, &LinearTrendModel::new())?;

    println!("\nSelected series: {}", output.selection.series.key());
    if output.selection.substituted {
        println!("  resolved by {}", output.selection.resolved_by);
    }
    println!(
        "Train: {} weeks, Test: {} weeks (cutoff {})",
        output.train.len(),
        output.test.len(),
        output.cutoff
    );
    println!("Holiday events: {}", output.holidays.len());
    println!("Interpolated weeks: {:?}\n", output.filled);

    println!("{}", output.evaluation.metrics);

    println!("Worst months by absolute error:");
    let mut months = output.diagnostics.monthly_error.clone();
    months.sort_by(|a, b| b.mean_absolute_error.total_cmp(&a.mean_absolute_error));
    for month in months.iter().take(3) {
        println!(
            "  Month {:>2}: {:.4} over {} weeks",
            month.month, month.mean_absolute_error, month.count
        );
    }

    println!("\nNext 4 weeks:");
    for prediction in output.next_periods(4) {
        println!(
            "  {}: {:.2} ({:.2} to {:.2})",
            prediction.date, prediction.point, prediction.lower, prediction.upper
        );
    }
    if let Some(trend) = output.trend_direction() {
        println!("\nYear-over-year trend: {:?} ({:+.3})", trend.direction, trend.change);
    }

    Ok(())
}

/// Three years of weekly prices for two regions with a summer peak
fn create_sample_table() -> avocast::Result<MarketTable> {
    let start = NaiveDate::from_ymd_opt(2015, 1, 4).unwrap();
    let mut records = Vec::new();

    for week in 0..156 {
        let date = start + Duration::weeks(week);
        let season = (date.ordinal() as f64 / 365.0 * std::f64::consts::TAU).sin();
        let noise = (week as f64 * 0.7).sin() * 0.03;
        let price = 1.1 + 0.002 * week as f64 - 0.15 * season + noise;

        // One week of Washington data is missing and gets interpolated
        if week != 40 {
            records.push(MarketRecord::new("WashingtonDC", "conventional", date, price + 0.2));
        }
        records.push(MarketRecord::new("TotalUS", "conventional", date, price));
        records.push(MarketRecord::new("TotalUS", "organic", date, price * 1.5));
    }

    MarketTable::from_records(&records)
}
