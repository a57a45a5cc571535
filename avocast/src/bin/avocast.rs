//! # avocast
//!
//! Command-line interface for the avocado price pipeline.

use avocast::config::HolidayConfig;
use avocast::export;
use avocast::{
    AvocastError, DataLoader, LinearTrendModel, Pipeline, PipelineConfig, Result,
    SelectionPolicy, UsFederalCalendar,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "avocast")]
#[command(about = "Avocado price preparation and forecast evaluation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write its artifacts
    Run {
        /// Market table (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory, overrides the configured one
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only accept this exact region
        #[arg(long)]
        region: Option<String>,

        /// Product category, overrides the configured one
        #[arg(long)]
        category: Option<String>,

        /// Number of future periods to print
        #[arg(long, default_value = "12")]
        show: usize,
    },

    /// Summarize a market table
    Explore {
        /// Market table (CSV)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Build the default holiday table
    Holidays {
        /// First year (inclusive)
        #[arg(long, default_value = "2015")]
        start: i32,

        /// Last year (inclusive)
        #[arg(long, default_value = "2019")]
        end: i32,

        /// Output file (CSV); prints to stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn run(
    input: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    region: Option<String>,
    category: Option<String>,
    show: usize,
) -> Result<()> {
    let mut config = match config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(region) = region {
        config.selection = SelectionPolicy::exact(&region);
    }
    if let Some(category) = category {
        config.category = category;
    }
    if let Some(output) = output {
        config.output_dir = output;
    }

    let table = DataLoader::from_csv_with(&input, &config.columns)?;
    info!(rows = table.len(), input = %input.display(), "Loaded market table");

    let pipeline = Pipeline::new(config)?;
    let output = pipeline.run(&table, &LinearTrendModel::new())?;

    println!("Series: {}", output.selection.series.key());
    if output.selection.substituted {
        println!(
            "  (requested '{}', substituted via {})",
            output.selection.requested, output.selection.resolved_by
        );
    }
    println!(
        "Train: {} weeks, Test: {} weeks, cutoff {}",
        output.train.len(),
        output.test.len(),
        output.cutoff
    );
    println!("{}", output.evaluation.metrics);

    println!("Next {} periods:", show);
    for prediction in output.next_periods(show) {
        println!(
            "  {}  {:.4}  [{:.4}, {:.4}]",
            prediction.date, prediction.point, prediction.lower, prediction.upper
        );
    }
    if let Some(trend) = output.trend_direction() {
        println!("Trend: {:?} ({:+.4} year over year)", trend.direction, trend.change);
    }

    let paths = output.write_artifacts(&pipeline.config().output_dir)?;
    for path in paths {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn explore(input: PathBuf) -> Result<()> {
    let table = DataLoader::from_csv(&input)?;
    print!("{}", table.summary()?);
    Ok(())
}

fn holidays(start: i32, end: i32, output: Option<PathBuf>) -> Result<()> {
    let config = HolidayConfig {
        start_year: start,
        end_year: end,
        ..HolidayConfig::default()
    };
    let table = config.builder().build(&UsFederalCalendar)?;

    match output {
        Some(path) => {
            export::write_holidays(&path, &table)?;
            println!("Wrote {} events to {}", table.len(), path.display());
        }
        None => {
            for event in table.events() {
                println!(
                    "{}\t{}\t{}\t{}",
                    event.date, event.name, event.lower_window, event.upper_window
                );
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "avocast=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            config,
            output,
            region,
            category,
            show,
        } => run(input, config, output, region, category, show),
        Commands::Explore { input } => explore(input),
        Commands::Holidays { start, end, output } => holidays(start, end, output),
    };

    if let Err(err) = result {
        report(&err);
        std::process::exit(1);
    }
}

fn report(err: &AvocastError) {
    eprintln!("{}: {}", err.stage(), err);
}
