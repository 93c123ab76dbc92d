use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use terragraph::config::LoggingConfig;
use terragraph::tabular::{self, ChartKind, ChartRequest};
use terragraph::telemetry::init_tracing;
use terragraph::{LiveDashboard, Query, QueryReport, TerraGraphConfig, web};

/// Rainfall prediction dashboard and tabular data explorer
#[derive(Parser, Debug)]
#[command(name = "terragraph", version)]
#[command(about = "Rainfall prediction dashboard and tabular data explorer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the dashboard and its JSON API
    Serve {
        /// Listen port, overrides TERRAGRAPH_SERVER__PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Fetch a forecast and print the rainfall prediction
    Forecast {
        #[arg(long, allow_hyphen_values = true)]
        latitude: f64,
        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,
        /// First day, defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day, defaults to seven days after the start
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize a CSV or spreadsheet file
    Analyze {
        #[arg(long)]
        file: PathBuf,
        /// Numeric x-axis column
        #[arg(long, requires = "y")]
        x: Option<String>,
        /// Numeric y-axis column
        #[arg(long, requires = "x")]
        y: Option<String>,
        #[arg(long, default_value = "scatter")]
        chart: ChartKind,
        /// Column to group points by
        #[arg(long)]
        color_by: Option<String>,
    },
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: "info".to_string(),
        format: "pretty".to_string(),
    }
}

fn load_config() -> Result<TerraGraphConfig> {
    TerraGraphConfig::load().context("Invalid configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port } => {
            let mut config = load_config()?;
            if let Some(port) = port {
                config.server.port = port;
            }
            init_tracing(&config.logging);
            info!("Starting TerraGraph {}", terragraph::VERSION);

            let dashboard = Arc::new(LiveDashboard::from_config(Arc::new(config))?);
            web::run(dashboard).await
        }
        Command::Forecast {
            latitude,
            longitude,
            start,
            end,
            json,
        } => {
            let config = load_config()?;
            init_tracing(&config.logging);

            let start = start.unwrap_or_else(|| Utc::now().date_naive());
            let end = end.unwrap_or(start + Duration::days(7));
            let query = Query::new(latitude, longitude, start, end);

            let dashboard = LiveDashboard::from_config(Arc::new(config))?;
            let report = dashboard
                .run_query(&query)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Command::Analyze {
            file,
            x,
            y,
            chart,
            color_by,
        } => {
            init_tracing(&default_logging());

            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let file_name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            let dataset = tabular::load(file_name, &bytes)?;

            let request = x
                .zip(y)
                .map(|(x, y)| ChartRequest::new(chart, x, y).color_by(color_by));
            let analysis = dataset.analyze(request.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
            Ok(())
        }
    }
}

fn print_report(report: &QueryReport) {
    println!(
        "Forecast for {} from {} to {}",
        report.query.coordinate().format_coordinates(),
        report.query.start(),
        report.query.end()
    );
    println!();
    println!("{:<22} {:>10} {:>10} {:>10}", "Time", "Temp", "Rain", "Wind");
    for sample in report.series.samples() {
        println!(
            "{:<22} {:>10} {:>10} {:>10}",
            sample.timestamp.format("%Y-%m-%d %H:%M"),
            sample.format_temperature(),
            sample.format_precipitation(),
            sample.format_wind()
        );
    }
    println!();
    println!("{}", report.prediction.headline());
    println!("{}", report.advisory.text);
    println!();
    println!("{}", report.narrative.text);
}
