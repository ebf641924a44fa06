//! CLI entry point for the commuter demand tool.
//!
//! Provides subcommands for predicting demand (single or batch), listing
//! live route alternatives and rendering them on a map.

use anyhow::{Context, Result};
use chrono::{Datelike, Local, Timelike};
use clap::{Parser, Subcommand, ValueEnum};
use commuter_demand::{
    batch::predict_csv,
    commands::{live_traffic_level, predict_demand, route_map, traffic_report},
    config::AppConfig,
    demand::{DAY_NAMES, DemandEstimator, DemandRequest},
    infra::google_maps::GoogleDirectionsClient,
    model::GradientBoostedModel,
    output::{NO_ROUTES_MESSAGE, demand_line, report_lines, to_json},
    render::to_html,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "commuter_demand")]
#[command(about = "Commuter demand prediction and live traffic analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict commuter demand for one set of conditions
    Predict {
        /// Hour of the day (0-23); defaults to the current hour
        #[arg(long)]
        hour: Option<u8>,

        /// Day of the week (Monday..Sunday); defaults to today
        #[arg(long)]
        day: Option<String>,

        /// Weather conditions (0 - Clear, 1 - Cloudy, 2 - Rainy)
        #[arg(short, long, default_value_t = 0)]
        weather: u8,

        /// Estimated travel time in minutes
        #[arg(short, long, default_value_t = 30.0)]
        travel_time: f64,

        /// Traffic congestion level, used when no live route is requested
        #[arg(long, default_value_t = 1)]
        traffic_level: u32,

        /// Origin for deriving the traffic level from live routes
        #[arg(long, requires = "destination")]
        origin: Option<String>,

        /// Destination for deriving the traffic level from live routes
        #[arg(long, requires = "origin")]
        destination: Option<String>,

        /// Print the result as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Predict demand for every row of a CSV file
    PredictBatch {
        /// CSV with columns hour,day,weather,travel_time,traffic_level
        #[arg(short, long)]
        input: PathBuf,

        /// CSV file to write predictions to
        #[arg(short, long, default_value = "predictions.csv")]
        output: PathBuf,
    },
    /// List live route alternatives with travel times and traffic levels
    Traffic {
        #[arg(long)]
        origin: String,

        #[arg(long)]
        destination: String,

        /// Print the routes as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Render live route alternatives on a map
    Map {
        #[arg(long)]
        origin: String,

        #[arg(long)]
        destination: String,

        #[arg(short, long, value_enum, default_value_t = MapFormat::Html)]
        format: MapFormat,

        /// File to write the map to (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MapFormat {
    Html,
    Geojson,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let config = AppConfig::from_env()?;

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = config
        .log_file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = config
        .log_file_path
        .file_name()
        .unwrap_or(OsStr::new("commuter_demand.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Predict {
            hour,
            day,
            weather,
            travel_time,
            traffic_level,
            origin,
            destination,
            json,
        } => {
            let estimator = load_estimator(&config)?;

            let now = Local::now();
            let hour = hour.unwrap_or(now.hour() as u8);
            let day = day.unwrap_or_else(|| {
                DAY_NAMES[now.weekday().num_days_from_monday() as usize].to_string()
            });

            let traffic_level = match (origin, destination) {
                (Some(origin), Some(destination)) => {
                    let provider = GoogleDirectionsClient::from_config(&config)?;
                    match live_traffic_level(&provider, &origin, &destination).await? {
                        Some(level) => level,
                        None => {
                            warn!(traffic_level, "{NO_ROUTES_MESSAGE} Using the given traffic level");
                            traffic_level
                        }
                    }
                }
                _ => traffic_level,
            };

            let request = DemandRequest::new(hour, day, weather, travel_time, traffic_level);
            let demand = predict_demand(&estimator, &request)?;

            if json {
                println!(
                    "{}",
                    to_json(&serde_json::json!({
                        "hour": request.hour,
                        "day": request.day_of_week,
                        "weather": request.weather_code,
                        "travel_time": request.travel_time_minutes,
                        "traffic_level": request.traffic_level,
                        "predicted_demand": demand,
                    }))?
                );
            } else {
                println!("{}", demand_line(demand));
            }
        }
        Commands::PredictBatch { input, output } => {
            let estimator = load_estimator(&config)?;
            let summary = predict_csv(&estimator, &input, &output)?;
            println!(
                "Wrote {} predictions ({} failed rows) to {}",
                summary.predicted,
                summary.failed,
                output.display()
            );
        }
        Commands::Traffic {
            origin,
            destination,
            json,
        } => {
            let provider = GoogleDirectionsClient::from_config(&config)?;
            let report = traffic_report(&provider, &origin, &destination).await?;

            if json {
                println!("{}", to_json(&report)?);
            } else {
                for line in report_lines(&report) {
                    println!("{line}");
                }
            }
        }
        Commands::Map {
            origin,
            destination,
            format,
            output,
        } => {
            let provider = GoogleDirectionsClient::from_config(&config)?;
            let Some(map) = route_map(&provider, &origin, &destination).await? else {
                println!("{NO_ROUTES_MESSAGE}");
                return Ok(());
            };

            let rendered = match format {
                MapFormat::Html => to_html(&map)?,
                MapFormat::Geojson => to_json(&map)?,
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("writing map to {}", path.display()))?;
                    info!(path = %path.display(), "Map written");
                }
                None => println!("{rendered}"),
            }
        }
    }

    Ok(())
}

/// Loads the model artifact. A missing or corrupt model aborts the command.
fn load_estimator(config: &AppConfig) -> Result<DemandEstimator<GradientBoostedModel>> {
    let model = GradientBoostedModel::load(&config.model_path)
        .context("the demand model must be available to predict")?;
    Ok(DemandEstimator::new(model))
}
