use ad_forecast::config::{ForecastOutput, PipelineConfig};
use ad_forecast::data::{parse_date, DataLoader};
use ad_forecast::digest::{AnomalyDigest, ForecastDigest};
use ad_forecast::error::Result;
use ad_forecast::output::{read_anomaly_artifact, read_forecast_artifact, write_artifacts};
use ad_forecast::pipeline::Pipeline;
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "adpulse")]
#[command(about = "Ad metric forecasting and anomaly detection", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true, env = "ADPULSE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the artifacts (overrides the configuration)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast every metric and write the forecast and anomaly artifacts
    Run {
        /// Raw dataset (CSV with a header row)
        #[arg(short, long)]
        input: PathBuf,

        /// Days to forecast past the last observation
        #[arg(long)]
        horizon: Option<usize>,

        /// Write one forecast file per metric instead of the primary one
        #[arg(long)]
        per_metric: bool,
    },

    /// Print the weekly forecast digest and the recent anomaly digest
    Digest {
        /// Metric whose forecast artifact is summarised
        #[arg(short, long, default_value = "eCPM")]
        metric: String,

        /// Reference day (defaults to the local date)
        #[arg(short, long)]
        today: Option<String>,

        /// Number of anomalies listed
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    match cli.command {
        Commands::Run {
            input,
            horizon,
            per_metric,
        } => {
            if let Some(days) = horizon {
                config.horizon_days = days;
            }
            if per_metric {
                config.forecast_output = ForecastOutput::PerMetric;
            }
            run(&input, config)
        }
        Commands::Digest {
            metric,
            today,
            limit,
        } => {
            let today = match today {
                Some(raw) => parse_date(&raw)?,
                None => chrono::Local::now().date_naive(),
            };
            digest(&config, &metric, today, limit)
        }
    }
}

fn run(input: &Path, config: PipelineConfig) -> Result<()> {
    info!("Loading {}", input.display());
    let dataset = DataLoader::from_csv(input, &config.date_column)?;

    let pipeline = Pipeline::new(config)?;
    let run = pipeline.run(&dataset)?;
    let written = write_artifacts(&run, pipeline.config())?;

    println!("Metrics fitted: {}", run.forecasts().len());
    for entry in run.forecasts() {
        println!(
            "  {:<12} mae={:.4} rmse={:.4} horizon={}d",
            entry.metric,
            entry.mae,
            entry.rmse,
            entry.forecast.horizon_days()
        );
    }
    for failure in run.failures() {
        println!("  {:<12} skipped: {}", failure.metric, failure.error);
    }
    println!("Anomalies: {}", run.report().len());
    for path in &written.forecast_paths {
        println!("Forecast written to {}", path.display());
    }
    println!("Anomalies written to {}", written.anomaly_path.display());

    Ok(())
}

fn digest(
    config: &PipelineConfig,
    metric: &str,
    today: chrono::NaiveDate,
    limit: usize,
) -> Result<()> {
    let forecast = read_forecast_artifact(config.forecast_path(metric))?;
    match ForecastDigest::weekly(&forecast, today) {
        Some(summary) => println!("{}", summary.render(metric)),
        None => println!("No future forecast available for {}.", metric),
    }

    println!();

    let anomalies = read_anomaly_artifact(config.anomaly_path())?;
    println!("{}", AnomalyDigest::recent(&anomalies, limit).render());

    Ok(())
}
