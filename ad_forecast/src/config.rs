//! Run configuration, loadable from a JSON file

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Longest forecast horizon accepted, in days
pub const MAX_HORIZON_DAYS: usize = 3650;

/// Parameters of the seasonal trend model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Length of the seasonal cycle in days
    pub seasonal_period: usize,
    /// Lower bound on the number of observations needed to fit
    pub min_observations: usize,
    /// Target coverage of the prediction interval
    pub confidence: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seasonal_period: 7,
            min_observations: 14,
            confidence: 0.95,
        }
    }
}

impl ModelConfig {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.seasonal_period == 0 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal period must be at least 1".to_string(),
            ));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Confidence must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Observations required before a fit is attempted
    pub fn required_observations(&self) -> usize {
        self.min_observations.max(2 * self.seasonal_period)
    }
}

/// Which forecasts are persisted after a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ForecastOutput {
    /// Only one metric's forecast is written
    Primary { metric: String },
    /// One file per successfully fitted metric
    PerMetric,
}

impl Default for ForecastOutput {
    fn default() -> Self {
        ForecastOutput::Primary {
            metric: "eCPM".to_string(),
        }
    }
}

/// Configuration of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name of the date column in the raw dataset
    pub date_column: String,
    /// Optional grouping column joined onto anomalies
    pub dimension_column: Option<String>,
    /// Days forecast past the last observation
    pub horizon_days: usize,
    /// Model parameters
    pub model: ModelConfig,
    /// Forecast persistence mode
    pub forecast_output: ForecastOutput,
    /// Directory receiving the artifacts
    pub output_dir: PathBuf,
    /// File name of the consolidated anomaly artifact
    pub anomaly_file: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            date_column: "Date".to_string(),
            dimension_column: Some("Country".to_string()),
            horizon_days: 7,
            model: ModelConfig::default(),
            forecast_output: ForecastOutput::default(),
            output_dir: PathBuf::from("reports"),
            anomaly_file: "anomaly_summary.csv".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file; absent keys keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        if self.horizon_days > MAX_HORIZON_DAYS {
            return Err(ForecastError::InvalidParameter(format!(
                "Horizon of {} days exceeds the maximum of {}",
                self.horizon_days, MAX_HORIZON_DAYS
            )));
        }
        if self.anomaly_file.trim().is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Anomaly file name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of the forecast artifact for a metric
    pub fn forecast_path(&self, metric: &str) -> PathBuf {
        self.output_dir
            .join(format!("forecast_{}.csv", metric.to_lowercase()))
    }

    /// Path of the consolidated anomaly artifact
    pub fn anomaly_path(&self) -> PathBuf {
        self.output_dir.join(&self.anomaly_file)
    }
}
