//! Error types for the ad_forecast crate

use polars::prelude::PolarsError;
use series_math::MathError;
use thiserror::Error;

/// Custom error types for the ad_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The raw dataset itself is unusable (no date column, bad date cell)
    #[error("Data error: {0}")]
    DataError(String),

    /// A metric's source columns are missing from the dataset
    #[error("Derivation error for {metric}: missing column(s) {}", .missing.join(", "))]
    DerivationError {
        metric: String,
        missing: Vec<String>,
    },

    /// A metric has no usable values after cleaning
    #[error("Insufficient data for {0}: no non-missing values")]
    InsufficientData(String),

    /// The model could not be fitted to a series
    #[error("Model fit error: {0}")]
    ModelFitError(String),

    /// Every metric in the catalogue failed
    #[error("No usable metrics: all {0} metric(s) failed")]
    NoUsableMetrics(usize),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error reading or writing CSV artifacts
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error parsing the configuration file
    #[error("Config error: {0}")]
    ConfigError(#[from] serde_json::Error),
}

impl ForecastError {
    /// Whether the error only affects a single metric, so a run can skip it
    pub fn is_metric_recoverable(&self) -> bool {
        matches!(
            self,
            ForecastError::DerivationError { .. }
                | ForecastError::InsufficientData(_)
                | ForecastError::ModelFitError(_)
        )
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        ForecastError::ModelFitError(err.to_string())
    }
}
