//! # Ad Forecast
//!
//! Daily forecasting of ad-performance metrics with interval-based anomaly
//! detection.
//!
//! ## Features
//!
//! - Raw dataset loading from CSV with whitespace-tolerant column lookup
//! - Per-metric series extraction with forward-fill and derived ratios (CTR)
//! - Additive trend + weekly seasonality model with monotone prediction intervals
//! - Positive / Negative / Normal classification of observed days
//! - Multi-metric runs that skip failing metrics instead of aborting
//! - CSV artifacts and plain-text weekly and anomaly digests
//!
//! ## Quick Start
//!
//! ```no_run
//! use ad_forecast::config::PipelineConfig;
//! use ad_forecast::data::DataLoader;
//! use ad_forecast::output::write_artifacts;
//! use ad_forecast::pipeline::Pipeline;
//!
//! fn main() -> ad_forecast::error::Result<()> {
//!     let config = PipelineConfig::default();
//!
//!     // Load data
//!     let dataset = DataLoader::from_csv("data/metrics.csv", &config.date_column)?;
//!
//!     // Forecast every metric and collect anomalies
//!     let pipeline = Pipeline::new(config.clone())?;
//!     let run = pipeline.run(&dataset)?;
//!
//!     // Replace the previous artifacts
//!     write_artifacts(&run, &config)?;
//!     Ok(())
//! }
//! ```

pub mod anomaly;
pub mod config;
pub mod data;
pub mod digest;
pub mod error;
pub mod extract;
pub mod models;
pub mod output;
pub mod pipeline;

// Re-export commonly used types
pub use crate::anomaly::{classify, AnomalyRecord, AnomalyReport, Classification};
pub use crate::config::{ForecastOutput, ModelConfig, PipelineConfig};
pub use crate::data::{DataLoader, MetricSeries, RawDataset};
pub use crate::error::ForecastError;
pub use crate::extract::{extract, MetricCatalogue, MetricSource, MetricSpec};
pub use crate::models::{ForecastModel, ForecastPoint, ForecastResult};
pub use crate::pipeline::{Pipeline, PipelineRun};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
