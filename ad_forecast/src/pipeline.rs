//! Multi-metric run: extract, fit, predict and classify each catalogue entry

use crate::anomaly::{classify, AnomalyRecord, AnomalyReport};
use crate::config::PipelineConfig;
use crate::data::RawDataset;
use crate::error::{ForecastError, Result};
use crate::extract::{extract, MetricCatalogue, MetricSpec};
use crate::models::{FittedForecastModel, ForecastModel, ForecastResult, SeasonalTrendModel};
use chrono::NaiveDate;
use log::{info, warn};
use std::collections::BTreeMap;

/// Forecast of one successfully fitted metric
#[derive(Debug, Clone)]
pub struct MetricForecast {
    pub metric: String,
    pub forecast: ForecastResult,
    /// In-sample mean absolute error
    pub mae: f64,
    /// In-sample root mean squared error
    pub rmse: f64,
}

/// A metric that was skipped, and why
#[derive(Debug)]
pub struct MetricFailure {
    pub metric: String,
    pub error: ForecastError,
}

/// Everything one run produced
#[derive(Debug)]
pub struct PipelineRun {
    forecasts: Vec<MetricForecast>,
    report: AnomalyReport,
    failures: Vec<MetricFailure>,
}

impl PipelineRun {
    /// Forecasts of fitted metrics, in catalogue order
    pub fn forecasts(&self) -> &[MetricForecast] {
        &self.forecasts
    }

    /// Forecast of one metric, if it was fitted
    pub fn forecast(&self, metric: &str) -> Option<&ForecastResult> {
        self.forecasts
            .iter()
            .find(|f| f.metric == metric)
            .map(|f| &f.forecast)
    }

    /// Consolidated anomalies
    pub fn report(&self) -> &AnomalyReport {
        &self.report
    }

    /// Metrics that were skipped
    pub fn failures(&self) -> &[MetricFailure] {
        &self.failures
    }
}

/// Batch forecasting and anomaly detection over a metric catalogue
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    catalogue: MetricCatalogue,
    model: SeasonalTrendModel,
}

impl Pipeline {
    /// Create a pipeline over the default ad-metric catalogue
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_catalogue(config, MetricCatalogue::default())
    }

    /// Create a pipeline over a custom catalogue
    pub fn with_catalogue(config: PipelineConfig, catalogue: MetricCatalogue) -> Result<Self> {
        config.validate()?;
        let model = SeasonalTrendModel::new(config.model.clone())?;

        Ok(Self {
            config,
            catalogue,
            model,
        })
    }

    /// Get the run configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get the metric catalogue
    pub fn catalogue(&self) -> &MetricCatalogue {
        &self.catalogue
    }

    /// Run every catalogue metric. Per-metric failures are logged and skipped;
    /// the run fails only if no metric could be fitted.
    pub fn run(&self, dataset: &RawDataset) -> Result<PipelineRun> {
        let mut forecasts = Vec::new();
        let mut failures = Vec::new();
        let mut records = Vec::new();

        for spec in self.catalogue.iter() {
            info!("Forecasting and detecting anomalies for {}", spec.name);
            match self.run_metric(dataset, spec) {
                Ok((forecast, classified)) => {
                    let anomalies = classified
                        .iter()
                        .filter(|r| r.classification.is_anomaly())
                        .count();
                    info!("{}: {} anomalous day(s)", spec.name, anomalies);
                    forecasts.push(forecast);
                    records.extend(classified);
                }
                Err(error) if error.is_metric_recoverable() => {
                    warn!("Skipping {}: {}", spec.name, error);
                    failures.push(MetricFailure {
                        metric: spec.name.clone(),
                        error,
                    });
                }
                Err(error) => return Err(error),
            }
        }

        if forecasts.is_empty() {
            return Err(ForecastError::NoUsableMetrics(self.catalogue.len()));
        }

        let records = match &self.config.dimension_column {
            Some(column) => match dataset.dimension_by_date(column)? {
                Some(by_date) => join_dimension(records, &by_date),
                None => {
                    info!("No '{}' column, anomalies carry no dimension", column);
                    records
                }
            },
            None => records,
        };

        let report = AnomalyReport::from_records(records);
        info!(
            "Run complete: {} metric(s) fitted, {} skipped, {} anomaly record(s)",
            forecasts.len(),
            failures.len(),
            report.len()
        );

        Ok(PipelineRun {
            forecasts,
            report,
            failures,
        })
    }

    fn run_metric(
        &self,
        dataset: &RawDataset,
        spec: &MetricSpec,
    ) -> Result<(MetricForecast, Vec<AnomalyRecord>)> {
        let series = extract(dataset, spec)?;
        let fitted = self.model.fit(&series)?;
        let forecast = fitted.predict(self.config.horizon_days)?;
        let classified = classify(&series, &forecast);

        Ok((
            MetricForecast {
                metric: spec.name.clone(),
                forecast,
                mae: fitted.mae(),
                rmse: fitted.rmse(),
            },
            classified,
        ))
    }
}

/// One record per dimension value present on the anomaly's date
fn join_dimension(
    records: Vec<AnomalyRecord>,
    by_date: &BTreeMap<NaiveDate, Vec<String>>,
) -> Vec<AnomalyRecord> {
    records
        .into_iter()
        .filter(|r| r.classification.is_anomaly())
        .flat_map(|record| match by_date.get(&record.date) {
            Some(values) if !values.is_empty() => values
                .iter()
                .map(|v| record.with_dimension(Some(v.clone())))
                .collect::<Vec<_>>(),
            _ => vec![record],
        })
        .collect()
}
