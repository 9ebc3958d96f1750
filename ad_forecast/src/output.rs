//! Forecast and anomaly artifacts on disk

use crate::anomaly::{AnomalyRecord, AnomalyReport, Classification};
use crate::config::{ForecastOutput, PipelineConfig};
use crate::error::Result;
use crate::models::{ForecastPoint, ForecastResult};
use crate::pipeline::PipelineRun;
use chrono::NaiveDate;
use csv::{Reader, Writer, WriterBuilder};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

const FORECAST_HEADER: [&str; 4] = ["ds", "yhat", "yhat_lower", "yhat_upper"];
const ANOMALY_HEADER: [&str; 8] = [
    "date",
    "metric",
    "dimension",
    "classification",
    "actual",
    "yhat",
    "yhat_lower",
    "yhat_upper",
];

/// One row of the forecast artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub ds: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

impl From<&ForecastPoint> for ForecastRow {
    fn from(point: &ForecastPoint) -> Self {
        Self {
            ds: point.date,
            yhat: point.point_estimate,
            yhat_lower: point.lower_bound,
            yhat_upper: point.upper_bound,
        }
    }
}

impl From<&ForecastRow> for ForecastPoint {
    fn from(row: &ForecastRow) -> Self {
        Self {
            date: row.ds,
            point_estimate: row.yhat,
            lower_bound: row.yhat_lower,
            upper_bound: row.yhat_upper,
        }
    }
}

/// One row of the anomaly artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRow {
    pub date: NaiveDate,
    pub metric: String,
    pub dimension: Option<String>,
    pub classification: Classification,
    pub actual: f64,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

impl From<&AnomalyRecord> for AnomalyRow {
    fn from(record: &AnomalyRecord) -> Self {
        Self {
            date: record.date,
            metric: record.metric.clone(),
            dimension: record.dimension.clone(),
            classification: record.classification,
            actual: record.actual,
            yhat: record.forecast.point_estimate,
            yhat_lower: record.forecast.lower_bound,
            yhat_upper: record.forecast.upper_bound,
        }
    }
}

/// Paths written by a run
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenArtifacts {
    pub forecast_paths: Vec<PathBuf>,
    pub anomaly_path: PathBuf,
}

/// Write the run's forecast(s) and anomaly report, replacing previous files
pub fn write_artifacts(run: &PipelineRun, config: &PipelineConfig) -> Result<WrittenArtifacts> {
    let mut forecast_paths = Vec::new();

    match &config.forecast_output {
        ForecastOutput::Primary { metric } => match run.forecast(metric) {
            Some(forecast) => {
                let path = config.forecast_path(metric);
                write_forecast(forecast, &path)?;
                forecast_paths.push(path);
            }
            None => warn!("{} was not fitted, no forecast artifact written", metric),
        },
        ForecastOutput::PerMetric => {
            for entry in run.forecasts() {
                let path = config.forecast_path(&entry.metric);
                write_forecast(&entry.forecast, &path)?;
                forecast_paths.push(path);
            }
        }
    }

    let anomaly_path = config.anomaly_path();
    write_anomalies(run.report(), &anomaly_path)?;

    Ok(WrittenArtifacts {
        forecast_paths,
        anomaly_path,
    })
}

/// Write one forecast as `ds, yhat, yhat_lower, yhat_upper`
pub fn write_forecast(forecast: &ForecastResult, path: &Path) -> Result<()> {
    write_replacing(path, |writer| {
        writer.write_record(FORECAST_HEADER)?;
        for point in forecast.points() {
            writer.serialize(ForecastRow::from(point))?;
        }
        Ok(())
    })?;
    info!(
        "{}: wrote {} forecast rows to {}",
        forecast.metric(),
        forecast.len(),
        path.display()
    );
    Ok(())
}

/// Write the anomaly report; an empty report leaves a header-only file
pub fn write_anomalies(report: &AnomalyReport, path: &Path) -> Result<()> {
    write_replacing(path, |writer| {
        writer.write_record(ANOMALY_HEADER)?;
        for record in report.records() {
            writer.serialize(AnomalyRow::from(record))?;
        }
        Ok(())
    })?;
    info!("Wrote {} anomaly rows to {}", report.len(), path.display());
    Ok(())
}

/// Read a forecast artifact back
pub fn read_forecast_artifact<P: AsRef<Path>>(path: P) -> Result<Vec<ForecastRow>> {
    let mut reader = Reader::from_path(path)?;
    let rows: Vec<ForecastRow> = reader
        .deserialize()
        .collect::<std::result::Result<_, _>>()?;
    Ok(rows)
}

/// Read an anomaly artifact back
pub fn read_anomaly_artifact<P: AsRef<Path>>(path: P) -> Result<Vec<AnomalyRow>> {
    let mut reader = Reader::from_path(path)?;
    let rows: Vec<AnomalyRow> = reader
        .deserialize()
        .collect::<std::result::Result<_, _>>()?;
    Ok(rows)
}

/// Write to a sibling temporary file, then rename it over `path`
fn write_replacing<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut Writer<File>) -> Result<()>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    let written: Result<()> = (|| {
        let mut writer = WriterBuilder::new().has_headers(false).from_path(&tmp)?;
        write(&mut writer)?;
        writer.flush()?;
        Ok(())
    })();

    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }

    fs::rename(&tmp, path)?;
    Ok(())
}
