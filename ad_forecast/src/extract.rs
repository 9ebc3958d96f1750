//! Metric catalogue and per-metric series extraction

use crate::data::{MetricSeries, RawDataset, SeriesPoint};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use log::{debug, warn};

/// A row's date and its value, if any
type DatedValue = (NaiveDate, Option<f64>);

/// Where a metric's values come from
#[derive(Debug, Clone, PartialEq)]
pub enum MetricSource {
    /// A native dataset column
    Column(String),
    /// A native column if present, otherwise `numerator / denominator`
    Ratio {
        column: String,
        numerator: String,
        denominator: String,
    },
}

/// Logical metric name and how to obtain it
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub name: String,
    pub source: MetricSource,
}

impl MetricSpec {
    /// Metric read straight from a column
    pub fn column(name: &str, column: &str) -> Self {
        Self {
            name: name.to_string(),
            source: MetricSource::Column(column.to_string()),
        }
    }

    /// Metric read from a column or derived as a ratio of two others
    pub fn ratio(name: &str, column: &str, numerator: &str, denominator: &str) -> Self {
        Self {
            name: name.to_string(),
            source: MetricSource::Ratio {
                column: column.to_string(),
                numerator: numerator.to_string(),
                denominator: denominator.to_string(),
            },
        }
    }
}

/// Ordered list of tracked metrics
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCatalogue {
    specs: Vec<MetricSpec>,
}

impl Default for MetricCatalogue {
    /// The five ad metrics, in reporting order
    fn default() -> Self {
        Self::new(vec![
            MetricSpec::column("eCPM", "Observed eCPM (USD)"),
            MetricSpec::ratio("CTR", "CTR", "Clicks", "Impressions"),
            MetricSpec::column("Clicks", "Clicks"),
            MetricSpec::column("Impressions", "Impressions"),
            MetricSpec::column("Revenue", "Est. earnings (USD)"),
        ])
    }
}

impl MetricCatalogue {
    /// Create a catalogue from explicit entries
    pub fn new(specs: Vec<MetricSpec>) -> Self {
        Self { specs }
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = &MetricSpec> {
        self.specs.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Check if the catalogue has no entries
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Look up an entry by metric name
    pub fn get(&self, name: &str) -> Option<&MetricSpec> {
        self.specs.iter().find(|s| s.name == name)
    }
}

/// Extract the clean series of one metric from the dataset
pub fn extract(dataset: &RawDataset, spec: &MetricSpec) -> Result<MetricSeries> {
    let raw = raw_values(dataset, spec)?;

    let mut rows: Vec<DatedValue> = dataset
        .dates()
        .iter()
        .zip(raw)
        .filter_map(|(date, value)| date.map(|d| (d, value)))
        .collect();
    // Stable, so rows sharing a date keep file order
    rows.sort_by_key(|(date, _)| *date);

    let (collapsed, merged) = collapse_dates(rows);
    if merged > 0 {
        warn!(
            "{}: merged {} row(s) sharing a date, last non-missing value kept",
            spec.name, merged
        );
    }

    let mut points = Vec::with_capacity(collapsed.len());
    let mut carried: Option<f64> = None;
    let mut filled = 0usize;
    let mut dropped = 0usize;
    for (date, value) in collapsed {
        match value.or(carried) {
            Some(v) => {
                if value.is_none() {
                    filled += 1;
                }
                carried = Some(v);
                points.push(SeriesPoint { date, value: v });
            }
            None => dropped += 1,
        }
    }

    debug!(
        "{}: {} points, {} forward-filled, {} leading missing dropped",
        spec.name,
        points.len(),
        filled,
        dropped
    );

    if points.is_empty() {
        return Err(ForecastError::InsufficientData(spec.name.clone()));
    }

    MetricSeries::new(&spec.name, points)
}

/// Merge date-sorted rows sharing a date; returns the rows and how many were merged away
fn collapse_dates(rows: Vec<DatedValue>) -> (Vec<DatedValue>, usize) {
    let total = rows.len();
    let mut collapsed: Vec<DatedValue> = Vec::with_capacity(total);
    for (date, value) in rows {
        if let Some((last_date, last_value)) = collapsed.last_mut() {
            if *last_date == date {
                if value.is_some() {
                    *last_value = value;
                }
                continue;
            }
        }
        collapsed.push((date, value));
    }
    let merged = total - collapsed.len();
    (collapsed, merged)
}

/// Per-row values of a metric, before date handling
fn raw_values(dataset: &RawDataset, spec: &MetricSpec) -> Result<Vec<Option<f64>>> {
    match &spec.source {
        MetricSource::Column(column) => dataset.numeric_column(column)?.ok_or_else(|| {
            ForecastError::DerivationError {
                metric: spec.name.clone(),
                missing: vec![column.clone()],
            }
        }),
        MetricSource::Ratio {
            column,
            numerator,
            denominator,
        } => {
            if let Some(values) = dataset.numeric_column(column)? {
                return Ok(values);
            }

            let num = dataset.numeric_column(numerator)?;
            let den = dataset.numeric_column(denominator)?;
            match (num, den) {
                (Some(num), Some(den)) => {
                    debug!("{}: derived as {} / {}", spec.name, numerator, denominator);
                    Ok(num
                        .into_iter()
                        .zip(den)
                        .map(|(n, d)| match (n, d) {
                            (Some(n), Some(d)) if d != 0.0 => Some(n / d),
                            _ => None,
                        })
                        .collect())
                }
                (num, den) => {
                    let mut missing = vec![column.clone()];
                    if num.is_none() {
                        missing.push(numerator.clone());
                    }
                    if den.is_none() {
                        missing.push(denominator.clone());
                    }
                    Err(ForecastError::DerivationError {
                        metric: spec.name.clone(),
                        missing,
                    })
                }
            }
        }
    }
}
