//! Raw dataset loading and the clean per-metric series

use crate::error::{ForecastError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Days from 0001-01-01 (CE) to the Unix epoch
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Tabular dataset of daily ad metrics with a parsed date column
#[derive(Debug, Clone)]
pub struct RawDataset {
    /// Data frame as read from the source
    df: DataFrame,
    /// Trimmed name of the date column
    date_column: String,
    /// Parsed date of each row (null cells are `None`)
    dates: Vec<Option<NaiveDate>>,
}

/// Data loader for raw metric datasets
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a dataset from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P, date_column: &str) -> Result<RawDataset> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(df, date_column)
    }

    /// Create a dataset from an existing DataFrame
    pub fn from_dataframe(df: DataFrame, date_column: &str) -> Result<RawDataset> {
        let series = Self::detect_date_column(&df, date_column)?;
        let dates = parse_dates(series)?;

        let dataset = RawDataset {
            date_column: series.name().trim().to_string(),
            df,
            dates,
        };
        debug!(
            "Loaded {} rows, date column '{}', columns: {}",
            dataset.len(),
            dataset.date_column,
            dataset.column_names().join(", ")
        );
        Ok(dataset)
    }

    /// Find the date column: the configured name, then any column named like a date
    fn detect_date_column<'a>(df: &'a DataFrame, date_column: &str) -> Result<&'a Series> {
        let columns = df.get_columns();
        let wanted = date_column.trim();

        if let Some(series) = columns.iter().find(|s| s.name().trim() == wanted) {
            return Ok(series);
        }

        if let Some(series) = columns
            .iter()
            .find(|s| s.name().trim().to_lowercase().contains("date"))
        {
            return Ok(series);
        }

        if let Some(first) = columns.first() {
            if first.dtype().is_temporal() {
                return Ok(first);
            }
        }

        Err(ForecastError::DataError(format!(
            "No date column '{}' found in data",
            wanted
        )))
    }
}

impl RawDataset {
    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Get the date column name
    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    /// Parsed row dates
    pub fn dates(&self) -> &[Option<NaiveDate>] {
        &self.dates
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Check if the dataset has no rows
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Column names with surrounding whitespace removed
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .map(|s| s.name().trim().to_string())
            .collect()
    }

    /// Whether a column exists, comparing trimmed names
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    fn column(&self, name: &str) -> Option<&Series> {
        let wanted = name.trim();
        self.df.get_columns().iter().find(|s| s.name().trim() == wanted)
    }

    /// Read a column as floats; `None` when the column is absent.
    /// Null, unparseable and non-finite cells come back as `None`.
    pub fn numeric_column(&self, name: &str) -> Result<Option<Vec<Option<f64>>>> {
        let Some(series) = self.column(name) else {
            return Ok(None);
        };

        let cast = series.cast(&DataType::Float64)?;
        let values = cast
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();

        Ok(Some(values))
    }

    /// Read a column as trimmed text; `None` when the column is absent.
    /// Empty cells come back as `None`.
    pub fn text_column(&self, name: &str) -> Result<Option<Vec<Option<String>>>> {
        let Some(series) = self.column(name) else {
            return Ok(None);
        };

        let cast = series.cast(&DataType::Utf8)?;
        let values = cast
            .utf8()?
            .into_iter()
            .map(|cell| {
                cell.map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .collect();

        Ok(Some(values))
    }

    /// Distinct values of a grouping column per date, sorted.
    /// `None` when the column is absent.
    pub fn dimension_by_date(
        &self,
        name: &str,
    ) -> Result<Option<BTreeMap<NaiveDate, Vec<String>>>> {
        let Some(values) = self.text_column(name)? else {
            return Ok(None);
        };

        let mut by_date: BTreeMap<NaiveDate, Vec<String>> = BTreeMap::new();
        for (date, value) in self.dates.iter().zip(values) {
            if let (Some(date), Some(value)) = (date, value) {
                by_date.entry(*date).or_default().push(value);
            }
        }
        for values in by_date.values_mut() {
            values.sort();
            values.dedup();
        }

        Ok(Some(by_date))
    }
}

fn parse_dates(series: &Series) -> Result<Vec<Option<NaiveDate>>> {
    match series.dtype() {
        DataType::Date => days_since_epoch(series),
        DataType::Datetime(_, _) => days_since_epoch(&series.cast(&DataType::Date)?),
        _ => {
            let text = series.cast(&DataType::Utf8)?;
            let parsed = text
                .utf8()?
                .into_iter()
                .map(|cell| match cell.map(str::trim).filter(|s| !s.is_empty()) {
                    Some(raw) => parse_date(raw).map(Some),
                    None => Ok(None),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(parsed)
        }
    }
}

fn days_since_epoch(series: &Series) -> Result<Vec<Option<NaiveDate>>> {
    let days = series.cast(&DataType::Int32)?;
    let dates = days
        .i32()?
        .into_iter()
        .map(|day| match day {
            Some(day) => NaiveDate::from_num_days_from_ce_opt(UNIX_EPOCH_DAYS_FROM_CE + day)
                .map(Some)
                .ok_or_else(|| {
                    ForecastError::DataError(format!("Date out of range: {} days", day))
                }),
            None => Ok(None),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(dates)
}

/// Parse a date cell in one of the accepted layouts; any time of day is discarded
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .ok_or_else(|| ForecastError::DataError(format!("Unparseable date '{}'", raw)))
}

/// One observed day of a metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Clean daily series of one metric: sorted, unique dates, finite values
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    name: String,
    points: Vec<SeriesPoint>,
}

impl MetricSeries {
    /// Create a series, checking dates strictly increase and values are finite
    pub fn new(name: &str, points: Vec<SeriesPoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(ForecastError::InsufficientData(name.to_string()));
        }
        if let Some(pair) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(ForecastError::DataError(format!(
                "Series {} is not strictly increasing at {}",
                name, pair[1].date
            )));
        }
        if let Some(point) = points.iter().find(|p| !p.value.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "Series {} has a non-finite value on {}",
                name, point.date
            )));
        }

        Ok(Self {
            name: name.to_string(),
            points,
        })
    }

    /// Create a series from parallel date and value vectors (for testing)
    pub fn from_dates_values(name: &str, dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Dates length ({}) doesn't match values length ({})",
                dates.len(),
                values.len()
            )));
        }

        let points = dates
            .into_iter()
            .zip(values)
            .map(|(date, value)| SeriesPoint { date, value })
            .collect();
        Self::new(name, points)
    }

    /// Metric name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Observed points in date order
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// Observed values in date order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Number of observed days
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed series
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First observed date
    pub fn first_date(&self) -> NaiveDate {
        self.points[0].date
    }

    /// Last observed date
    pub fn last_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    /// Observed value on a date, if any
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }
}
