//! Interval-based anomaly classification

use crate::data::MetricSeries;
use crate::models::{ForecastPoint, ForecastResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an actual value relative to its prediction interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Normal,
    Positive,
    Negative,
}

impl Classification {
    /// Classify an actual value; values on a bound are Normal
    pub fn from_bounds(actual: f64, lower: f64, upper: f64) -> Self {
        if actual > upper {
            Classification::Positive
        } else if actual < lower {
            Classification::Negative
        } else {
            Classification::Normal
        }
    }

    /// Whether the value fell outside its interval
    pub fn is_anomaly(&self) -> bool {
        *self != Classification::Normal
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Classification::Normal => "Normal",
            Classification::Positive => "Positive",
            Classification::Negative => "Negative",
        };
        f.write_str(label)
    }
}

/// Actual-versus-forecast outcome for one metric on one day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    pub date: NaiveDate,
    pub metric: String,
    pub actual: f64,
    pub forecast: ForecastPoint,
    pub classification: Classification,
    pub dimension: Option<String>,
}

impl AnomalyRecord {
    /// Copy of this record tagged with a dimension value
    pub fn with_dimension(&self, dimension: Option<String>) -> Self {
        Self {
            dimension,
            ..self.clone()
        }
    }
}

/// Classify every observed day that the forecast covers in-sample.
/// Future dates have no actual and are never classified.
pub fn classify(series: &MetricSeries, forecast: &ForecastResult) -> Vec<AnomalyRecord> {
    let last_observed = forecast.last_observed();

    series
        .points()
        .iter()
        .filter(|p| p.date <= last_observed)
        .filter_map(|p| {
            forecast.point_on(p.date).map(|fp| AnomalyRecord {
                date: p.date,
                metric: series.name().to_string(),
                actual: p.value,
                forecast: *fp,
                classification: Classification::from_bounds(
                    p.value,
                    fp.lower_bound,
                    fp.upper_bound,
                ),
                dimension: None,
            })
        })
        .collect()
}

/// Consolidated non-Normal records across metrics and dimensions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnomalyReport {
    records: Vec<AnomalyRecord>,
}

impl AnomalyReport {
    /// Build a report, dropping Normal records and ordering by date, metric, dimension
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = AnomalyRecord>,
    {
        let mut records: Vec<AnomalyRecord> = records
            .into_iter()
            .filter(|r| r.classification.is_anomaly())
            .collect();
        records.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.metric.cmp(&b.metric))
                .then_with(|| a.dimension.cmp(&b.dimension))
        });

        Self { records }
    }

    /// Anomalous records in report order
    pub fn records(&self) -> &[AnomalyRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the report has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one metric
    pub fn for_metric<'a>(&'a self, metric: &'a str) -> impl Iterator<Item = &'a AnomalyRecord> {
        self.records.iter().filter(move |r| r.metric == metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(11.0, Classification::Positive)]
    #[case(10.0, Classification::Normal)]
    #[case(5.0, Classification::Normal)]
    #[case(0.0, Classification::Normal)]
    #[case(-0.5, Classification::Negative)]
    fn test_from_bounds(#[case] actual: f64, #[case] expected: Classification) {
        assert_eq!(Classification::from_bounds(actual, 0.0, 10.0), expected);
    }

    fn record(day: u32, metric: &str, classification: Classification) -> AnomalyRecord {
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        AnomalyRecord {
            date,
            metric: metric.to_string(),
            actual: 1.0,
            forecast: ForecastPoint {
                date,
                point_estimate: 1.0,
                lower_bound: 0.0,
                upper_bound: 2.0,
            },
            classification,
            dimension: None,
        }
    }

    #[test]
    fn test_report_drops_normal_and_orders() {
        let report = AnomalyReport::from_records(vec![
            record(2, "eCPM", Classification::Negative),
            record(1, "Revenue", Classification::Positive),
            record(2, "Clicks", Classification::Positive),
            record(1, "CTR", Classification::Normal),
        ]);

        let keys: Vec<(u32, &str)> = report
            .records()
            .iter()
            .map(|r| (chrono::Datelike::day(&r.date), r.metric.as_str()))
            .collect();
        assert_eq!(keys, vec![(1, "Revenue"), (2, "Clicks"), (2, "eCPM")]);
        assert_eq!(report.for_metric("eCPM").count(), 1);
    }
}
