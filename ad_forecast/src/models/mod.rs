//! Forecasting models for daily metric series

use crate::data::MetricSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod seasonal_trend;

pub use seasonal_trend::{FittedSeasonalTrend, SeasonalTrendModel};

/// Expected value and prediction interval for one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl ForecastPoint {
    /// Width of the prediction interval
    pub fn width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

/// Daily forecast covering the observed range and a future horizon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Metric the forecast was fitted on
    metric: String,
    /// One point per calendar day, ascending
    points: Vec<ForecastPoint>,
    /// Last date with an actual value
    last_observed: NaiveDate,
}

impl ForecastResult {
    /// Create a forecast result, checking daily contiguity and bound ordering
    pub fn new(metric: &str, points: Vec<ForecastPoint>, last_observed: NaiveDate) -> Result<Self> {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return Err(ForecastError::ModelFitError(format!(
                "{}: forecast has no points",
                metric
            )));
        };
        if last_observed < first.date || last_observed > last.date {
            return Err(ForecastError::ModelFitError(format!(
                "{}: last observed date {} outside forecast range",
                metric, last_observed
            )));
        }
        if points
            .windows(2)
            .any(|w| (w[1].date - w[0].date).num_days() != 1)
        {
            return Err(ForecastError::ModelFitError(format!(
                "{}: forecast dates are not consecutive days",
                metric
            )));
        }
        if let Some(p) = points
            .iter()
            .find(|p| !(p.lower_bound <= p.point_estimate && p.point_estimate <= p.upper_bound))
        {
            return Err(ForecastError::ModelFitError(format!(
                "{}: interval does not bracket the estimate on {}",
                metric, p.date
            )));
        }

        Ok(Self {
            metric: metric.to_string(),
            points,
            last_observed,
        })
    }

    /// Metric name
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// All points, ascending by date
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Last date with an actual value
    pub fn last_observed(&self) -> NaiveDate {
        self.last_observed
    }

    /// Points up to and including the last observed date
    pub fn in_sample(&self) -> &[ForecastPoint] {
        &self.points[..self.split_index()]
    }

    /// Points after the last observed date
    pub fn future(&self) -> &[ForecastPoint] {
        &self.points[self.split_index()..]
    }

    /// Number of days forecast past the last observation
    pub fn horizon_days(&self) -> usize {
        self.future().len()
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed result
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point for a date, if inside the forecast range
    pub fn point_on(&self, date: NaiveDate) -> Option<&ForecastPoint> {
        let offset = (date - self.points[0].date).num_days();
        usize::try_from(offset)
            .ok()
            .and_then(|i| self.points.get(i))
    }

    /// Serialize the forecast to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn split_index(&self) -> usize {
        (self.last_observed - self.points[0].date).num_days() as usize + 1
    }
}

/// Model fitted to one metric series
pub trait FittedForecastModel: Debug {
    /// Forecast every day from the first observation through `horizon_days` past the last
    fn predict(&self, horizon_days: usize) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be fitted to a metric series
pub trait ForecastModel: Debug + Clone {
    /// The type of fitted model produced
    type Fitted: FittedForecastModel;

    /// Fit the model to a series
    fn fit(&self, series: &MetricSeries) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn point(d: u32, half: f64) -> ForecastPoint {
        ForecastPoint {
            date: day(d),
            point_estimate: 10.0,
            lower_bound: 10.0 - half,
            upper_bound: 10.0 + half,
        }
    }

    #[test]
    fn test_in_sample_and_future_split() {
        let points = (1..=5).map(|d| point(d, 1.0)).collect();
        let result = ForecastResult::new("eCPM", points, day(3)).unwrap();

        assert_eq!(result.in_sample().len(), 3);
        assert_eq!(result.future().len(), 2);
        assert_eq!(result.horizon_days(), 2);
        assert_eq!(result.point_on(day(4)).unwrap().date, day(4));
        assert!(result.point_on(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()).is_none());
        assert!(result.to_json().unwrap().contains("point_estimate"));
    }

    #[test]
    fn test_rejects_gaps_and_inverted_bounds() {
        let gapped = vec![point(1, 1.0), point(3, 1.0)];
        assert!(ForecastResult::new("eCPM", gapped, day(1)).is_err());

        let inverted = vec![point(1, -1.0)];
        assert!(ForecastResult::new("eCPM", inverted, day(1)).is_err());
    }
}
