//! Additive linear trend plus periodic seasonality, fitted by least squares
//!
//! The design for a day `t` days after the first observation is
//! `[1, t / span, d_1(t), …, d_{m-1}(t)]`, where `d_k` marks seasonal slot
//! `t mod m` (slot 0 is the baseline). With the default period of 7 the
//! slots are weekdays.
//!
//! Prediction intervals are derived from the fit itself. With `σ` the
//! residual standard deviation, `n` the number of observations and `se_b`
//! the per-day standard error of the trend slope, a day `h` days after the
//! last observation (`h = 0` in-sample) gets
//!
//! ```text
//! var(h) = σ² · (1 + h / n) + (h · se_b)²
//! bound  = estimate ± z · sqrt(var(h))
//! ```
//!
//! where `z` is the standard normal quantile for the configured confidence.
//! Both terms are non-decreasing in `h`, so widths never shrink going
//! forward and always bracket the estimate.

use crate::config::{ModelConfig, MAX_HORIZON_DAYS};
use crate::data::MetricSeries;
use crate::error::{ForecastError, Result};
use crate::models::{FittedForecastModel, ForecastModel, ForecastPoint, ForecastResult};
use chrono::{Duration, NaiveDate};
use log::info;
use series_math::stats;
use series_math::{LeastSquares, LeastSquaresFit};
use statrs::distribution::{ContinuousCDF, Normal};

/// Index of the trend coefficient in the design
const TREND_COLUMN: usize = 1;

/// Trend + seasonality model specification
#[derive(Debug, Clone)]
pub struct SeasonalTrendModel {
    /// Name of the model
    name: String,
    /// Model parameters
    config: ModelConfig,
    /// Two-sided normal quantile for the interval
    z: f64,
}

/// Seasonal trend model fitted to one series
#[derive(Debug, Clone)]
pub struct FittedSeasonalTrend {
    name: String,
    metric: String,
    start: NaiveDate,
    last_observed: NaiveDate,
    span: f64,
    period: usize,
    fit: LeastSquaresFit,
    observations: usize,
    sigma: f64,
    slope_se: f64,
    z: f64,
    mae: f64,
    rmse: f64,
}

impl SeasonalTrendModel {
    /// Create a model from its parameters
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
        let z = normal.inverse_cdf((1.0 + config.confidence) / 2.0);

        Ok(Self {
            name: format!(
                "Seasonal Trend (period={}, confidence={})",
                config.seasonal_period, config.confidence
            ),
            config,
            z,
        })
    }

    /// Model parameters
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl ForecastModel for SeasonalTrendModel {
    type Fitted = FittedSeasonalTrend;

    fn fit(&self, series: &MetricSeries) -> Result<Self::Fitted> {
        let metric = series.name();
        let values = series.values();
        let n = values.len();

        let required = self.config.required_observations();
        if n < required {
            return Err(ForecastError::ModelFitError(format!(
                "{}: need at least {} observations, have {}",
                metric, required, n
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFitError(format!(
                "{}: series contains non-finite values",
                metric
            )));
        }

        let scale = 1.0 + stats::mean(&values.iter().map(|v| v.abs()).collect::<Vec<_>>())?;
        if stats::std_dev(&values)? <= 1e-12 * scale {
            return Err(ForecastError::ModelFitError(format!(
                "{}: series is constant, seasonality is unidentifiable",
                metric
            )));
        }

        let start = series.first_date();
        let last_observed = series.last_date();
        let span = (last_observed - start).num_days().max(1) as f64;
        let period = self.config.seasonal_period;

        let design: Vec<Vec<f64>> = series
            .points()
            .iter()
            .map(|p| design_row(start, span, period, p.date))
            .collect();

        let fit = LeastSquares::new()
            .fit(&design, &values)
            .map_err(|e| ForecastError::ModelFitError(format!("{}: {}", metric, e)))?;

        let sigma = fit.residual_std_error().max(1e-9 * scale);
        let slope_se = fit
            .coefficient_std_error(TREND_COLUMN, sigma)
            .unwrap_or(0.0)
            / span;
        let mae = stats::mean_absolute_error(&values, fit.fitted())?;
        let rmse = stats::root_mean_squared_error(&values, fit.fitted())?;

        info!(
            "{}: fitted {} on {} days ({} to {}), sigma={:.6}, mae={:.6}",
            metric, self.name, n, start, last_observed, sigma, mae
        );

        Ok(FittedSeasonalTrend {
            name: self.name.clone(),
            metric: metric.to_string(),
            start,
            last_observed,
            span,
            period,
            fit,
            observations: n,
            sigma,
            slope_se,
            z: self.z,
            mae,
            rmse,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedSeasonalTrend {
    /// Metric the model was fitted on
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Residual standard deviation used for the intervals
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Fitted coefficients: intercept, trend, seasonal offsets
    pub fn coefficients(&self) -> &[f64] {
        self.fit.coefficients()
    }

    /// In-sample mean absolute error
    pub fn mae(&self) -> f64 {
        self.mae
    }

    /// In-sample root mean squared error
    pub fn rmse(&self) -> f64 {
        self.rmse
    }

    /// Interval half width `h` days after the last observation
    pub fn half_width(&self, days_ahead: u32) -> f64 {
        let h = f64::from(days_ahead);
        let variance = self.sigma.powi(2) * (1.0 + h / self.observations as f64)
            + (h * self.slope_se).powi(2);
        self.z * variance.sqrt()
    }
}

impl FittedForecastModel for FittedSeasonalTrend {
    fn predict(&self, horizon_days: usize) -> Result<ForecastResult> {
        if horizon_days > MAX_HORIZON_DAYS {
            return Err(ForecastError::InvalidParameter(format!(
                "Horizon of {} days exceeds the maximum of {}",
                horizon_days, MAX_HORIZON_DAYS
            )));
        }

        let observed_days = (self.last_observed - self.start).num_days();
        let total = i64::try_from(horizon_days)
            .ok()
            .and_then(|h| observed_days.checked_add(h))
            .and_then(|t| t.checked_add(1))
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "Horizon of {} days is too long",
                    horizon_days
                ))
            })?;

        let mut points = Vec::with_capacity(usize::try_from(total).unwrap_or(0));
        for offset in 0..total {
            let date = self.start + Duration::days(offset);
            let estimate = self
                .fit
                .predict_row(&design_row(self.start, self.span, self.period, date))?;
            // Bounded by MAX_HORIZON_DAYS
            let days_ahead = (offset - observed_days).max(0) as u32;
            let half = self.half_width(days_ahead);

            points.push(ForecastPoint {
                date,
                point_estimate: estimate,
                lower_bound: estimate - half,
                upper_bound: estimate + half,
            });
        }

        ForecastResult::new(&self.metric, points, self.last_observed)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn design_row(start: NaiveDate, span: f64, period: usize, date: NaiveDate) -> Vec<f64> {
    let t = (date - start).num_days();
    let slot = t.rem_euclid(period as i64) as usize;

    let mut row = Vec::with_capacity(period + 1);
    row.push(1.0);
    row.push(t as f64 / span);
    row.extend((1..period).map(|k| if k == slot { 1.0 } else { 0.0 }));
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_design_row_marks_one_slot() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let row = design_row(start, 10.0, 7, start + Duration::days(9));

        assert_eq!(row.len(), 8);
        assert_eq!(row[0], 1.0);
        assert!((row[1] - 0.9).abs() < 1e-12);
        // 9 mod 7 = 2, so dummy d_2 (index 3) is set
        assert_eq!(&row[2..], &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_baseline_slot_has_no_dummy() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let row = design_row(start, 10.0, 7, start + Duration::days(7));
        assert!(row[2..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_default_z_is_ninety_five_percent() {
        let model = SeasonalTrendModel::new(ModelConfig::default()).unwrap();
        assert!((model.z - 1.959964).abs() < 1e-4);
    }

    #[test]
    fn test_oversized_horizon_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..28).map(|i| start + Duration::days(i)).collect();
        let values = (0..28).map(|i| 10.0 + (i % 7) as f64 + 0.1 * i as f64).collect();
        let series = MetricSeries::from_dates_values("eCPM", dates, values).unwrap();
        let fitted = SeasonalTrendModel::new(ModelConfig::default())
            .unwrap()
            .fit(&series)
            .unwrap();

        for horizon in [MAX_HORIZON_DAYS + 1, usize::MAX / 2, usize::MAX] {
            assert!(matches!(
                fitted.predict(horizon),
                Err(ForecastError::InvalidParameter(_))
            ));
        }
        assert_eq!(
            fitted.predict(MAX_HORIZON_DAYS).unwrap().horizon_days(),
            MAX_HORIZON_DAYS
        );
    }
}
