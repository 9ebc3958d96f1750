use ad_forecast::config::ModelConfig;
use ad_forecast::data::MetricSeries;
use ad_forecast::error::ForecastError;
use ad_forecast::models::{FittedForecastModel, ForecastModel, SeasonalTrendModel};
use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use rstest::rstest;

const WEEKLY_PATTERN: [f64; 7] = [0.0, 4.0, 6.0, 5.0, 3.0, -8.0, -10.0];

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn series_from(values: Vec<f64>) -> MetricSeries {
    let dates = (0..values.len() as i64)
        .map(|i| start() + Duration::days(i))
        .collect();
    MetricSeries::from_dates_values("eCPM", dates, values).unwrap()
}

/// Trend + weekly pattern + small deterministic noise
fn seasonal_values(n: usize) -> Vec<f64> {
    (0..n)
        .map(|t| {
            let noise = ((t * 7919) % 13) as f64 - 6.0;
            100.0 + 0.5 * t as f64 + WEEKLY_PATTERN[t % 7] + noise * 0.3
        })
        .collect()
}

fn default_model() -> SeasonalTrendModel {
    SeasonalTrendModel::new(ModelConfig::default()).unwrap()
}

#[rstest]
#[case(7)]
#[case(30)]
fn test_forecast_spans_history_and_horizon(#[case] horizon: usize) {
    let series = series_from(seasonal_values(56));
    let fitted = default_model().fit(&series).unwrap();

    let forecast = fitted.predict(horizon).unwrap();

    assert_eq!(forecast.len(), 56 + horizon);
    assert_eq!(forecast.horizon_days(), horizon);
    assert_eq!(forecast.points()[0].date, series.first_date());
    assert_eq!(forecast.last_observed(), series.last_date());
    assert_eq!(
        forecast.points().last().unwrap().date,
        series.last_date() + Duration::days(horizon as i64)
    );
}

#[test]
fn test_bounds_bracket_and_widen() {
    let series = series_from(seasonal_values(56));
    let forecast = default_model().fit(&series).unwrap().predict(30).unwrap();

    for p in forecast.points() {
        assert!(p.lower_bound <= p.point_estimate, "lower above estimate on {}", p.date);
        assert!(p.point_estimate <= p.upper_bound, "upper below estimate on {}", p.date);
    }

    let last_in_sample = forecast.in_sample().last().unwrap().width();
    let mut previous = last_in_sample;
    for p in forecast.future() {
        assert!(p.width() >= previous);
        previous = p.width();
    }
    assert!(previous > last_in_sample);
}

#[test]
fn test_in_sample_widths_are_constant() {
    let series = series_from(seasonal_values(42));
    let forecast = default_model().fit(&series).unwrap().predict(7).unwrap();

    let first = forecast.in_sample()[0].width();
    for p in forecast.in_sample() {
        assert_relative_eq!(p.width(), first, epsilon = 1e-9);
    }
}

#[test]
fn test_noise_free_series_is_recovered() {
    let values: Vec<f64> = (0..28)
        .map(|t| 50.0 + 2.0 * t as f64 + WEEKLY_PATTERN[t % 7])
        .collect();
    let series = series_from(values.clone());

    let fitted = default_model().fit(&series).unwrap();
    let forecast = fitted.predict(7).unwrap();

    for (p, actual) in forecast.in_sample().iter().zip(&values) {
        assert_relative_eq!(p.point_estimate, *actual, epsilon = 1e-6);
    }
    // Day 28 continues the trend on the baseline weekday
    assert_relative_eq!(forecast.future()[0].point_estimate, 106.0, epsilon = 1e-6);
    assert!(fitted.mae() < 1e-6);
}

#[test]
fn test_too_few_points_is_a_fit_error() {
    let series = series_from(seasonal_values(13));
    let result = default_model().fit(&series);
    assert!(matches!(result, Err(ForecastError::ModelFitError(_))));

    let series = series_from(seasonal_values(14));
    assert!(default_model().fit(&series).is_ok());
}

#[test]
fn test_constant_series_is_a_fit_error() {
    let series = series_from(vec![10.0; 30]);
    let result = default_model().fit(&series);
    assert!(matches!(result, Err(ForecastError::ModelFitError(_))));
}

#[test]
fn test_unobserved_weekday_is_a_fit_error() {
    // Weekly sampling only ever sees one seasonal slot
    let dates = (0..20).map(|i| start() + Duration::days(7 * i)).collect();
    let values = (0..20).map(|i| 10.0 + i as f64).collect();
    let series = MetricSeries::from_dates_values("Clicks", dates, values).unwrap();

    let result = default_model().fit(&series);
    assert!(matches!(result, Err(ForecastError::ModelFitError(_))));
}

#[test]
fn test_gapped_series_forecasts_every_day() {
    let dates: Vec<NaiveDate> = (0..40)
        .filter(|i| i % 5 != 3)
        .map(|i| start() + Duration::days(i))
        .collect();
    let values: Vec<f64> = (0..dates.len()).map(|i| 20.0 + (i % 7) as f64).collect();
    let series = MetricSeries::from_dates_values("Revenue", dates, values).unwrap();

    let forecast = default_model().fit(&series).unwrap().predict(7).unwrap();

    assert_eq!(forecast.in_sample().len(), 40);
    assert_eq!(forecast.len(), 47);
}

#[test]
fn test_fit_is_deterministic() {
    let series = series_from(seasonal_values(60));
    let a = default_model().fit(&series).unwrap().predict(14).unwrap();
    let b = default_model().fit(&series).unwrap().predict(14).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_wider_confidence_widens_intervals() {
    let series = series_from(seasonal_values(42));
    let narrow = default_model().fit(&series).unwrap().predict(7).unwrap();
    let wide = SeasonalTrendModel::new(ModelConfig {
        confidence: 0.99,
        ..ModelConfig::default()
    })
    .unwrap()
    .fit(&series)
    .unwrap()
    .predict(7)
    .unwrap();

    for (n, w) in narrow.points().iter().zip(wide.points()) {
        assert_relative_eq!(n.point_estimate, w.point_estimate, epsilon = 1e-9);
        assert!(w.width() > n.width());
    }
}

#[test]
fn test_model_parameter_validation() {
    let result = SeasonalTrendModel::new(ModelConfig {
        confidence: 1.5,
        ..ModelConfig::default()
    });
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));

    let result = SeasonalTrendModel::new(ModelConfig {
        seasonal_period: 0,
        ..ModelConfig::default()
    });
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
}
