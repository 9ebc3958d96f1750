use ad_forecast::error::ForecastError;
use series_math::MathError;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);
    assert!(matches!(forecast_error, ForecastError::IoError(_)));

    let json_error = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
    let forecast_error = ForecastError::from(json_error);
    assert!(matches!(forecast_error, ForecastError::ConfigError(_)));

    // A singular design is a fit failure for the metric
    let math_error = MathError::Singular("pivot 3".to_string());
    match ForecastError::from(math_error) {
        ForecastError::ModelFitError(msg) => assert!(msg.contains("pivot 3")),
        other => panic!("Expected ModelFitError, got {:?}", other),
    }
}

#[test]
fn test_error_display() {
    let error = ForecastError::InvalidParameter("confidence must be in (0, 1)".to_string());
    assert!(error.to_string().contains("confidence must be in (0, 1)"));

    let error = ForecastError::DerivationError {
        metric: "CTR".to_string(),
        missing: vec!["CTR".to_string(), "Impressions".to_string()],
    };
    assert_eq!(
        error.to_string(),
        "Derivation error for CTR: missing column(s) CTR, Impressions"
    );

    let error = ForecastError::NoUsableMetrics(5);
    assert!(error.to_string().contains("all 5 metric(s) failed"));

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let error_string = ForecastError::from(io_error).to_string();
    assert!(error_string.contains("IO error"));
    assert!(error_string.contains("permission denied"));
}

#[test]
fn test_metric_recoverable_errors() {
    let recoverable = [
        ForecastError::DerivationError {
            metric: "CTR".to_string(),
            missing: vec!["Impressions".to_string()],
        },
        ForecastError::InsufficientData("Revenue".to_string()),
        ForecastError::ModelFitError("constant series".to_string()),
    ];
    for error in &recoverable {
        assert!(error.is_metric_recoverable(), "{} should be recoverable", error);
    }

    let fatal = [
        ForecastError::DataError("no date column".to_string()),
        ForecastError::NoUsableMetrics(5),
        ForecastError::InvalidParameter("horizon".to_string()),
        ForecastError::PolarsError("bad frame".to_string()),
        ForecastError::IoError(io::Error::new(io::ErrorKind::Other, "disk full")),
    ];
    for error in &fatal {
        assert!(!error.is_metric_recoverable(), "{} should be fatal", error);
    }
}

#[test]
fn test_result_mapping() {
    let result: Result<(), &str> = Err("singular design");
    let mapped = result.map_err(|e| ForecastError::ModelFitError(e.to_string()));

    if let Err(ForecastError::ModelFitError(msg)) = mapped {
        assert_eq!(msg, "singular design");
    } else {
        panic!("Wrong error variant");
    }
}
