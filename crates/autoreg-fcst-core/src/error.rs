//! Error types for the forecasting engine.

use thiserror::Error;

/// Result type for forecaster operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Error types for forecaster operations.
///
/// All validation is performed eagerly at call entry: when a method returns
/// an error, no partial state mutation has taken place.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Bad constructor arguments (e.g. a zero window size).
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Wrong shape, misaligned index, or mismatched dimensions in an input.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The window-predictor callable returned non-finite feature values.
    #[error("Predictor contract violation: {0}")]
    PredictorContract(String),

    /// Out-of-sample residuals were requested before any were stored.
    #[error("Residuals unavailable: {0}")]
    ResidualsUnavailable(String),

    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Numerical failure inside the regressor or the simulation loop.
    #[error("Computation error: {0}")]
    Computation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ForecastError::Configuration("`window_size` must be at least 1".into());
        assert_eq!(
            format!("{}", err),
            "Invalid configuration: `window_size` must be at least 1"
        );

        let err = ForecastError::Validation("`exog` must have 2 columns, got 1".into());
        assert_eq!(
            format!("{}", err),
            "Invalid input: `exog` must have 2 columns, got 1"
        );

        let err = ForecastError::InsufficientData { needed: 10, got: 3 };
        assert_eq!(
            format!("{}", err),
            "Insufficient data: need at least 10 observations, got 3"
        );

        let err = ForecastError::PredictorContract("NaN at feature 2".into());
        assert_eq!(
            format!("{}", err),
            "Predictor contract violation: NaN at feature 2"
        );
    }

    #[test]
    fn test_error_construction() {
        let err = ForecastError::InsufficientData { needed: 5, got: 2 };
        if let ForecastError::InsufficientData { needed, got } = err {
            assert_eq!(needed, 5);
            assert_eq!(got, 2);
        } else {
            panic!("Expected InsufficientData variant");
        }

        let err = ForecastError::ResidualsUnavailable("no out-of-sample residuals".into());
        assert!(matches!(err, ForecastError::ResidualsUnavailable(_)));
    }
}
