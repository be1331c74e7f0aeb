//! Forecast accuracy metrics.
//!
//! Used to score forecasts against held-out observations, typically when
//! building the out-of-sample residual pool for interval estimation:
//! the errors `actual - forecast` feed
//! [`set_out_sample_residuals`](crate::forecaster::Forecaster::set_out_sample_residuals),
//! the aggregates here summarize them.

use crate::error::{ForecastError, Result};

/// Mean Absolute Error.
///
/// Average error magnitude in the units of the series.
pub fn mae(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    validate_inputs(actual, forecast)?;
    let sum: f64 = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| (a - f).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Mean Squared Error.
///
/// Penalizes large errors more heavily than small ones.
pub fn mse(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    validate_inputs(actual, forecast)?;
    let sum: f64 = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| (a - f).powi(2))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Root Mean Squared Error.
pub fn rmse(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    Ok(mse(actual, forecast)?.sqrt())
}

/// Mean Absolute Percentage Error, in percent.
///
/// Zero actual values are excluded from the average; returns NaN when every
/// actual value is zero.
pub fn mape(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    validate_inputs(actual, forecast)?;
    let sum: f64 = actual
        .iter()
        .zip(forecast.iter())
        .filter(|(a, _)| a.abs() > f64::EPSILON)
        .map(|(a, f)| ((a - f) / a).abs())
        .sum();
    let count = actual.iter().filter(|a| a.abs() > f64::EPSILON).count();
    if count == 0 {
        return Ok(f64::NAN);
    }
    Ok(sum / count as f64 * 100.0)
}

fn validate_inputs(actual: &[f64], forecast: &[f64]) -> Result<()> {
    if actual.len() != forecast.len() {
        return Err(ForecastError::Validation(format!(
            "actual and forecast arrays must have the same length: {} vs {}",
            actual.len(),
            forecast.len()
        )));
    }
    if actual.is_empty() {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mae() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let forecast = vec![1.1, 2.2, 2.9, 4.1, 4.8];
        assert_relative_eq!(mae(&actual, &forecast).unwrap(), 0.14, epsilon = 0.01);
    }

    #[test]
    fn test_mse_and_rmse() {
        let actual = vec![1.0, 2.0, 3.0];
        let forecast = vec![2.0, 2.0, 5.0];
        assert_relative_eq!(mse(&actual, &forecast).unwrap(), 5.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(
            rmse(&actual, &forecast).unwrap(),
            (5.0f64 / 3.0).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_mape_skips_zero_actuals() {
        let actual = vec![0.0, 2.0, 4.0];
        let forecast = vec![1.0, 1.0, 5.0];
        // Only the two nonzero actuals participate: (0.5 + 0.25) / 2 * 100.
        assert_relative_eq!(mape(&actual, &forecast).unwrap(), 37.5, epsilon = 1e-9);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(mae(&[1.0], &[1.0, 2.0]).is_err());
        assert!(mse(&[], &[]).is_err());
    }
}
