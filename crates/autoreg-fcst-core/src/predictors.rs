//! Window-to-feature predictor capability.
//!
//! The forecaster is parameterized over a callable that maps a trailing
//! window of series values to a fixed-length feature vector. The callable
//! must be pure, deterministic, and never return non-finite values; the
//! engine checks the latter at every invocation, during training and
//! inference alike.

use crate::error::{ForecastError, Result};

/// Maps a window of `window_size` values to a feature vector.
///
/// Implemented for plain closures, so callers can pass a function directly:
///
/// ```
/// use autoreg_fcst_core::predictors::WindowPredictor;
///
/// let mean_and_last = |w: &[f64]| vec![w.iter().sum::<f64>() / w.len() as f64, w[w.len() - 1]];
/// assert_eq!(mean_and_last.features(&[1.0, 2.0, 3.0]), vec![2.0, 3.0]);
/// ```
pub trait WindowPredictor {
    /// Compute the feature vector for one window. The window is passed in
    /// temporal order, oldest value first.
    fn features(&self, window: &[f64]) -> Vec<f64>;
}

impl<F> WindowPredictor for F
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    fn features(&self, window: &[f64]) -> Vec<f64> {
        self(window)
    }
}

/// Uses the raw window values as features, one lag per window position.
///
/// This is the plain autoregressive setup: with `window_size = n`, feature
/// `i` is the value `n - i` steps before the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LagPredictor;

impl WindowPredictor for LagPredictor {
    fn features(&self, window: &[f64]) -> Vec<f64> {
        window.to_vec()
    }
}

/// Reject feature vectors containing NaN or infinite values.
pub(crate) fn validate_features(features: &[f64]) -> Result<()> {
    if let Some(pos) = features.iter().position(|v| !v.is_finite()) {
        return Err(ForecastError::PredictorContract(format!(
            "predictor returned a non-finite value at feature {}",
            pos
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_predictor_identity() {
        let features = LagPredictor.features(&[4.0, 5.0, 6.0]);
        assert_eq!(features, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_closure_predictor() {
        let rolling_mean = |w: &[f64]| vec![w.iter().sum::<f64>() / w.len() as f64];
        assert_eq!(rolling_mean.features(&[1.0, 2.0, 3.0]), vec![2.0]);
    }

    #[test]
    fn test_validate_features_rejects_nan() {
        assert!(validate_features(&[1.0, 2.0]).is_ok());
        let err = validate_features(&[1.0, f64::NAN]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ForecastError::PredictorContract(_)
        ));
        assert!(validate_features(&[f64::NEG_INFINITY]).is_err());
    }
}
