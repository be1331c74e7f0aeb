//! Regressor capability and the built-in least-squares implementation.
//!
//! The engine treats the regression model as an external collaborator with a
//! narrow surface: train on a design matrix, predict a scalar per row, and
//! optionally expose coefficients or impurity-based feature importances for
//! introspection. Anything satisfying [`Regressor`] can drive the
//! forecaster; [`LinearRegressor`] is the OLS implementation built on
//! anofox-regression.

use crate::error::{ForecastError, Result};

use anofox_regression::prelude::*;
use anofox_regression::Regressor as _;

/// Point-prediction regression capability.
///
/// `x` is row-major: one row per observation, one column per feature. Row
/// width must be identical across calls for a given fitted model.
pub trait Regressor {
    /// Train on the design matrix and aligned targets.
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()>;

    /// Predict one scalar per row of `x`.
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>>;

    /// Coefficients aligned with feature columns, for linear families.
    fn coefficients(&self) -> Option<Vec<f64>> {
        None
    }

    /// Impurity-based importances aligned with feature columns, for tree
    /// ensembles.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// Ordinary least squares regressor.
///
/// Fitting solves the least-squares problem through anofox-regression's
/// `OlsRegressor` on faer matrices; the intercept and coefficients are then
/// extracted so prediction is a plain dot product.
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    with_intercept: bool,
    intercept: f64,
    coefs: Vec<f64>,
    fitted: bool,
}

impl LinearRegressor {
    pub fn new() -> Self {
        Self {
            with_intercept: true,
            intercept: 0.0,
            coefs: Vec::new(),
            fitted: false,
        }
    }

    /// OLS through the origin.
    pub fn without_intercept() -> Self {
        Self {
            with_intercept: false,
            ..Self::new()
        }
    }

    /// Fitted intercept. Zero when fitted without one.
    pub fn intercept(&self) -> Option<f64> {
        self.fitted.then_some(self.intercept)
    }
}

impl Default for LinearRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Regressor for LinearRegressor {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        let n = y.len();
        if x.len() != n {
            return Err(ForecastError::Validation(format!(
                "design matrix has {} rows but {} targets were given",
                x.len(),
                n
            )));
        }
        if n == 0 {
            return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
        }
        let k = x[0].len();
        if k == 0 {
            return Err(ForecastError::Validation(
                "design matrix must have at least one column".to_string(),
            ));
        }
        if let Some(bad) = x.iter().position(|row| row.len() != k) {
            return Err(ForecastError::Validation(format!(
                "design matrix row {} has {} columns, expected {}",
                bad,
                x[bad].len(),
                k
            )));
        }

        let x_mat = faer::Mat::from_fn(n, k, |i, j| x[i][j]);
        let y_col = faer::Col::from_fn(n, |i| y[i]);

        let solution = match OlsRegressor::builder()
            .with_intercept(self.with_intercept)
            .build()
            .fit(&x_mat, &y_col)
        {
            Ok(s) => s,
            Err(_) => {
                return Err(ForecastError::Computation(
                    "least-squares solve failed".to_string(),
                ))
            }
        };

        self.intercept = solution.intercept().unwrap_or(0.0);
        let coefs_col = solution.coefficients();
        self.coefs = (0..coefs_col.nrows()).map(|i| coefs_col[i]).collect();
        self.fitted = true;

        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        if !self.fitted {
            return Err(ForecastError::Validation(
                "regressor has not been fitted".to_string(),
            ));
        }
        let k = self.coefs.len();
        if let Some(bad) = x.iter().position(|row| row.len() != k) {
            return Err(ForecastError::Validation(format!(
                "prediction row {} has {} columns but the model was fitted with {}",
                bad,
                x[bad].len(),
                k
            )));
        }

        Ok(x.iter()
            .map(|row| {
                self.intercept
                    + row
                        .iter()
                        .zip(self.coefs.iter())
                        .map(|(v, c)| v * c)
                        .sum::<f64>()
            })
            .collect())
    }

    fn coefficients(&self) -> Option<Vec<f64>> {
        self.fitted.then(|| self.coefs.clone())
    }
}
