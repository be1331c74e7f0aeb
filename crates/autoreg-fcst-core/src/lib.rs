//! Recursive multi-step forecasting engine.
//!
//! Turns any point-prediction regressor into an iterative time-series
//! forecaster: a caller-supplied predictor function maps a trailing window
//! of values to features, a supervised matrix is built by sliding that
//! window over the series, and multi-step forecasts are produced by feeding
//! each prediction back into the window for the next step. Prediction
//! intervals come from residual bootstrapping.
//!
//! # Example
//!
//! ```
//! use autoreg_fcst_core::{BootstrapOptions, Forecaster, LagPredictor, LinearRegressor, Series};
//!
//! let series = Series::from_values((0..30).map(|i| i as f64 + (i as f64).sin()).collect()).unwrap();
//! let mut forecaster = Forecaster::new(LinearRegressor::new(), LagPredictor, 3).unwrap();
//! forecaster.fit(&series, None).unwrap();
//!
//! let prediction = forecaster.predict(5, None, None).unwrap();
//! assert_eq!(prediction.values.len(), 5);
//!
//! let options = BootstrapOptions::new(100).with_seed(42);
//! let intervals = forecaster.predict_interval(5, None, None, &options).unwrap();
//! assert_eq!(intervals.lower.len(), 5);
//! ```

pub mod bootstrap;
pub mod error;
pub mod forecaster;
pub mod index;
pub mod metrics;
pub mod predictors;
pub mod regressor;
pub mod residuals;
pub mod series;

// Re-exports for convenience
pub use bootstrap::{BootstrapIntervals, BootstrapOptions, PredictionIntervals};
pub use error::{ForecastError, Result};
pub use forecaster::{Forecaster, Prediction, TrainingMatrix};
pub use index::{Frequency, TimeIndex};
pub use metrics::{mae, mape, mse, rmse};
pub use predictors::{LagPredictor, WindowPredictor};
pub use regressor::{LinearRegressor, Regressor};
pub use residuals::{ResidualBuffer, MAX_RESIDUALS};
pub use series::{ExogData, Series};
