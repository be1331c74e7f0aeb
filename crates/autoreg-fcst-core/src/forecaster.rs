//! Recursive multi-step forecaster.
//!
//! Wraps a point-prediction [`Regressor`] and a [`WindowPredictor`] into an
//! iterative forecaster: training slides a fixed window over the series to
//! build a supervised matrix, prediction feeds each new value back into the
//! window used to compute the next step's features.

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{ForecastError, Result};
use crate::index::TimeIndex;
use crate::predictors::{validate_features, WindowPredictor};
use crate::regressor::Regressor;
use crate::residuals::ResidualBuffer;
use crate::series::{ExogData, Series};

/// Design matrix produced by [`Forecaster::create_train_x_y`].
///
/// Rows are in temporal order; row `i` is aligned with the target observed
/// at `index.position(i)`.
#[derive(Debug, Clone)]
pub struct TrainingMatrix {
    /// Synthetic predictor labels followed by exogenous column names.
    pub col_names: Vec<String>,
    /// Row-major feature rows.
    pub rows: Vec<Vec<f64>>,
    /// Index of the target each row predicts.
    pub index: TimeIndex,
}

/// A forecast: values on an index continuing the seed window's axis.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub index: TimeIndex,
    pub values: Vec<f64>,
}

impl Prediction {
    /// Materialized index positions, one per forecast value.
    pub fn positions(&self) -> Vec<i64> {
        self.index.positions()
    }
}

/// Recursive forecaster state.
///
/// Created unfitted; every derived field is (re)populated only by [`fit`],
/// which resets all of them up front so repeated fits never mix stale and
/// fresh state. Prediction never mutates the stored state; it works on
/// private copies of the window and exogenous rows.
///
/// [`fit`]: Forecaster::fit
pub struct Forecaster<R, P> {
    pub(crate) regressor: R,
    pub(crate) predictor: P,
    pub(crate) window_size: usize,
    pub(crate) fitted: bool,
    pub(crate) last_window: Option<Series>,
    pub(crate) training_range: Option<(i64, i64)>,
    pub(crate) included_exog: bool,
    pub(crate) exog_width: Option<usize>,
    pub(crate) exog_names: Option<Vec<String>>,
    pub(crate) in_sample_residuals: ResidualBuffer,
    pub(crate) out_sample_residuals: ResidualBuffer,
}

impl<R: Regressor, P: WindowPredictor> Forecaster<R, P> {
    /// Create an unfitted forecaster. `window_size` is fixed for the
    /// object's lifetime.
    pub fn new(regressor: R, predictor: P, window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(ForecastError::Configuration(
                "`window_size` must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            regressor,
            predictor,
            window_size,
            fitted: false,
            last_window: None,
            training_range: None,
            included_exog: false,
            exog_width: None,
            exog_names: None,
            in_sample_residuals: ResidualBuffer::new(),
            out_sample_residuals: ResidualBuffer::new(),
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Trailing window of the training series, the seed for predictions
    /// that start right after the training data.
    pub fn last_window(&self) -> Option<&Series> {
        self.last_window.as_ref()
    }

    /// First and last target positions used during training.
    pub fn training_range(&self) -> Option<(i64, i64)> {
        self.training_range
    }

    pub fn included_exog(&self) -> bool {
        self.included_exog
    }

    pub fn exog_names(&self) -> Option<&[String]> {
        self.exog_names.as_deref()
    }

    pub fn in_sample_residuals(&self) -> &[f64] {
        self.in_sample_residuals.as_slice()
    }

    pub fn out_sample_residuals(&self) -> &[f64] {
        self.out_sample_residuals.as_slice()
    }

    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    /// Build the supervised training matrix and aligned targets.
    ///
    /// For each offset `i` in `0 .. len - window_size`, the feature row is
    /// the predictor applied to `series[i .. i + window_size]` and the
    /// target is `series[i + window_size]`. When exogenous data is present
    /// its first `window_size` rows are dropped (they have no complete
    /// window) and the remainder is column-concatenated in order.
    pub fn create_train_x_y(
        &self,
        series: &Series,
        exog: Option<&ExogData>,
    ) -> Result<(TrainingMatrix, Vec<f64>)> {
        let n = series.len();
        if n < self.window_size + 1 {
            return Err(ForecastError::InsufficientData {
                needed: self.window_size + 1,
                got: n,
            });
        }

        if let Some(exog) = exog {
            if exog.n_rows() != n {
                return Err(ForecastError::Validation(format!(
                    "`exog` must have as many rows as the series: {} vs {}",
                    exog.n_rows(),
                    n
                )));
            }
            if let Some(exog_index) = exog.index() {
                if !exog_index.same_axis(series.index()) {
                    return Err(ForecastError::Validation(
                        "different index for series and `exog`; they must be aligned".to_string(),
                    ));
                }
            }
        }

        let values = series.values();
        let n_rows = n - self.window_size;
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(n_rows);
        let mut targets: Vec<f64> = Vec::with_capacity(n_rows);
        let mut n_features = 0usize;

        for i in 0..n_rows {
            let window = &values[i..i + self.window_size];
            let features = self.predictor.features(window);
            validate_features(&features)?;

            if i == 0 {
                if features.is_empty() {
                    return Err(ForecastError::PredictorContract(
                        "predictor returned an empty feature vector".to_string(),
                    ));
                }
                n_features = features.len();
            } else if features.len() != n_features {
                return Err(ForecastError::PredictorContract(format!(
                    "predictor returned {} features at offset {}, expected {}",
                    features.len(),
                    i,
                    n_features
                )));
            }

            rows.push(features);
            targets.push(values[i + self.window_size]);
        }

        let mut col_names: Vec<String> =
            (0..n_features).map(|i| format!("predictor_{}", i)).collect();

        if let Some(exog) = exog {
            col_names.extend(exog.column_names());
            for (i, row) in rows.iter_mut().enumerate() {
                row.extend(exog.row(self.window_size + i));
            }
        }

        let matrix = TrainingMatrix {
            col_names,
            rows,
            index: series.index().slice_from(self.window_size),
        };

        Ok((matrix, targets))
    }

    /// Train the forecaster.
    ///
    /// All derived state is reset unconditionally before any work happens,
    /// so a failed fit leaves the forecaster cleanly unfitted rather than
    /// half-updated. Regressor training failures propagate unchanged.
    pub fn fit(&mut self, series: &Series, exog: Option<&ExogData>) -> Result<()> {
        self.fitted = false;
        self.last_window = None;
        self.training_range = None;
        self.included_exog = false;
        self.exog_width = None;
        self.exog_names = None;
        self.in_sample_residuals.clear();
        self.out_sample_residuals.clear();

        let (matrix, targets) = self.create_train_x_y(series, exog)?;
        self.regressor.fit(&matrix.rows, &targets)?;

        let fitted_values = self.regressor.predict(&matrix.rows)?;
        let residuals: Vec<f64> = targets
            .iter()
            .zip(fitted_values.iter())
            .map(|(y, f)| y - f)
            .collect();
        let mut rng = StdRng::from_entropy();
        self.in_sample_residuals.replace(&residuals, &mut rng);

        self.training_range = Some((matrix.index.first(), matrix.index.last()));

        let tail_values = series.values()[series.len() - self.window_size..].to_vec();
        let tail_index = series.index().tail(self.window_size);
        self.last_window = Some(Series::with_index(tail_values, tail_index)?);

        if let Some(exog) = exog {
            self.included_exog = true;
            self.exog_width = Some(exog.n_cols());
            self.exog_names = Some(exog.column_names());
        }

        self.fitted = true;
        tracing::debug!(
            rows = matrix.rows.len(),
            features = matrix.col_names.len(),
            "forecaster fitted"
        );
        Ok(())
    }

    /// Predict `steps` values ahead.
    ///
    /// Each step computes features from the current window, invokes the
    /// regressor, then rolls the window: the oldest value is dropped and the
    /// raw prediction appended. Feeding the raw (not post-processed) value
    /// forward keeps multi-step forecasts consistent with composing
    /// single-step calls.
    ///
    /// With `last_window = None` the window stored at fit time is used and
    /// predictions start one step after the end of the training data. A
    /// supplied window may be longer than `window_size`; only the trailing
    /// `window_size` values are used.
    pub fn predict(
        &self,
        steps: usize,
        last_window: Option<&Series>,
        exog: Option<&ExogData>,
    ) -> Result<Prediction> {
        let (mut window, seed_index, exog_rows) = self.resolve_seed(steps, last_window, exog)?;

        let mut values = Vec::with_capacity(steps);
        for step in 0..steps {
            let exog_row = exog_rows.as_ref().map(|rows| rows[step].as_slice());
            let prediction = self.predict_one(&window, exog_row)?;
            values.push(prediction);

            // Roll the window: drop the oldest value, append the prediction.
            window.remove(0);
            window.push(prediction);
        }

        Ok(Prediction {
            index: seed_index.extend(steps),
            values,
        })
    }

    /// One step of the recursive loop: features for the current window plus
    /// the step's exogenous row, through the regressor.
    pub(crate) fn predict_one(&self, window: &[f64], exog_row: Option<&[f64]>) -> Result<f64> {
        let mut features = self.predictor.features(window);
        validate_features(&features)?;
        if let Some(row) = exog_row {
            features.extend_from_slice(row);
        }

        let predictions = self.regressor.predict(std::slice::from_ref(&features))?;
        predictions.first().copied().ok_or_else(|| {
            ForecastError::Computation("regressor returned no prediction".to_string())
        })
    }

    /// Validate a predict-time call and assemble private copies of the seed
    /// window and exogenous rows. Fails before any computation; never
    /// mutates caller inputs or stored state.
    pub(crate) fn resolve_seed(
        &self,
        steps: usize,
        last_window: Option<&Series>,
        exog: Option<&ExogData>,
    ) -> Result<(Vec<f64>, TimeIndex, Option<Vec<Vec<f64>>>)> {
        if !self.fitted {
            return Err(ForecastError::Validation(
                "forecaster has not been fitted; call `fit` first".to_string(),
            ));
        }
        if steps < 1 {
            return Err(ForecastError::Validation(
                "`steps` must be at least 1".to_string(),
            ));
        }

        match (exog, self.included_exog) {
            (None, true) => {
                return Err(ForecastError::Validation(
                    "forecaster was trained with exogenous variables; `exog` must be provided"
                        .to_string(),
                ))
            }
            (Some(_), false) => {
                return Err(ForecastError::Validation(
                    "forecaster was trained without exogenous variables; `exog` must be `None`"
                        .to_string(),
                ))
            }
            _ => {}
        }

        let exog_rows = match exog {
            Some(exog) => {
                let expected = self.exog_width.unwrap_or(0);
                if exog.n_cols() != expected {
                    return Err(ForecastError::Validation(format!(
                        "`exog` must have {} columns, got {}",
                        expected,
                        exog.n_cols()
                    )));
                }
                if exog.n_rows() < steps {
                    return Err(ForecastError::InsufficientData {
                        needed: steps,
                        got: exog.n_rows(),
                    });
                }
                // Only the first `steps` rows participate.
                Some((0..steps).map(|i| exog.row(i)).collect::<Vec<_>>())
            }
            None => None,
        };

        let seed = match last_window {
            Some(series) => series,
            None => self.last_window.as_ref().ok_or_else(|| {
                ForecastError::Validation("no stored last window available".to_string())
            })?,
        };
        if seed.len() < self.window_size {
            return Err(ForecastError::Validation(format!(
                "`last_window` must have at least {} values, got {}",
                self.window_size,
                seed.len()
            )));
        }

        let window = seed.values()[seed.len() - self.window_size..].to_vec();
        let seed_index = seed.index().tail(self.window_size);

        Ok((window, seed_index, exog_rows))
    }

    /// Store residuals computed on data the model was not trained on.
    ///
    /// With `append = false` (or an empty pool) the pool is replaced,
    /// subsampled down to the cap if oversized. With `append = true` the
    /// batch is truncated to the remaining free space instead.
    pub fn set_out_sample_residuals(&mut self, residuals: &[f64], append: bool) -> Result<()> {
        if let Some(pos) = residuals.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::Validation(format!(
                "residuals contain a non-finite value at position {}",
                pos
            )));
        }

        if !append || self.out_sample_residuals.is_empty() {
            let mut rng = StdRng::from_entropy();
            self.out_sample_residuals.replace(residuals, &mut rng);
        } else {
            self.out_sample_residuals.append(residuals);
        }
        Ok(())
    }

    /// Coefficients of the underlying regressor, aligned with the training
    /// matrix columns. Returns `None` with a warning for regressor families
    /// that do not expose them; that is a capability gap, not an error.
    pub fn coefficients(&self) -> Option<Vec<f64>> {
        let coefs = self.regressor.coefficients();
        if coefs.is_none() {
            tracing::warn!("regressor does not expose coefficients");
        }
        coefs
    }

    /// Impurity-based feature importances of the underlying regressor, when
    /// supported. Returns `None` with a warning otherwise.
    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        let importances = self.regressor.feature_importances();
        if importances.is_none() {
            tracing::warn!("regressor does not expose feature importances");
        }
        importances
    }
}

impl<R, P> fmt::Display for Forecaster<R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Recursive forecaster")?;
        writeln!(f, "Window size: {}", self.window_size)?;
        writeln!(f, "Fitted: {}", self.fitted)?;
        writeln!(f, "Included exogenous: {}", self.included_exog)?;
        if let Some(names) = &self.exog_names {
            writeln!(f, "Exogenous columns: {}", names.join(", "))?;
        }
        if let Some((first, last)) = self.training_range {
            writeln!(f, "Training range: [{}, {}]", first, last)?;
        }
        if let Some(window) = &self.last_window {
            writeln!(f, "Index frequency: {}", window.index().frequency())?;
        }
        write!(
            f,
            "Stored residuals: {} in-sample, {} out-of-sample",
            self.in_sample_residuals.len(),
            self.out_sample_residuals.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictors::LagPredictor;
    use approx::assert_relative_eq;

    /// Minimal regressor double: predicts the mean target seen at fit time.
    struct MeanRegressor {
        mean: Option<f64>,
    }

    impl MeanRegressor {
        fn new() -> Self {
            Self { mean: None }
        }
    }

    impl Regressor for MeanRegressor {
        fn fit(&mut self, _x: &[Vec<f64>], y: &[f64]) -> Result<()> {
            self.mean = Some(y.iter().sum::<f64>() / y.len() as f64);
            Ok(())
        }

        fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
            let mean = self
                .mean
                .ok_or_else(|| ForecastError::Validation("not fitted".to_string()))?;
            Ok(vec![mean; x.len()])
        }
    }

    fn fitted_mean_forecaster(values: Vec<f64>) -> Forecaster<MeanRegressor, LagPredictor> {
        let series = Series::from_values(values).unwrap();
        let mut fc = Forecaster::new(MeanRegressor::new(), LagPredictor, 3).unwrap();
        fc.fit(&series, None).unwrap();
        fc
    }

    #[test]
    fn test_zero_window_size_rejected() {
        let err = Forecaster::new(MeanRegressor::new(), LagPredictor, 0);
        assert!(matches!(
            err,
            Err(ForecastError::Configuration(_))
        ));
    }

    #[test]
    fn test_train_matrix_shape_and_alignment() {
        let series = Series::from_values(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let fc = Forecaster::new(MeanRegressor::new(), LagPredictor, 3).unwrap();
        let (matrix, y) = fc.create_train_x_y(&series, None).unwrap();

        // len(series) - window_size rows, in temporal order.
        assert_eq!(matrix.rows.len(), 4);
        assert_eq!(y.len(), 4);
        assert_eq!(matrix.col_names, vec!["predictor_0", "predictor_1", "predictor_2"]);

        for (i, row) in matrix.rows.iter().enumerate() {
            assert_eq!(row, &vec![i as f64, i as f64 + 1.0, i as f64 + 2.0]);
            // Target at row i is series[i + window_size].
            assert_relative_eq!(y[i], i as f64 + 3.0);
        }
        assert_eq!(matrix.index.positions(), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_train_matrix_appends_exog() {
        let series = Series::from_values(vec![0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        let exog = ExogData::from_column(vec![10.0, 11.0, 12.0, 13.0, 14.0])
            .unwrap()
            .with_names(vec!["load".to_string()])
            .unwrap();
        let fc = Forecaster::new(MeanRegressor::new(), LagPredictor, 3).unwrap();
        let (matrix, _) = fc.create_train_x_y(&series, Some(&exog)).unwrap();

        assert_eq!(
            matrix.col_names,
            vec!["predictor_0", "predictor_1", "predictor_2", "load"]
        );
        // First window_size exog rows are dropped.
        assert_eq!(matrix.rows[0], vec![0.0, 1.0, 2.0, 13.0]);
        assert_eq!(matrix.rows[1], vec![1.0, 2.0, 3.0, 14.0]);
    }

    #[test]
    fn test_train_matrix_short_series() {
        let series = Series::from_values(vec![1.0, 2.0, 3.0]).unwrap();
        let fc = Forecaster::new(MeanRegressor::new(), LagPredictor, 3).unwrap();
        let err = fc.create_train_x_y(&series, None).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientData { needed: 4, got: 3 }
        ));
    }

    #[test]
    fn test_train_matrix_exog_misalignment() {
        let series = Series::from_values(vec![0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();

        let short = ExogData::from_column(vec![1.0, 2.0, 3.0]).unwrap();
        let fc = Forecaster::new(MeanRegressor::new(), LagPredictor, 3).unwrap();
        assert!(fc.create_train_x_y(&series, Some(&short)).is_err());

        // Same length but a different axis origin.
        let shifted_index = crate::index::TimeIndex::steps(5, 1, 5).unwrap();
        let shifted = ExogData::from_column(vec![1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap()
            .with_index(shifted_index)
            .unwrap();
        assert!(fc.create_train_x_y(&series, Some(&shifted)).is_err());
    }

    #[test]
    fn test_nan_predictor_fails_training() {
        let series = Series::from_values(vec![0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        let nan_predictor = |_w: &[f64]| vec![f64::NAN];
        let mut fc = Forecaster::new(MeanRegressor::new(), nan_predictor, 3).unwrap();
        let err = fc.fit(&series, None).unwrap_err();
        assert!(matches!(err, ForecastError::PredictorContract(_)));
        assert!(!fc.is_fitted());
    }

    #[test]
    fn test_fit_stores_last_window() {
        let fc = fitted_mean_forecaster(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let window = fc.last_window().unwrap();
        assert_eq!(window.values(), &[4.0, 5.0, 6.0]);
        assert_eq!(window.index().positions(), vec![4, 5, 6]);
        assert_eq!(fc.training_range(), Some((3, 6)));
        assert_eq!(fc.in_sample_residuals().len(), 4);
    }

    #[test]
    fn test_refit_resets_state() {
        let series = Series::from_values(vec![0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        let exog = ExogData::from_column(vec![0.0; 5]).unwrap();

        let mut fc = Forecaster::new(MeanRegressor::new(), LagPredictor, 3).unwrap();
        fc.fit(&series, Some(&exog)).unwrap();
        assert!(fc.included_exog());
        fc.set_out_sample_residuals(&[0.1, -0.1], false).unwrap();
        assert_eq!(fc.out_sample_residuals().len(), 2);

        fc.fit(&series, None).unwrap();
        assert!(!fc.included_exog());
        assert!(fc.exog_names().is_none());
        assert!(fc.out_sample_residuals().is_empty());
    }

    #[test]
    fn test_predict_requires_fit() {
        let fc = Forecaster::new(MeanRegressor::new(), LagPredictor, 3).unwrap();
        assert!(fc.predict(2, None, None).is_err());
    }

    #[test]
    fn test_predict_zero_steps_rejected() {
        let fc = fitted_mean_forecaster(vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(fc.predict(0, None, None).is_err());
    }

    #[test]
    fn test_predict_exog_symmetry() {
        let fc = fitted_mean_forecaster(vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        let exog = ExogData::from_column(vec![1.0, 2.0]).unwrap();
        let err = fc.predict(2, None, Some(&exog)).unwrap_err();
        assert!(matches!(err, ForecastError::Validation(_)));
    }

    #[test]
    fn test_predict_index_continues_training_axis() {
        let fc = fitted_mean_forecaster(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let prediction = fc.predict(3, None, None).unwrap();
        assert_eq!(prediction.positions(), vec![7, 8, 9]);
        assert_eq!(prediction.values.len(), 3);
    }

    #[test]
    fn test_predict_uses_trailing_window_of_longer_seed() {
        let fc = fitted_mean_forecaster(vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        // 5-value seed on its own axis; only the last 3 values matter.
        let seed = Series::with_range(vec![9.0, 9.0, 1.0, 2.0, 3.0], 100, 1).unwrap();
        let prediction = fc.predict(1, Some(&seed), None).unwrap();
        // Continues one step after the seed's axis.
        assert_eq!(prediction.positions(), vec![105]);
    }

    #[test]
    fn test_predict_does_not_mutate_stored_window() {
        let fc = fitted_mean_forecaster(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let before = fc.last_window().unwrap().values().to_vec();
        fc.predict(5, None, None).unwrap();
        assert_eq!(fc.last_window().unwrap().values(), &before[..]);
    }

    #[test]
    fn test_display_summarizes_state() {
        let fc = fitted_mean_forecaster(vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        let text = format!("{}", fc);
        assert!(text.contains("Window size: 3"));
        assert!(text.contains("Fitted: true"));
    }
}
