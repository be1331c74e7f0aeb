//! Bootstrap prediction intervals for recursive forecasts.
//!
//! Repeats the recursive prediction loop many times, adding one residual
//! drawn with replacement from the stored pools to every step's prediction,
//! and derives per-step percentile bounds from the resulting ensemble. Each
//! trial evolves its window on the *perturbed* trajectory, which is what
//! makes interval width compound with the horizon.
//!
//! Trials are mutually independent: every trial owns a private copy of the
//! seed window and exogenous rows, and the residual pools are read-only
//! during estimation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ForecastError, Result};
use crate::forecaster::Forecaster;
use crate::index::TimeIndex;
use crate::predictors::WindowPredictor;
use crate::regressor::Regressor;
use crate::series::{ExogData, Series};

/// Configuration for bootstrap interval estimation.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Lower and upper percentiles of the ensemble, in `[0, 100]`.
    pub interval: (f64, f64),
    /// Number of bootstrap trials.
    pub n_boot: usize,
    /// Random seed for reproducibility (`None` for entropy).
    pub seed: Option<u64>,
    /// Draw residuals from the in-sample pool; `false` selects the
    /// out-of-sample pool, which must have been populated beforehand.
    pub in_sample_residuals: bool,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            interval: (5.0, 95.0),
            n_boot: 500,
            seed: None,
            in_sample_residuals: true,
        }
    }
}

impl BootstrapOptions {
    /// Options with a specific number of trials.
    pub fn new(n_boot: usize) -> Self {
        Self {
            n_boot,
            ..Default::default()
        }
    }

    /// Set the percentile pair.
    pub fn with_interval(mut self, lower: f64, upper: f64) -> Self {
        self.interval = (lower, upper);
        self
    }

    /// Set the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Draw residuals from the out-of-sample pool.
    pub fn with_out_sample_residuals(mut self) -> Self {
        self.in_sample_residuals = false;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.n_boot < 1 {
            return Err(ForecastError::Validation(
                "`n_boot` must be at least 1".to_string(),
            ));
        }
        let (lo, hi) = self.interval;
        if !(0.0..=100.0).contains(&lo) || !(0.0..=100.0).contains(&hi) || lo > hi {
            return Err(ForecastError::Validation(format!(
                "percentiles must satisfy 0 <= lower <= upper <= 100, got ({}, {})",
                lo, hi
            )));
        }
        Ok(())
    }
}

/// Per-step interval bounds estimated by bootstrapping.
#[derive(Debug, Clone)]
pub struct BootstrapIntervals {
    /// Lower bound per step.
    pub lower: Vec<f64>,
    /// Upper bound per step.
    pub upper: Vec<f64>,
    /// Percentile pair the bounds correspond to.
    pub interval: (f64, f64),
    /// Number of trials used.
    pub n_boot: usize,
}

/// Point forecast with aligned interval bounds.
#[derive(Debug, Clone)]
pub struct PredictionIntervals {
    pub index: TimeIndex,
    pub point: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl<R: Regressor, P: WindowPredictor> Forecaster<R, P> {
    /// Estimate per-step prediction interval bounds by bootstrapping.
    ///
    /// Every trial replays the recursive loop from a private copy of the
    /// seed window, adding a residual drawn with replacement from the
    /// selected pool to each step's prediction before feeding the perturbed
    /// value forward. Bounds are the requested percentiles of the per-step
    /// ensemble.
    pub fn estimate_boot_interval(
        &self,
        steps: usize,
        last_window: Option<&Series>,
        exog: Option<&ExogData>,
        options: &BootstrapOptions,
    ) -> Result<BootstrapIntervals> {
        options.validate()?;
        let (window, _seed_index, exog_rows) = self.resolve_seed(steps, last_window, exog)?;

        let pool: &[f64] = if options.in_sample_residuals {
            self.in_sample_residuals()
        } else {
            self.out_sample_residuals()
        };
        if pool.is_empty() {
            let msg = if options.in_sample_residuals {
                "no in-sample residuals stored"
            } else {
                "out-of-sample residuals are empty; store them with `set_out_sample_residuals` first"
            };
            return Err(ForecastError::ResidualsUnavailable(msg.to_string()));
        }

        let mut rng: StdRng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut samples: Vec<Vec<f64>> = vec![Vec::with_capacity(options.n_boot); steps];

        for _ in 0..options.n_boot {
            // Each trial restarts from its own copy of the seed state.
            let mut boot_window = window.clone();

            for (step, step_samples) in samples.iter_mut().enumerate() {
                let exog_row = exog_rows.as_ref().map(|rows| rows[step].as_slice());
                let point = self.predict_one(&boot_window, exog_row)?;
                let perturbed = point + pool[rng.gen_range(0..pool.len())];
                step_samples.push(perturbed);

                // The perturbed value, not the raw point prediction, rolls
                // into the window; uncertainty compounds with the horizon.
                boot_window.remove(0);
                boot_window.push(perturbed);
            }
        }

        let (lo, hi) = options.interval;
        let mut lower = Vec::with_capacity(steps);
        let mut upper = Vec::with_capacity(steps);
        for step_samples in &mut samples {
            step_samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            lower.push(percentile(step_samples, lo));
            upper.push(percentile(step_samples, hi));
        }

        Ok(BootstrapIntervals {
            lower,
            upper,
            interval: options.interval,
            n_boot: options.n_boot,
        })
    }

    /// Deterministic point forecast wrapped with bootstrap bounds.
    ///
    /// The point path and the bootstrap ensemble are computed from
    /// independent copies of the same seed state, so running the bootstrap
    /// never alters the point forecast.
    pub fn predict_interval(
        &self,
        steps: usize,
        last_window: Option<&Series>,
        exog: Option<&ExogData>,
        options: &BootstrapOptions,
    ) -> Result<PredictionIntervals> {
        let prediction = self.predict(steps, last_window, exog)?;
        let bounds = self.estimate_boot_interval(steps, last_window, exog, options)?;

        Ok(PredictionIntervals {
            index: prediction.index,
            point: prediction.values,
            lower: bounds.lower,
            upper: bounds.upper,
        })
    }
}

/// Percentile of sorted data using linear interpolation between order
/// statistics.
fn percentile(sorted_data: &[f64], pct: f64) -> f64 {
    if sorted_data.is_empty() {
        return f64::NAN;
    }

    let quantile = pct / 100.0;
    if quantile <= 0.0 {
        return sorted_data[0];
    }
    if quantile >= 1.0 {
        return sorted_data[sorted_data.len() - 1];
    }

    let n = sorted_data.len();
    let index = quantile * (n - 1) as f64;
    let lower_idx = index.floor() as usize;
    let upper_idx = (lower_idx + 1).min(n - 1);
    let fraction = index - lower_idx as f64;

    sorted_data[lower_idx] * (1.0 - fraction) + sorted_data[upper_idx] * fraction
}
