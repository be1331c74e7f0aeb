//! Capped storage for forecast residuals.
//!
//! Residual pools back the bootstrap interval estimator. At most 1000 values
//! are ever retained: wholesale replacement subsamples oversized batches
//! uniformly without replacement, while appending truncates the incoming
//! batch to the remaining free space. The two paths intentionally differ;
//! appended residuals keep their original order so the oldest stored values
//! are never displaced.

use rand::seq::SliceRandom;
use rand::Rng;

/// Maximum number of residuals retained per pool.
pub const MAX_RESIDUALS: usize = 1000;

/// A bounded pool of residual values.
#[derive(Debug, Clone, Default)]
pub struct ResidualBuffer {
    values: Vec<f64>,
}

impl ResidualBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Replace the pool wholesale. Batches larger than [`MAX_RESIDUALS`] are
    /// reduced to a uniform random subsample without replacement.
    pub fn replace(&mut self, values: &[f64], rng: &mut impl Rng) {
        if values.len() > MAX_RESIDUALS {
            self.values = values
                .choose_multiple(rng, MAX_RESIDUALS)
                .copied()
                .collect();
        } else {
            self.values = values.to_vec();
        }
    }

    /// Append to the pool, keeping existing values. Only the first
    /// `free_space` values of the batch fit; the rest are dropped.
    pub fn append(&mut self, values: &[f64]) {
        let free = MAX_RESIDUALS.saturating_sub(self.values.len());
        let take = free.min(values.len());
        self.values.extend_from_slice(&values[..take]);
    }
}
