//! Index descriptors for series axes.
//!
//! A series is indexed either by plain integer steps or by timestamps
//! (microseconds since epoch). Timestamp axes carry an inferred frequency:
//! fixed spacing, or calendar-regular monthly/quarterly/yearly spacing.
//! All core logic works on this canonical descriptor; raw timestamp vectors
//! are normalized once at ingestion.

use crate::error::{ForecastError, Result};
use chrono::{Months, NaiveDateTime};

/// Convert microseconds since epoch to NaiveDateTime.
fn micros_to_datetime(micros: i64) -> NaiveDateTime {
    let secs = micros.div_euclid(1_000_000);
    let nsecs = (micros.rem_euclid(1_000_000) * 1000) as u32;
    chrono::DateTime::from_timestamp(secs, nsecs)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

/// Convert NaiveDateTime to microseconds since epoch.
fn datetime_to_micros(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_micros()
}

/// Spacing between consecutive index positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// Integer step axis with a fixed stride.
    Steps(i64),
    /// Timestamp axis with fixed spacing in microseconds.
    Fixed(i64),
    /// Timestamp axis advancing one calendar month per observation.
    Monthly,
    /// Timestamp axis advancing one calendar quarter per observation.
    Quarterly,
    /// Timestamp axis advancing one calendar year per observation.
    Yearly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frequency::Steps(s) => write!(f, "steps({})", s),
            Frequency::Fixed(us) => write!(f, "fixed({}us)", us),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Quarterly => write!(f, "quarterly"),
            Frequency::Yearly => write!(f, "yearly"),
        }
    }
}

/// A regular index axis: a start position, a frequency, and a length.
///
/// Positions are `i64`: plain integers for step axes, microseconds since
/// epoch for timestamp axes. The descriptor can be sliced and extended
/// without materializing positions, which is what the recursive predictor
/// relies on to continue an axis past the end of the training data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeIndex {
    start: i64,
    freq: Frequency,
    len: usize,
}

impl TimeIndex {
    /// Create an integer step axis.
    pub fn steps(start: i64, step: i64, len: usize) -> Result<Self> {
        if step < 1 {
            return Err(ForecastError::Validation(format!(
                "index step must be positive, got {}",
                step
            )));
        }
        Ok(Self {
            start,
            freq: Frequency::Steps(step),
            len,
        })
    }

    /// Create a timestamp axis from raw timestamps, inferring the frequency.
    ///
    /// Timestamps must be strictly increasing. Spacing must be either fixed
    /// or calendar-regular (monthly, quarterly, yearly); anything else is
    /// rejected so downstream index arithmetic stays well defined.
    pub fn from_timestamps(timestamps: &[i64]) -> Result<Self> {
        if timestamps.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: timestamps.len(),
            });
        }
        if timestamps.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ForecastError::Validation(
                "timestamps must be strictly increasing".to_string(),
            ));
        }

        let start = timestamps[0];
        for freq in [Frequency::Monthly, Frequency::Quarterly, Frequency::Yearly] {
            if axis_matches(start, freq, timestamps) {
                return Ok(Self {
                    start,
                    freq,
                    len: timestamps.len(),
                });
            }
        }

        let spacing = dominant_spacing(timestamps)?;
        let fixed = Frequency::Fixed(spacing);
        if axis_matches(start, fixed, timestamps) {
            return Ok(Self {
                start,
                freq: fixed,
                len: timestamps.len(),
            });
        }

        Err(ForecastError::Validation(
            "timestamps are irregular: spacing is neither fixed nor calendar-regular".to_string(),
        ))
    }

    /// Create a timestamp axis directly from a start and frequency.
    pub fn timestamps(start: i64, freq: Frequency, len: usize) -> Result<Self> {
        if let Frequency::Steps(_) = freq {
            return Err(ForecastError::Validation(
                "use TimeIndex::steps for integer axes".to_string(),
            ));
        }
        if let Frequency::Fixed(us) = freq {
            if us < 1 {
                return Err(ForecastError::Validation(format!(
                    "fixed spacing must be positive, got {}us",
                    us
                )));
            }
        }
        Ok(Self { start, freq, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn frequency(&self) -> Frequency {
        self.freq
    }

    /// Position at offset `i` from the start. `i` may point past the end of
    /// the axis; that is how forecast indices are generated.
    pub fn position(&self, i: usize) -> i64 {
        match self.freq {
            Frequency::Steps(step) | Frequency::Fixed(step) => self.start + step * i as i64,
            Frequency::Monthly => add_months(self.start, i as u32),
            Frequency::Quarterly => add_months(self.start, 3 * i as u32),
            Frequency::Yearly => add_months(self.start, 12 * i as u32),
        }
    }

    pub fn first(&self) -> i64 {
        self.start
    }

    pub fn last(&self) -> i64 {
        if self.len == 0 {
            self.start
        } else {
            self.position(self.len - 1)
        }
    }

    /// Materialize all positions.
    pub fn positions(&self) -> Vec<i64> {
        (0..self.len).map(|i| self.position(i)).collect()
    }

    /// Axis with the first `n` positions removed.
    pub fn slice_from(&self, n: usize) -> Self {
        let n = n.min(self.len);
        Self {
            start: self.position(n),
            freq: self.freq,
            len: self.len - n,
        }
    }

    /// Axis covering the trailing `n` positions.
    pub fn tail(&self, n: usize) -> Self {
        self.slice_from(self.len.saturating_sub(n))
    }

    /// Axis of `steps` positions continuing directly after this one ends.
    pub fn extend(&self, steps: usize) -> Self {
        Self {
            start: self.position(self.len),
            freq: self.freq,
            len: steps,
        }
    }

    /// Whether `self` and `other` describe the same axis origin and spacing.
    ///
    /// Used to require that an exogenous index is a literal prefix of the
    /// target series index (lengths are checked separately).
    pub fn same_axis(&self, other: &Self) -> bool {
        self.start == other.start && self.freq == other.freq
    }
}

fn add_months(start_micros: i64, months: u32) -> i64 {
    let dt = micros_to_datetime(start_micros);
    dt.checked_add_months(Months::new(months))
        .map(datetime_to_micros)
        .unwrap_or(start_micros)
}

/// Whether every timestamp equals the position generated from `start` under
/// `freq`. Anchoring at the start handles month-end clamping (Jan 31 + 1
/// month = Feb 28, + 2 months = Mar 31).
fn axis_matches(start: i64, freq: Frequency, timestamps: &[i64]) -> bool {
    let probe = TimeIndex {
        start,
        freq,
        len: timestamps.len(),
    };
    timestamps
        .iter()
        .enumerate()
        .all(|(i, &t)| probe.position(i) == t)
}

/// Most common difference between consecutive timestamps.
fn dominant_spacing(timestamps: &[i64]) -> Result<i64> {
    let diffs: Vec<i64> = timestamps
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&d| d > 0)
        .collect();

    if diffs.is_empty() {
        return Err(ForecastError::Validation(
            "could not detect index spacing".to_string(),
        ));
    }

    let mut counts = std::collections::HashMap::new();
    for d in &diffs {
        *counts.entry(*d).or_insert(0) += 1;
    }

    Ok(counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(diff, _)| diff)
        .unwrap())
}
