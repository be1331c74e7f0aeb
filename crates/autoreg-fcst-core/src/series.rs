//! Canonical series and exogenous covariate representations.
//!
//! Callers can hold their data as plain vectors, integer-ranged series, or
//! timestamped series; everything is normalized here into one internal shape
//! (flat value buffer + index descriptor) before any core logic runs. The
//! engine only ever reads slices of these buffers.

use crate::error::{ForecastError, Result};
use crate::index::TimeIndex;

/// An ordered univariate series with a regular index.
#[derive(Debug, Clone)]
pub struct Series {
    values: Vec<f64>,
    index: TimeIndex,
}

impl Series {
    /// Series on a default integer axis `0, 1, 2, ..`.
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        let index = TimeIndex::steps(0, 1, values.len())?;
        Self::new(values, index)
    }

    /// Series on an explicit integer axis.
    pub fn with_range(values: Vec<f64>, start: i64, step: i64) -> Result<Self> {
        let index = TimeIndex::steps(start, step, values.len())?;
        Self::new(values, index)
    }

    /// Series on a timestamp axis (microseconds since epoch). The frequency
    /// is inferred from the timestamps.
    pub fn with_timestamps(timestamps: &[i64], values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::Validation(format!(
                "timestamps and values must have the same length: {} vs {}",
                timestamps.len(),
                values.len()
            )));
        }
        let index = TimeIndex::from_timestamps(timestamps)?;
        Self::new(values, index)
    }

    /// Series from an already-built index descriptor.
    pub fn with_index(values: Vec<f64>, index: TimeIndex) -> Result<Self> {
        if index.len() != values.len() {
            return Err(ForecastError::Validation(format!(
                "index length {} does not match {} values",
                index.len(),
                values.len()
            )));
        }
        Self::new(values, index)
    }

    fn new(values: Vec<f64>, index: TimeIndex) -> Result<Self> {
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::Validation(format!(
                "series contains a non-finite value at position {}",
                pos
            )));
        }
        Ok(Self { values, index })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Exogenous covariates: a 2-D numeric table stored column-major.
///
/// At training time rows are aligned 1:1 with the target series; at
/// prediction time rows represent the future steps being predicted, in
/// order. Column names, when present, are preserved for introspection of
/// downstream coefficients.
#[derive(Debug, Clone)]
pub struct ExogData {
    /// `columns[col][row]`.
    columns: Vec<Vec<f64>>,
    names: Option<Vec<String>>,
    index: Option<TimeIndex>,
}

impl ExogData {
    /// Build from column vectors. All columns must be equally long, finite,
    /// and at least one column must be present.
    pub fn from_columns(columns: Vec<Vec<f64>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(ForecastError::Validation(
                "exogenous data must have at least one column".to_string(),
            ));
        }
        let n_rows = columns[0].len();
        for (i, col) in columns.iter().enumerate() {
            if col.len() != n_rows {
                return Err(ForecastError::Validation(format!(
                    "exogenous column {} has {} rows but column 0 has {}",
                    i,
                    col.len(),
                    n_rows
                )));
            }
            if let Some(pos) = col.iter().position(|v| !v.is_finite()) {
                return Err(ForecastError::Validation(format!(
                    "exogenous column {} contains a non-finite value at row {}",
                    i, pos
                )));
            }
        }
        Ok(Self {
            columns,
            names: None,
            index: None,
        })
    }

    /// Single-column convenience constructor.
    pub fn from_column(column: Vec<f64>) -> Result<Self> {
        Self::from_columns(vec![column])
    }

    /// Attach column names. Must match the column count.
    pub fn with_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.columns.len() {
            return Err(ForecastError::Validation(format!(
                "{} names given for {} exogenous columns",
                names.len(),
                self.columns.len()
            )));
        }
        self.names = Some(names);
        Ok(self)
    }

    /// Attach a row index, enabling the prefix-alignment check against the
    /// target series at fit time.
    pub fn with_index(mut self, index: TimeIndex) -> Result<Self> {
        if index.len() != self.n_rows() {
            return Err(ForecastError::Validation(format!(
                "exogenous index length {} does not match {} rows",
                index.len(),
                self.n_rows()
            )));
        }
        self.index = Some(index);
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.columns[0].len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn index(&self) -> Option<&TimeIndex> {
        self.index.as_ref()
    }

    /// Row `i` gathered across columns.
    pub fn row(&self, i: usize) -> Vec<f64> {
        self.columns.iter().map(|col| col[i]).collect()
    }

    /// Column names, synthesizing `exog_<i>` labels when none were set.
    pub fn column_names(&self) -> Vec<String> {
        match &self.names {
            Some(names) => names.clone(),
            None => (0..self.n_cols()).map(|i| format!("exog_{}", i)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_default_axis() {
        let s = Series::from_values(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.index().positions(), vec![0, 1, 2]);
    }

    #[test]
    fn test_series_rejects_nan() {
        assert!(Series::from_values(vec![1.0, f64::NAN, 3.0]).is_err());
        assert!(Series::from_values(vec![1.0, f64::INFINITY]).is_err());
    }

    #[test]
    fn test_series_timestamp_length_mismatch() {
        let err = Series::with_timestamps(&[0, 100], vec![1.0, 2.0, 3.0]);
        assert!(err.is_err());
    }

    #[test]
    fn test_exog_ragged_columns_rejected() {
        let err = ExogData::from_columns(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(err.is_err());
    }

    #[test]
    fn test_exog_row_gather() {
        let exog =
            ExogData::from_columns(vec![vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]]).unwrap();
        assert_eq!(exog.n_rows(), 3);
        assert_eq!(exog.n_cols(), 2);
        assert_eq!(exog.row(1), vec![2.0, 20.0]);
    }

    #[test]
    fn test_exog_names() {
        let exog = ExogData::from_column(vec![1.0, 2.0]).unwrap();
        assert_eq!(exog.column_names(), vec!["exog_0"]);

        let named = ExogData::from_column(vec![1.0, 2.0])
            .unwrap()
            .with_names(vec!["temperature".to_string()])
            .unwrap();
        assert_eq!(named.column_names(), vec!["temperature"]);

        let err = ExogData::from_column(vec![1.0, 2.0])
            .unwrap()
            .with_names(vec!["a".to_string(), "b".to_string()]);
        assert!(err.is_err());
    }
}
