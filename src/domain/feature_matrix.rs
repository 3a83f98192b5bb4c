// ============================================================
// Layer 3 — FeatureMatrix Domain Type
// ============================================================
// The numeric table the autoencoder learns from:
//   rows    = records (catalog items)
//   columns = numeric features
//
// Once built it is never mutated. Training, validation and
// encoding all read from the same matrix, so it is shared
// behind an Arc instead of being copied per consumer.
//
// Reference: ndarray documentation (Array2, ArrayView1)

use std::sync::Arc;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{EmbedError, Result};

/// Immutable 2-D feature table, f32 throughout.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    values: Arc<Array2<f32>>,
}

impl FeatureMatrix {
    /// Wrap an existing array.
    ///
    /// Rejects empty matrices and non-finite cells: a NaN in the
    /// input would otherwise surface much later as a NaN loss.
    pub fn new(values: Array2<f32>) -> Result<Self> {
        let (rows, cols) = values.dim();
        if rows == 0 || cols == 0 {
            return Err(EmbedError::config(format!(
                "feature matrix must be non-empty, got {rows}x{cols}"
            )));
        }
        if let Some(((r, c), v)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(EmbedError::config(format!(
                "feature matrix cell ({r}, {c}) is not finite: {v}"
            )));
        }
        Ok(Self { values: Arc::new(values) })
    }

    /// Build from row vectors. Every row must have the same width.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);

        let mut flat = Vec::with_capacity(n_rows * n_cols);
        for row in &rows {
            if row.len() != n_cols {
                return Err(EmbedError::DimensionMismatch {
                    what:     "feature row width",
                    expected: n_cols,
                    actual:   row.len(),
                });
            }
            flat.extend_from_slice(row);
        }

        let values = Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|e| EmbedError::config(e.to_string()))?;
        Self::new(values)
    }

    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f32> {
        self.values.row(index)
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.values.view()
    }

    /// Copy the given rows, in the given order, into a new array.
    pub fn select_rows(&self, indices: &[usize]) -> Array2<f32> {
        self.values.select(Axis(0), indices)
    }

    /// Row-major copy of a contiguous row range, used to build tensors.
    pub fn flat_rows(&self, start: usize, end: usize) -> Vec<f32> {
        self.values
            .slice(ndarray::s![start..end, ..])
            .iter()
            .copied()
            .collect()
    }

    /// Per-column minimum and maximum.
    pub fn column_range(&self) -> ColumnRange {
        let (min, max) = self
            .values
            .columns()
            .into_iter()
            .map(|column| {
                let min = column.iter().copied().fold(f32::INFINITY, f32::min);
                let max = column.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                (min, max)
            })
            .unzip();
        ColumnRange { min, max }
    }

    /// Rescale every column into [0, 1], returning the bounds used
    /// so later data can be scaled the same way.
    ///
    /// The decoder ends in a sigmoid, so reconstruction targets
    /// must live in that range. Constant columns map to 0.
    pub fn min_max_scaled(&self) -> (FeatureMatrix, ColumnRange) {
        let range = self.column_range();
        let scaled = FeatureMatrix { values: Arc::new(range.apply(&self.values)) };
        (scaled, range)
    }

    /// Rescale with bounds taken from another matrix (the training
    /// data), so new rows land where the autoencoder expects them.
    /// Values outside the stored bounds fall outside [0, 1].
    pub fn scaled_with(&self, range: &ColumnRange) -> Result<FeatureMatrix> {
        if range.min.len() != self.cols() || range.max.len() != self.cols() {
            return Err(EmbedError::DimensionMismatch {
                what:     "scaling range width",
                expected: self.cols(),
                actual:   range.min.len(),
            });
        }
        Ok(FeatureMatrix { values: Arc::new(range.apply(&self.values)) })
    }
}

/// Column bounds recorded at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

impl ColumnRange {
    fn apply(&self, values: &Array2<f32>) -> Array2<f32> {
        let mut scaled = values.clone();
        for (c, mut column) in scaled.columns_mut().into_iter().enumerate() {
            let (min, range) = (self.min[c], self.max[c] - self.min[c]);
            column.mapv_inplace(|v| if range > 0.0 { (v - min) / range } else { 0.0 });
        }
        scaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_rows_shape() {
        let m = FeatureMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(m.rows(), 3);
        assert_eq!(m.cols(), 2);
        assert_eq!(m.row(1).to_vec(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = FeatureMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_empty_and_nan_rejected() {
        assert!(FeatureMatrix::from_rows(Vec::new()).is_err());
        assert!(FeatureMatrix::new(array![[1.0, f32::NAN]]).is_err());
    }

    #[test]
    fn test_select_rows_keeps_order() {
        let m = FeatureMatrix::new(array![[0.0], [1.0], [2.0], [3.0]]).unwrap();
        let picked = m.select_rows(&[3, 0]);
        assert_eq!(picked, array![[3.0], [0.0]]);
    }

    #[test]
    fn test_flat_rows_is_row_major() {
        let m = FeatureMatrix::new(array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]).unwrap();
        assert_eq!(m.flat_rows(1, 3), vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_min_max_scaling() {
        let m = FeatureMatrix::new(array![[0.0, 5.0], [10.0, 5.0], [5.0, 5.0]]).unwrap();
        let (s, range) = m.min_max_scaled();
        assert_eq!(s.view(), array![[0.0, 0.0], [1.0, 0.0], [0.5, 0.0]].view());
        assert_eq!(range, ColumnRange { min: vec![0.0, 5.0], max: vec![10.0, 5.0] });
        assert_eq!(m.scaled_with(&range).unwrap(), s);
    }

    #[test]
    fn test_scaling_with_training_bounds() {
        let train = FeatureMatrix::new(array![[0.0, 1.0], [4.0, 3.0]]).unwrap();
        let range = train.column_range();
        assert_eq!(range.min, vec![0.0, 1.0]);
        assert_eq!(range.max, vec![4.0, 3.0]);

        let fresh = FeatureMatrix::new(array![[2.0, 2.0], [8.0, 1.0]]).unwrap();
        let s = fresh.scaled_with(&range).unwrap();
        assert_eq!(s.view(), array![[0.5, 0.5], [2.0, 0.0]].view());

        let narrow = FeatureMatrix::new(array![[1.0]]).unwrap();
        assert!(narrow.scaled_with(&range).is_err());
    }
}
