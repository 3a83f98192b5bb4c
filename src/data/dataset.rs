// ============================================================
// Layer 4 — Sample Source
// ============================================================
// Exposes the training rows as indexed (input, target) pairs.
//
// For an autoencoder the target IS the input: the network is
// asked to reconstruct what it was given. The two vectors are
// still separate copies, because the input flows through the
// encoder and decoder while the target only meets the
// reconstruction inside the loss.
//
// Implements Burn's Dataset trait so DataLoaderBuilder can
// shuffle and batch it.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

use burn::data::dataset::Dataset;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::domain::feature_matrix::FeatureMatrix;

/// One reconstruction example. `input == target` at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub input:  Vec<f32>,
    pub target: Vec<f32>,
}

/// Read-only view of the training partition.
pub struct SampleSource {
    rows: Array2<f32>,
}

impl SampleSource {
    /// Copy the training rows (in partition order) out of the matrix.
    pub fn new(matrix: &FeatureMatrix, training_indices: &[usize]) -> Self {
        Self { rows: matrix.select_rows(training_indices) }
    }

    pub fn size(&self) -> usize {
        self.rows.nrows()
    }

    pub fn width(&self) -> usize {
        self.rows.ncols()
    }
}

impl Dataset<Sample> for SampleSource {
    fn get(&self, index: usize) -> Option<Sample> {
        if index >= self.size() {
            return None;
        }
        let row = self.rows.row(index).to_vec();
        Some(Sample { input: row.clone(), target: row })
    }

    fn len(&self) -> usize {
        self.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn source() -> SampleSource {
        let m = FeatureMatrix::new(array![[0.0, 0.1], [1.0, 1.1], [2.0, 2.1]]).unwrap();
        SampleSource::new(&m, &[2, 0])
    }

    #[test]
    fn test_size_matches_training_rows() {
        let s = source();
        assert_eq!(s.size(), 2);
        assert_eq!(s.len(), 2);
        assert_eq!(s.width(), 2);
    }

    #[test]
    fn test_input_equals_target() {
        let s = source();
        let sample = s.get(0).unwrap();
        assert_eq!(sample.input, vec![2.0, 2.1]);
        assert_eq!(sample.input, sample.target);
        assert_eq!(s.get(1).unwrap().input, vec![0.0, 0.1]);
    }

    #[test]
    fn test_out_of_range_is_none() {
        assert!(source().get(2).is_none());
    }
}
