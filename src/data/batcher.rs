// ============================================================
// Layer 4 — Reconstruction Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<Sample>
// into device tensors.
//
// How batching works here:
//   Input:  Vec of N Samples, each a row of F features
//   Output: ReconstructionBatch with two [N, F] tensors
//
//   Rows are flattened into one long Vec, then reshaped:
//   [r1_f1, r1_f2, ..., r1_fF, r2_f1, ..., rN_fF] → [N, F]
//
// All rows come from the same FeatureMatrix, so they share a
// width and no padding is ever needed.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::Sample;

// ─── ReconstructionBatch ──────────────────────────────────────────────────────
/// A batch of samples ready for the encoder → decoder pass.
#[derive(Debug, Clone)]
pub struct ReconstructionBatch<B: Backend> {
    /// Encoder inputs — shape: [batch_size, features]
    pub inputs: Tensor<B, 2>,

    /// Reconstruction targets — shape: [batch_size, features]
    pub targets: Tensor<B, 2>,
}

// ─── ReconstructionBatcher ────────────────────────────────────────────────────
/// Holds the target device so every batch is created where
/// the networks live.
#[derive(Clone, Debug)]
pub struct ReconstructionBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ReconstructionBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Stack a row-major buffer into a [rows, width] float tensor.
pub fn rows_to_tensor<B: Backend>(flat: Vec<f32>, rows: usize, width: usize, device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 2>::from_data(TensorData::new(flat, [rows, width]), device)
}

impl<B: Backend> Batcher<Sample, ReconstructionBatch<B>> for ReconstructionBatcher<B> {
    fn batch(&self, items: Vec<Sample>) -> ReconstructionBatch<B> {
        let batch_size = items.len();
        let width      = items.first().map(|s| s.input.len()).unwrap_or(0);

        let input_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.input.iter().copied())
            .collect();

        let target_flat: Vec<f32> = items
            .into_iter()
            .flat_map(|s| s.target.into_iter())
            .collect();

        ReconstructionBatch {
            inputs:  rows_to_tensor(input_flat, batch_size, width, &self.device),
            targets: rows_to_tensor(target_flat, batch_size, width, &self.device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes_and_values() {
        let batcher = ReconstructionBatcher::<TestBackend>::new(Default::default());
        let items = vec![
            Sample { input: vec![0.1, 0.2, 0.3], target: vec![0.1, 0.2, 0.3] },
            Sample { input: vec![0.4, 0.5, 0.6], target: vec![0.4, 0.5, 0.6] },
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.inputs.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(), [2, 3]);

        let values = batch.inputs.into_data().to_vec::<f32>().unwrap();
        assert_eq!(values, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    }
}
