// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Encodes a feature matrix with an evaluate-mode encoder.
//
// Used twice:
//   - by the trainer, right after training, on `encoder.valid()`
//   - by the `encode` command, on an encoder rebuilt from
//     train_config.json and restored from encoder_checkpoint.pt
//
// Input preparation is identical to training: rows are copied
// out row-major as f32, stacked into a [rows, F] tensor on the
// encoder's device, and pushed through in chunks.

use burn::prelude::*;
use ndarray::{s, Array2};

use crate::data::batcher::rows_to_tensor;
use crate::domain::feature_matrix::FeatureMatrix;
use crate::error::{EmbedError, Result};
use crate::infra::checkpoint::{CheckpointStore, Component};
use crate::ml::model::{Encoder, EncoderConfig};

/// One latent row per matrix row, in the matrix's row order.
///
/// `B` should be a non-autodiff backend so the encoder runs with
/// running BatchNorm statistics and no dropout. A NaN or infinite
/// encoding is a `NumericInstability` error.
pub fn encode_rows<B: Backend>(
    encoder:    &Encoder<B>,
    matrix:     &FeatureMatrix,
    device:     &B::Device,
    batch_size: usize,
) -> Result<Array2<f32>> {
    if batch_size == 0 {
        return Err(EmbedError::config("batch_size must be > 0"));
    }

    let rows  = matrix.rows();
    let width = matrix.cols();
    let mut encoded = Array2::<f32>::zeros((rows, encoder.encoding_size));

    for start in (0..rows).step_by(batch_size) {
        let end = (start + batch_size).min(rows);
        let input  = rows_to_tensor::<B>(matrix.flat_rows(start, end), end - start, width, device);
        let latent = encoder.forward(input)?;

        let values = latent
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| EmbedError::Tensor(format!("{e:?}")))?;
        let chunk = Array2::from_shape_vec((end - start, encoder.encoding_size), values)
            .map_err(|e| EmbedError::Tensor(e.to_string()))?;
        encoded.slice_mut(s![start..end, ..]).assign(&chunk);
    }

    if let Some(value) = encoded.iter().find(|v| !v.is_finite()) {
        return Err(EmbedError::NumericInstability { stage: "encode", value: *value as f64 });
    }

    tracing::debug!("Encoded {} rows into {} dimensions", rows, encoder.encoding_size);
    Ok(encoded)
}

/// Rebuild an encoder from its config and restore its checkpoint.
pub fn load_encoder<B: Backend>(
    store:  &CheckpointStore,
    config: &EncoderConfig,
    device: &B::Device,
) -> Result<Encoder<B>> {
    config.validate()?;
    let (encoder, _) = store.load(Component::Encoder, config.init::<B>(device))?;
    Ok(encoder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use ndarray::array;

    type TestBackend = NdArray;

    #[test]
    fn test_encodes_every_row_in_order() {
        let device = Default::default();
        let encoder: Encoder<TestBackend> = EncoderConfig::new(2, 8, 3).init(&device);
        let matrix = FeatureMatrix::new(array![[0.1, 0.2], [0.3, 0.4], [0.5, 0.6], [0.7, 0.8], [0.9, 1.0]]).unwrap();

        // Chunked and one-shot encodings must agree row for row.
        let chunked = encode_rows(&encoder, &matrix, &device, 2).unwrap();
        let whole   = encode_rows(&encoder, &matrix, &device, 64).unwrap();

        assert_eq!(chunked.dim(), (5, 3));
        for (a, b) in chunked.iter().zip(whole.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_width_mismatch_is_rejected() {
        let device = Default::default();
        let encoder: Encoder<TestBackend> = EncoderConfig::new(3, 8, 2).init(&device);
        let matrix = FeatureMatrix::new(array![[0.1, 0.2]]).unwrap();

        let err = encode_rows(&encoder, &matrix, &device, 8).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_non_finite_encoding_is_rejected() {
        use crate::ml::state::NamedParameters;

        let device = Default::default();
        let config = EncoderConfig::new(2, 4, 3).with_use_normalization(false);
        let encoder: Encoder<TestBackend> = config.init(&device);

        let mut dict = encoder.state_dict().unwrap();
        dict.get_mut("latent_proj.bias").unwrap().values.fill(f32::INFINITY);
        let (broken, _) = encoder.load_state_dict(&dict).unwrap();

        let matrix = FeatureMatrix::new(array![[0.1, 0.2], [0.3, 0.4]]).unwrap();
        let err = encode_rows(&broken, &matrix, &device, 8).unwrap_err();
        assert!(matches!(err, EmbedError::NumericInstability { stage: "encode", .. }));
    }

    #[test]
    fn test_load_encoder_round_trip() {
        let dir    = tempfile::tempdir().unwrap();
        let store  = CheckpointStore::new(dir.path());
        let device = Default::default();
        let config = EncoderConfig::new(2, 8, 3);

        let original: Encoder<TestBackend> = config.init(&device);
        store.save(Component::Encoder, &original).unwrap();

        let restored = load_encoder::<TestBackend>(&store, &config, &device).unwrap();
        let matrix = FeatureMatrix::new(array![[0.1, 0.9], [0.4, 0.6]]).unwrap();
        assert_eq!(
            encode_rows(&original, &matrix, &device, 4).unwrap(),
            encode_rows(&restored, &matrix, &device, 4).unwrap(),
        );
    }
}
