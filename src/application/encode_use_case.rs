// ============================================================
// Layer 2 — EncodeUseCase
// ============================================================
// Inference-only encoding with a finished run's checkpoint:
//
//   Step 1: Read train_config.json   → encoder topology + scaling
//   Step 2: Rebuild + restore encoder (encoder_checkpoint.pt)
//   Step 3: Load and scale features  (same bounds as training)
//   Step 4: Encode every row         (evaluate mode)
//   Step 5: Write the encodings CSV
//
// No autodiff backend is involved: the restored encoder lives
// on the inference backend, so dropout is off and BatchNorm
// uses the running statistics saved with the checkpoint.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use ndarray::Array2;

use crate::application::train_use_case::TrainConfig;
use crate::data::loader::CsvMatrixLoader;
use crate::domain::traits::FeatureSource;
use crate::infra::{checkpoint::CheckpointStore, export::write_matrix_csv};
use crate::ml::{
    inferencer::{encode_rows, load_encoder},
    Device, InferBackend,
};

#[derive(Debug, Clone)]
pub struct EncodeRequest {
    pub features_path:  PathBuf,
    pub checkpoint_dir: PathBuf,
    pub output_path:    Option<PathBuf>,
}

pub struct EncodeUseCase {
    request: EncodeRequest,
}

impl EncodeUseCase {
    pub fn new(request: EncodeRequest) -> Self {
        Self { request }
    }

    pub fn execute(&self) -> Result<Array2<f32>> {
        let req = &self.request;

        // ── Step 1: Run configuration ─────────────────────────────────────────
        let store = CheckpointStore::new(&req.checkpoint_dir);
        let cfg: TrainConfig = store.load_config().with_context(|| {
            format!(
                "Cannot read the run configuration in '{}'. Have you run 'train' first?",
                req.checkpoint_dir.display()
            )
        })?;
        let encoder_cfg = cfg.encoder()?;

        // ── Step 2: Encoder ───────────────────────────────────────────────────
        let device = Device::default();
        let encoder = load_encoder::<InferBackend>(&store, &encoder_cfg, &device)
            .context("Cannot restore the encoder checkpoint")?;

        // ── Step 3: Features ──────────────────────────────────────────────────
        let matrix = CsvMatrixLoader::new(&req.features_path)
            .load()
            .with_context(|| format!("Cannot load features from '{}'", req.features_path.display()))?;
        if matrix.cols() != encoder_cfg.input_size {
            bail!(
                "'{}' has {} columns but the encoder was trained on {}",
                req.features_path.display(), matrix.cols(), encoder_cfg.input_size
            );
        }
        let matrix = match &cfg.scaling {
            Some(range) => matrix.scaled_with(range)?,
            None        => matrix,
        };

        // ── Step 4: Encode ────────────────────────────────────────────────────
        let encodings = encode_rows(&encoder, &matrix, &device, cfg.batch_size)?;

        // ── Step 5: Export ────────────────────────────────────────────────────
        if let Some(path) = &req.output_path {
            write_matrix_csv(&encodings, path)?;
        }
        Ok(encodings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{TrainUseCase, ENCODINGS_FILE};
    use std::fs;

    #[test]
    fn test_encode_matches_training_encodings() {
        let dir = tempfile::tempdir().unwrap();
        let features = dir.path().join("features.csv");
        let rows: String = (0..12).map(|i| format!("{},{}\n", i, (i * 5) % 9)).collect();
        fs::write(&features, rows).unwrap();

        let ckpt = dir.path().join("checkpoint");
        let cfg = TrainConfig {
            features_path:     features.to_string_lossy().into_owned(),
            checkpoint_dir:    ckpt.to_string_lossy().into_owned(),
            epochs:            1,
            report_every:      0,
            scale:             true,
            intermediate_size: 6,
            encoding_size:     2,
            batch_size:        4,
            ..TrainConfig::default()
        };
        TrainUseCase::new(cfg).execute().unwrap();

        let out = dir.path().join("again.csv");
        let encodings = EncodeUseCase::new(EncodeRequest {
            features_path:  features,
            checkpoint_dir: ckpt.clone(),
            output_path:    Some(out.clone()),
        })
        .execute()
        .unwrap();

        assert_eq!(encodings.dim(), (12, 2));
        let from_training = CsvMatrixLoader::new(ckpt.join(ENCODINGS_FILE)).load().unwrap();
        for (a, b) in from_training.view().iter().zip(encodings.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
        assert!(out.exists());
    }

    #[test]
    fn test_untrained_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EncodeUseCase::new(EncodeRequest {
            features_path:  dir.path().join("features.csv"),
            checkpoint_dir: dir.path().to_path_buf(),
            output_path:    None,
        })
        .execute()
        .unwrap_err();
        assert!(format!("{err:#}").contains("train"));
    }
}
