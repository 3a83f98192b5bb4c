// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full autoencoder training run:
//
//   Step 1: Load the feature CSV         (Layer 4 - data)
//   Step 2: Optionally min-max scale it  (Layer 3 - domain)
//   Step 3: Build the autoencoder        (Layer 5 - ml)
//   Step 4: Save config for inference    (Layer 6 - infra)
//   Step 5: Train, logging loss reports  (Layer 5 + 6)
//   Step 6: Save both checkpoints        (Layer 6 - infra)
//   Step 7: Export the encodings         (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::loader::CsvMatrixLoader;
use crate::domain::{
    feature_matrix::ColumnRange,
    loss_history::LossHistory,
    traits::FeatureSource,
};
use crate::infra::{
    checkpoint::{CheckpointStore, DEFAULT_DIR},
    export::write_matrix_csv,
    metrics::MetricsLogger,
};
use crate::ml::{
    model::EncoderConfig,
    trainer::AutoEncoderConfig,
    Device, TrainBackend,
};

pub const ENCODINGS_FILE: &str = "encodings.csv";

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs. Saved as train_config.json next to the
// checkpoints; `input_size` and `scaling` are filled in from the
// data before saving so `encode` can rebuild the same encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub features_path:       String,
    pub checkpoint_dir:      String,
    pub epochs:              usize,
    pub report_every:        usize,
    pub scale:               bool,
    pub intermediate_size:   usize,
    pub encoding_size:       usize,
    pub use_normalization:   bool,
    pub dropout:             f64,
    pub validation_fraction: f64,
    pub seed:                u64,
    pub lr:                  f64,
    pub weight_decay:        f64,
    pub batch_size:          usize,
    pub num_workers:         usize,
    #[serde(default)]
    pub input_size:          Option<usize>,
    #[serde(default)]
    pub scaling:             Option<ColumnRange>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            features_path:       "data/features.csv".to_string(),
            checkpoint_dir:      DEFAULT_DIR.to_string(),
            epochs:              10,
            report_every:        100,
            scale:               false,
            intermediate_size:   1000,
            encoding_size:       100,
            use_normalization:   true,
            dropout:             0.2,
            validation_fraction: 0.2,
            seed:                0,
            lr:                  1e-3,
            weight_decay:        1e-8,
            batch_size:          64,
            num_workers:         0,
            input_size:          None,
            scaling:             None,
        }
    }
}

impl TrainConfig {
    pub fn autoencoder(&self) -> AutoEncoderConfig {
        AutoEncoderConfig::new()
            .with_intermediate_size(self.intermediate_size)
            .with_encoding_size(self.encoding_size)
            .with_use_normalization(self.use_normalization)
            .with_dropout(self.dropout)
            .with_validation_fraction(self.validation_fraction)
            .with_seed(self.seed)
            .with_learning_rate(self.lr)
            .with_weight_decay(self.weight_decay)
            .with_batch_size(self.batch_size)
            .with_num_workers(self.num_workers)
    }

    /// The encoder this run produced. Needs `input_size`, which is
    /// only known once the data has been loaded.
    pub fn encoder(&self) -> Result<EncoderConfig> {
        let input_size = self
            .input_size
            .context("train_config.json has no input_size; was it written by a finished run?")?;
        Ok(self.autoencoder().encoder_config(input_size))
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub history:        LossHistory,
    pub encodings_path: PathBuf,
    pub rows:           usize,
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainOutcome> {
        let mut cfg = self.config.clone();

        // ── Step 1: Load features ─────────────────────────────────────────────
        let matrix = CsvMatrixLoader::new(&cfg.features_path)
            .load()
            .with_context(|| format!("Cannot load features from '{}'", cfg.features_path))?;

        // ── Step 2: Scale into the sigmoid's range ────────────────────────────
        let matrix = if cfg.scale {
            let (scaled, range) = matrix.min_max_scaled();
            cfg.scaling = Some(range);
            scaled
        } else {
            matrix
        };
        cfg.input_size = Some(matrix.cols());
        let rows = matrix.rows();

        // ── Step 3: Build the autoencoder ─────────────────────────────────────
        let device = Device::default();
        tracing::info!("Using device: {:?}", device);
        let mut autoencoder = cfg
            .autoencoder()
            .init::<TrainBackend>(matrix, &device)
            .context("Invalid autoencoder configuration")?;

        // ── Step 4: Save config for inference ─────────────────────────────────
        let store = CheckpointStore::new(&cfg.checkpoint_dir);
        store.save_config(&cfg)?;

        // ── Step 5: Train ─────────────────────────────────────────────────────
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;
        autoencoder
            .train_loop_with(cfg.epochs, cfg.report_every, |report| metrics.log(report))
            .context("Training aborted")?;

        // ── Step 6: Checkpoints ───────────────────────────────────────────────
        autoencoder.save_checkpoints(&store)?;

        // ── Step 7: Encodings of every row ────────────────────────────────────
        let encodings = autoencoder.get_encoded_representations()?;
        let encodings_path = store.dir().join(ENCODINGS_FILE);
        write_matrix_csv(&encodings, &encodings_path)?;

        Ok(TrainOutcome {
            history: autoencoder.history().clone(),
            encodings_path,
            rows,
        })
    }
}
