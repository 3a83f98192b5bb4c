// ============================================================
// Layer 5 — Autoencoder Trainer
// ============================================================
// Owns the feature matrix, the train/validation partition, both
// networks and both Adam optimisers, and drives training.
//
// Per batch (train_step):
//   input ─► Encoder ─► Decoder ─► MSE(reconstruction, target)
//         ─► backward ─► Adam step (encoder) ─► Adam step (decoder)
//
// Every `report_every` batches (never on batch 0) the full
// validation partition is scored in evaluate mode and the
// (train, validation) pair is appended to the LossHistory.
//
// Burn notes:
//   - Training uses an Autodiff backend; `backward()` returns a
//     fresh gradient set every call, so nothing leaks between
//     batches and there is no explicit zero_grad.
//   - The two optimisers see disjoint parameter sets:
//     GradientsParams::from_module pulls out only the gradients
//     belonging to the module it is given.
//   - Evaluate mode is `module.valid()`: the inner backend, where
//     Dropout is the identity and BatchNorm uses running stats.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam
//            Hinton & Salakhutdinov (2006) Reducing the
//            Dimensionality of Data with Neural Networks

use std::sync::Arc;

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use ndarray::{s, Array2};

use crate::data::{
    batcher::{rows_to_tensor, ReconstructionBatch, ReconstructionBatcher},
    dataset::SampleSource,
    splitter::{split, Partition},
};
use crate::domain::{
    feature_matrix::FeatureMatrix,
    loss_history::{LossHistory, LossReport},
};
use crate::error::{EmbedError, Result};
use crate::infra::checkpoint::{CheckpointStore, Component};
use crate::ml::inferencer::encode_rows;
use crate::ml::model::{Decoder, DecoderConfig, Encoder, EncoderConfig};
use crate::ml::state::{first_non_finite, LoadReport, NamedParameters};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct AutoEncoderConfig {
    #[config(default = 1000)]
    pub intermediate_size:   usize,
    #[config(default = 100)]
    pub encoding_size:       usize,
    #[config(default = true)]
    pub use_normalization:   bool,
    #[config(default = 0.2)]
    pub dropout:             f64,
    #[config(default = 0.2)]
    pub validation_fraction: f64,
    #[config(default = 0)]
    pub seed:                u64,
    #[config(default = 1e-3)]
    pub learning_rate:       f64,
    #[config(default = 1e-8)]
    pub weight_decay:        f64,
    #[config(default = 64)]
    pub batch_size:          usize,
    /// 0 keeps batch assembly on the training thread and reshuffles
    /// all training rows every epoch. With N > 0 workers burn splits
    /// the rows into N fixed shards and shuffles within each shard,
    /// so a batch never mixes rows from different shards.
    #[config(default = 0)]
    pub num_workers:         usize,
}

/// Which behaviour the networks were last run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

impl AutoEncoderConfig {
    pub fn encoder_config(&self, input_size: usize) -> EncoderConfig {
        EncoderConfig::new(input_size, self.intermediate_size, self.encoding_size)
            .with_use_normalization(self.use_normalization)
            .with_dropout(self.dropout)
    }

    pub fn decoder_config(&self, output_size: usize) -> DecoderConfig {
        DecoderConfig::new(output_size, self.intermediate_size, self.encoding_size)
            .with_use_normalization(self.use_normalization)
            .with_dropout(self.dropout)
    }

    /// Partition the data, seed the backend and build both networks
    /// with their optimisers on `device`.
    pub fn init<B: AutodiffBackend>(
        &self,
        data:   FeatureMatrix,
        device: &B::Device,
    ) -> Result<AutoEncoder<B, impl Optimizer<Encoder<B>, B>, impl Optimizer<Decoder<B>, B>>> {
        if self.batch_size == 0 {
            return Err(EmbedError::config("batch_size must be > 0"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(EmbedError::config(format!(
                "learning_rate must be positive, got {}", self.learning_rate
            )));
        }

        let encoder_cfg = self.encoder_config(data.cols());
        let decoder_cfg = self.decoder_config(data.cols());
        encoder_cfg.validate()?;
        decoder_cfg.validate()?;

        let partition = split(data.rows(), self.validation_fraction, self.seed)?;
        tracing::info!(
            "Split {} rows: {} training, {} validation",
            partition.total(), partition.training.len(), partition.validation.len()
        );

        B::seed(self.seed);
        let encoder: Encoder<B> = encoder_cfg.init(device);
        let decoder: Decoder<B> = decoder_cfg.init(device);
        tracing::info!(
            "Autoencoder ready: {} → {} → {} (normalization={}, dropout={})",
            data.cols(), self.intermediate_size, self.encoding_size,
            self.use_normalization, self.dropout
        );

        // Adam with a small L2 weight decay, one instance per network.
        let adam = AdamConfig::new()
            .with_weight_decay(Some(WeightDecayConfig::new(self.weight_decay as f32)));
        let encoder_optim = adam.init::<B, Encoder<B>>();
        let decoder_optim = adam.init::<B, Decoder<B>>();

        let samples = SampleSource::new(&data, &partition.training);
        let mut builder = DataLoaderBuilder::new(ReconstructionBatcher::<B>::new(device.clone()))
            .batch_size(self.batch_size)
            .shuffle(self.seed);
        if self.num_workers > 0 {
            tracing::info!(
                "Loading batches with {} workers; rows are shuffled within per-worker shards",
                self.num_workers
            );
            builder = builder.num_workers(self.num_workers);
        }
        let loader = builder.build(samples);

        let validation = data.select_rows(&partition.validation);

        Ok(AutoEncoder {
            config: self.clone(),
            data,
            partition,
            loader,
            validation,
            encoder,
            decoder,
            encoder_optim,
            decoder_optim,
            device: device.clone(),
            mode: Mode::Train,
            history: LossHistory::new(),
        })
    }
}

pub struct AutoEncoder<B, OE, OD>
where
    B:  AutodiffBackend,
    OE: Optimizer<Encoder<B>, B>,
    OD: Optimizer<Decoder<B>, B>,
{
    config:        AutoEncoderConfig,
    data:          FeatureMatrix,
    partition:     Partition,
    loader:        Arc<dyn DataLoader<ReconstructionBatch<B>>>,
    validation:    Array2<f32>,
    encoder:       Encoder<B>,
    decoder:       Decoder<B>,
    encoder_optim: OE,
    decoder_optim: OD,
    device:        B::Device,
    mode:          Mode,
    history:       LossHistory,
}

impl<B, OE, OD> AutoEncoder<B, OE, OD>
where
    B:  AutodiffBackend,
    OE: Optimizer<Encoder<B>, B>,
    OD: Optimizer<Decoder<B>, B>,
{
    // ─── Single steps ─────────────────────────────────────────────────────────

    /// One optimisation step on a batch; returns the batch MSE.
    ///
    /// The loss is checked before any parameter is touched, so a
    /// non-finite batch leaves both networks as they were. The
    /// updated parameters are checked after the step.
    pub fn train_step(&mut self, input: Tensor<B, 2>, target: Tensor<B, 2>) -> Result<f64> {
        self.mode = Mode::Train;
        self.check_batch(&input, &target)?;

        let latent         = self.encoder.forward(input)?;
        let reconstruction = self.decoder.forward(latent)?;
        let loss = MseLoss::new().forward(reconstruction, target, Reduction::Mean);

        let value: f64 = loss.clone().into_scalar().elem::<f64>();
        if !value.is_finite() {
            return Err(EmbedError::NumericInstability { stage: "train_step", value });
        }

        let mut grads    = loss.backward();
        let encoder_grads = GradientsParams::from_module(&mut grads, &self.encoder);
        let decoder_grads = GradientsParams::from_module(&mut grads, &self.decoder);

        let lr = self.config.learning_rate;
        self.encoder = self.encoder_optim.step(lr, self.encoder.clone(), encoder_grads);
        self.decoder = self.decoder_optim.step(lr, self.decoder.clone(), decoder_grads);
        self.check_parameters("train_step")?;

        Ok(value)
    }

    /// Reconstruction MSE in evaluate mode. No gradients, no updates.
    pub fn evaluate_loss(
        &mut self,
        input:  Tensor<B::InnerBackend, 2>,
        target: Tensor<B::InnerBackend, 2>,
    ) -> Result<f64> {
        self.mode = Mode::Eval;
        self.check_batch(&input, &target)?;

        let reconstruction = self.reconstruct(input)?;
        let loss = MseLoss::new().forward(reconstruction, target, Reduction::Mean);

        let value: f64 = loss.into_scalar().elem::<f64>();
        if !value.is_finite() {
            return Err(EmbedError::NumericInstability { stage: "evaluate_loss", value });
        }
        Ok(value)
    }

    /// Decoder(Encoder(x)) in evaluate mode.
    pub fn reconstruct(&self, input: Tensor<B::InnerBackend, 2>) -> Result<Tensor<B::InnerBackend, 2>> {
        let encoder = self.encoder.valid();
        let decoder = self.decoder.valid();
        decoder.forward(encoder.forward(input)?)
    }

    // ─── Loop ─────────────────────────────────────────────────────────────────

    pub fn train_loop(&mut self, epochs: usize, report_every: usize) -> Result<()> {
        self.train_loop_with(epochs, report_every, |_| Ok(()))
    }

    /// Like `train_loop`, handing every recorded report to `on_report`.
    pub fn train_loop_with<F>(&mut self, epochs: usize, report_every: usize, mut on_report: F) -> Result<()>
    where
        F: FnMut(&LossReport) -> Result<()>,
    {
        if self.partition.validation.is_empty() {
            tracing::warn!("Validation partition is empty, loss reports will be skipped");
        }

        let loader = Arc::clone(&self.loader);
        for epoch in 1..=epochs {
            tracing::info!("Epoch {}/{}", epoch, epochs);

            for (i, batch) in loader.iter().enumerate() {
                let train_loss = self.train_step(batch.inputs, batch.targets)?;

                if report_every == 0 || i == 0 || i % report_every != 0 {
                    continue;
                }
                let Some(val_loss) = self.validation_loss()? else { continue };

                let report = LossReport { epoch, batch: i, train_loss, val_loss };
                self.history.record(train_loss, val_loss);
                tracing::info!(
                    "Epoch {:>3} | batch {:>5} | train_loss={:.6} | val_loss={:.6}",
                    epoch, i, train_loss, val_loss
                );
                on_report(&report)?;
            }
        }

        tracing::info!("Training complete: {} loss report(s) recorded", self.history.len());
        Ok(())
    }

    /// MSE over the whole validation partition, scored in chunks of
    /// `batch_size` rows. `None` when the partition is empty.
    fn validation_loss(&mut self) -> Result<Option<f64>> {
        let rows  = self.validation.nrows();
        let width = self.validation.ncols();
        if rows == 0 {
            return Ok(None);
        }

        let mut weighted = 0.0f64;
        for start in (0..rows).step_by(self.config.batch_size) {
            let end  = (start + self.config.batch_size).min(rows);
            let flat: Vec<f32> = self.validation.slice(s![start..end, ..]).iter().copied().collect();

            let input  = rows_to_tensor::<B::InnerBackend>(flat, end - start, width, &self.device);
            let target = input.clone();
            weighted += self.evaluate_loss(input, target)? * (end - start) as f64;
        }
        Ok(Some(weighted / rows as f64))
    }

    // ─── Outputs ──────────────────────────────────────────────────────────────

    /// One latent vector per row of the full matrix, in row order.
    pub fn get_encoded_representations(&mut self) -> Result<Array2<f32>> {
        self.mode = Mode::Eval;
        encode_rows(&self.encoder.valid(), &self.data, &self.device, self.config.batch_size)
    }

    pub fn save_checkpoints(&self, store: &CheckpointStore) -> Result<()> {
        store.save(Component::Encoder, &self.encoder)?;
        store.save(Component::Decoder, &self.decoder)?;
        tracing::info!("Checkpoints written to '{}'", store.dir().display());
        Ok(())
    }

    /// Restore both networks; each file goes into its own network.
    pub fn load_checkpoints(&mut self, store: &CheckpointStore) -> Result<(LoadReport, LoadReport)> {
        let (encoder, encoder_report) = store.load(Component::Encoder, self.encoder.clone())?;
        let (decoder, decoder_report) = store.load(Component::Decoder, self.decoder.clone())?;
        self.encoder = encoder;
        self.decoder = decoder;
        Ok((encoder_report, decoder_report))
    }

    // ─── Accessors ────────────────────────────────────────────────────────────

    pub fn history(&self) -> &LossHistory {
        &self.history
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn config(&self) -> &AutoEncoderConfig {
        &self.config
    }

    pub fn encoder(&self) -> &Encoder<B> {
        &self.encoder
    }

    pub fn decoder(&self) -> &Decoder<B> {
        &self.decoder
    }

    // ─── Checks ───────────────────────────────────────────────────────────────

    fn check_parameters(&self, stage: &'static str) -> Result<()> {
        for dict in [self.encoder.state_dict()?, self.decoder.state_dict()?] {
            if let Some((name, value)) = first_non_finite(&dict) {
                tracing::error!("Parameter '{}' became {} during {}", name, value, stage);
                return Err(EmbedError::NumericInstability { stage, value: value as f64 });
            }
        }
        Ok(())
    }

    fn check_batch<BB: Backend<Device = B::Device>>(&self, input: &Tensor<BB, 2>, target: &Tensor<BB, 2>) -> Result<()> {
        let width = self.data.cols();
        for (what, tensor) in [("batch input", input), ("batch target", target)] {
            if tensor.device() != self.device {
                return Err(EmbedError::config(format!(
                    "{what} is on {:?}, networks are on {:?}", tensor.device(), self.device
                )));
            }
            let [_, actual] = tensor.dims();
            if actual != width {
                return Err(EmbedError::DimensionMismatch { what, expected: width, actual });
            }
        }
        if input.dims()[0] != target.dims()[0] {
            return Err(EmbedError::DimensionMismatch {
                what:     "batch rows",
                expected: input.dims()[0],
                actual:   target.dims()[0],
            });
        }
        Ok(())
    }
}
