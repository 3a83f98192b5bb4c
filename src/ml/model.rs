// ============================================================
// Layer 5 — Encoder / Decoder Networks
// ============================================================
// The two halves of the autoencoder. They are separate Burn
// modules with separate parameters and separate optimisers;
// only the training loop ties them together.
//
//   Encoder:  input ─► Linear ─► [BatchNorm] ─► ReLU ─► Dropout
//                   ─► Linear ─► [BatchNorm] ─► ReLU ─► Dropout ─► latent
//
//   Decoder:  latent ─► Linear ─► [BatchNorm] ─► ReLU ─► Dropout
//                    ─► Linear ─► [BatchNorm] ─► Sigmoid ─► reconstruction
//
// Sizes: input_size → intermediate_size → encoding_size and back.
//
// Train vs evaluate mode
//   Burn decides from the backend: on an Autodiff backend,
//   BatchNorm normalises with batch statistics (and updates its
//   running averages) and Dropout zeroes units. After
//   `module.valid()` the same module lives on the inner backend,
//   where BatchNorm uses the running averages and Dropout is the
//   identity.
//
// Reference: Ioffe & Szegedy (2015) Batch Normalization
//            Srivastava et al. (2014) Dropout

use burn::{
    nn::{BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::error::{EmbedError, Result};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct EncoderConfig {
    pub input_size:        usize,
    pub intermediate_size: usize,
    pub encoding_size:     usize,
    #[config(default = true)]
    pub use_normalization: bool,
    #[config(default = 0.2)]
    pub dropout:           f64,
}

#[derive(Config, Debug)]
pub struct DecoderConfig {
    pub output_size:       usize,
    pub intermediate_size: usize,
    pub encoding_size:     usize,
    #[config(default = true)]
    pub use_normalization: bool,
    #[config(default = 0.2)]
    pub dropout:           f64,
}

/// Shared checks for both halves; `init` assumes these pass.
fn validate_sizes(sizes: [(&str, usize); 3], dropout: f64) -> Result<()> {
    for (name, size) in sizes {
        if size == 0 {
            return Err(EmbedError::config(format!("{name} must be > 0")));
        }
    }
    if !(0.0..1.0).contains(&dropout) {
        return Err(EmbedError::config(format!("dropout must be in [0, 1), got {dropout}")));
    }
    Ok(())
}

fn norm_layer<B: Backend>(enabled: bool, features: usize, device: &B::Device) -> Option<BatchNorm<B, 0>> {
    enabled.then(|| BatchNormConfig::new(features).init(device))
}

fn normalize<B: Backend>(norm: &Option<BatchNorm<B, 0>>, x: Tensor<B, 2>) -> Tensor<B, 2> {
    match norm {
        Some(norm) => norm.forward(x),
        None       => x,
    }
}

fn check_width<B: Backend>(what: &'static str, x: &Tensor<B, 2>, expected: usize) -> Result<()> {
    let [_, actual] = x.dims();
    if actual != expected {
        return Err(EmbedError::DimensionMismatch { what, expected, actual });
    }
    Ok(())
}

// ─── Encoder ──────────────────────────────────────────────────────────────────

impl EncoderConfig {
    pub fn validate(&self) -> Result<()> {
        validate_sizes(
            [
                ("input_size", self.input_size),
                ("intermediate_size", self.intermediate_size),
                ("encoding_size", self.encoding_size),
            ],
            self.dropout,
        )
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Encoder<B> {
        Encoder {
            input_proj:    LinearConfig::new(self.input_size, self.intermediate_size).init(device),
            input_norm:    norm_layer(self.use_normalization, self.intermediate_size, device),
            latent_proj:   LinearConfig::new(self.intermediate_size, self.encoding_size).init(device),
            latent_norm:   norm_layer(self.use_normalization, self.encoding_size, device),
            dropout:       DropoutConfig::new(self.dropout).init(),
            input_size:    self.input_size,
            encoding_size: self.encoding_size,
        }
    }
}

#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub input_proj:    Linear<B>,
    pub input_norm:    Option<BatchNorm<B, 0>>,
    pub latent_proj:   Linear<B>,
    pub latent_norm:   Option<BatchNorm<B, 0>>,
    pub dropout:       Dropout,
    pub input_size:    usize,
    pub encoding_size: usize,
}

impl<B: Backend> Encoder<B> {
    /// [batch, input_size] → [batch, encoding_size], all values ≥ 0.
    pub fn forward(&self, x: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        check_width("encoder input", &x, self.input_size)?;

        let x = normalize(&self.input_norm, self.input_proj.forward(x));
        let x = self.dropout.forward(relu(x));

        let x = normalize(&self.latent_norm, self.latent_proj.forward(x));
        Ok(self.dropout.forward(relu(x)))
    }
}

// ─── Decoder ──────────────────────────────────────────────────────────────────

impl DecoderConfig {
    pub fn validate(&self) -> Result<()> {
        validate_sizes(
            [
                ("output_size", self.output_size),
                ("intermediate_size", self.intermediate_size),
                ("encoding_size", self.encoding_size),
            ],
            self.dropout,
        )
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Decoder<B> {
        Decoder {
            hidden_proj:   LinearConfig::new(self.encoding_size, self.intermediate_size).init(device),
            hidden_norm:   norm_layer(self.use_normalization, self.intermediate_size, device),
            output_proj:   LinearConfig::new(self.intermediate_size, self.output_size).init(device),
            output_norm:   norm_layer(self.use_normalization, self.output_size, device),
            dropout:       DropoutConfig::new(self.dropout).init(),
            encoding_size: self.encoding_size,
            output_size:   self.output_size,
        }
    }
}

#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub hidden_proj:   Linear<B>,
    pub hidden_norm:   Option<BatchNorm<B, 0>>,
    pub output_proj:   Linear<B>,
    pub output_norm:   Option<BatchNorm<B, 0>>,
    pub dropout:       Dropout,
    pub encoding_size: usize,
    pub output_size:   usize,
}

impl<B: Backend> Decoder<B> {
    /// [batch, encoding_size] → [batch, output_size], values in (0, 1).
    pub fn forward(&self, z: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        check_width("decoder input", &z, self.encoding_size)?;

        let x = normalize(&self.hidden_norm, self.hidden_proj.forward(z));
        let x = self.dropout.forward(relu(x));

        let x = normalize(&self.output_norm, self.output_proj.forward(x));
        Ok(sigmoid(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::{Distribution, TensorData};

    type TestBackend = NdArray;
    type TrainBackend = Autodiff<NdArray>;

    fn encoder_cfg() -> EncoderConfig {
        EncoderConfig::new(6, 16, 4)
    }

    fn decoder_cfg() -> DecoderConfig {
        DecoderConfig::new(6, 16, 4)
    }

    #[test]
    fn test_reconstruction_has_input_width() {
        let device = Default::default();
        let encoder: Encoder<TestBackend> = encoder_cfg().init(&device);
        let decoder: Decoder<TestBackend> = decoder_cfg().init(&device);

        let x = Tensor::<TestBackend, 2>::random([3, 6], Distribution::Uniform(0.0, 1.0), &device);
        let z = encoder.forward(x).unwrap();
        assert_eq!(z.dims(), [3, 4]);

        let y = decoder.forward(z).unwrap();
        assert_eq!(y.dims(), [3, 6]);
    }

    #[test]
    fn test_wrong_width_is_rejected() {
        let device = Default::default();
        let encoder: Encoder<TestBackend> = encoder_cfg().init(&device);
        let x = Tensor::<TestBackend, 2>::zeros([2, 5], &device);

        let err = encoder.forward(x).unwrap_err();
        assert!(matches!(
            err,
            EmbedError::DimensionMismatch { expected: 6, actual: 5, .. }
        ));

        let decoder: Decoder<TestBackend> = decoder_cfg().init(&device);
        assert!(decoder.forward(Tensor::zeros([2, 6], &device)).is_err());
    }

    #[test]
    fn test_output_ranges() {
        let device = Default::default();
        let encoder: Encoder<TestBackend> = encoder_cfg().with_use_normalization(false).init(&device);
        let decoder: Decoder<TestBackend> = decoder_cfg().with_use_normalization(false).init(&device);

        let x = Tensor::<TestBackend, 2>::random([8, 6], Distribution::Uniform(-1.0, 1.0), &device);
        let z = encoder.forward(x).unwrap();
        let latent = z.clone().into_data().to_vec::<f32>().unwrap();
        assert!(latent.iter().all(|v| *v >= 0.0));

        let y = decoder.forward(z).unwrap().into_data().to_vec::<f32>().unwrap();
        assert!(y.iter().all(|v| *v >= 0.0 && *v <= 1.0));
    }

    #[test]
    fn test_evaluate_mode_is_deterministic() {
        let device = Default::default();
        let encoder: Encoder<TestBackend> = encoder_cfg().with_dropout(0.5).init(&device);

        let x = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.5f32; 12], [2, 6]),
            &device,
        );
        let a = encoder.forward(x.clone()).unwrap().into_data();
        let b = encoder.forward(x).unwrap().into_data();
        assert_eq!(a, b);
    }

    #[test]
    fn test_train_mode_dropout_varies() {
        let device = Default::default();
        let encoder: Encoder<TrainBackend> = EncoderConfig::new(6, 64, 32)
            .with_use_normalization(false)
            .with_dropout(0.5)
            .init(&device);

        let x = Tensor::<TrainBackend, 2>::ones([4, 6], &device);
        let runs: Vec<Vec<f32>> = (0..5)
            .map(|_| encoder.forward(x.clone()).unwrap().into_data().to_vec::<f32>().unwrap())
            .collect();

        assert!(runs.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_invalid_configs() {
        assert!(EncoderConfig::new(0, 4, 2).validate().is_err());
        assert!(DecoderConfig::new(4, 4, 2).with_dropout(1.0).validate().is_err());
        assert!(encoder_cfg().validate().is_ok());
    }
}
