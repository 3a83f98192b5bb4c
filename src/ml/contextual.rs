// ============================================================
// Layer 5 — Contextual Text Encoder
// ============================================================
// A BERT-style transformer encoder used to turn a sentence into
// one pooled vector.
//
// Architecture:
//   input_ids   ─► token embedding    ┐
//   positions   ─► position embedding ├─► sum ─► LayerNorm ─► Dropout
//   segment_ids ─► segment embedding  ┘
//        ─► N × EncoderBlock (attention ─► add & norm ─► GELU
//                             intermediate ─► output ─► add & norm)
//        ─► hidden states [batch, seq_len, d_model]
//        ─► mean over the unpadded positions ─► [batch, d_model]
//
// A padding mask [batch, seq_len] (true = padding) hides padded keys
// from attention and drops them from the pooled mean, so a sentence
// embeds the same alone or inside a padded batch.
//
// Only inference is done here: weights come either from a fresh
// seeded init or from a Burn record file written by the host.
//
// Reference: Vaswani et al. (2017) Attention Is All You Need
//            Devlin et al. (2019) BERT

use std::path::Path;

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::activation::gelu,
};

use crate::error::{EmbedError, Result};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct ContextualEncoderConfig {
    pub vocab_size:      usize,
    #[config(default = 128)]
    pub max_seq_len:     usize,
    #[config(default = 2)]
    pub type_vocab_size: usize,
    #[config(default = 256)]
    pub d_model:         usize,
    #[config(default = 4)]
    pub num_heads:       usize,
    #[config(default = 2)]
    pub num_layers:      usize,
    #[config(default = 1024)]
    pub d_ff:            usize,
    #[config(default = 0.1)]
    pub dropout:         f64,
}

impl ContextualEncoderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.vocab_size == 0 || self.max_seq_len < 3 || self.type_vocab_size == 0 {
            return Err(EmbedError::config(
                "vocab_size and type_vocab_size must be > 0 and max_seq_len >= 3",
            ));
        }
        if self.num_heads == 0 || self.d_model % self.num_heads != 0 {
            return Err(EmbedError::config(format!(
                "d_model ({}) must be divisible by num_heads ({})",
                self.d_model, self.num_heads
            )));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ContextualEncoder<B> {
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        ContextualEncoder {
            token_embedding:    EmbeddingConfig::new(self.vocab_size, self.d_model).init(device),
            position_embedding: EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device),
            segment_embedding:  EmbeddingConfig::new(self.type_vocab_size, self.d_model).init(device),
            embed_norm:         LayerNormConfig::new(self.d_model).init(device),
            layers,
            dropout:            DropoutConfig::new(self.dropout).init(),
            max_seq_len:        self.max_seq_len,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        EncoderBlock {
            attention: MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
                .with_dropout(self.dropout)
                .init(device),
            attention_norm: LayerNormConfig::new(self.d_model).init(device),
            intermediate:   LinearConfig::new(self.d_model, self.d_ff).init(device),
            output:         LinearConfig::new(self.d_ff, self.d_model).init(device),
            output_norm:    LayerNormConfig::new(self.d_model).init(device),
            dropout:        DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// One BERT layer: attention and feed-forward sub-layers, each
/// followed by a residual add and LayerNorm.
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub attention:      MultiHeadAttention<B>,
    pub attention_norm: LayerNorm<B>,
    pub intermediate:   Linear<B>,
    pub output:         Linear<B>,
    pub output_norm:    LayerNorm<B>,
    pub dropout:        Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>, mask_pad: Option<Tensor<B, 2, Bool>>) -> Tensor<B, 3> {
        let input = match mask_pad {
            Some(mask) => MhaInput::self_attn(x.clone()).mask_pad(mask),
            None       => MhaInput::self_attn(x.clone()),
        };
        let context = self.attention.forward(input).context;
        let x = self.attention_norm.forward(x + self.dropout.forward(context));

        let hidden = self.output.forward(gelu(self.intermediate.forward(x.clone())));
        self.output_norm.forward(x + self.dropout.forward(hidden))
    }
}

#[derive(Module, Debug)]
pub struct ContextualEncoder<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub segment_embedding:  Embedding<B>,
    pub embed_norm:         LayerNorm<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub dropout:            Dropout,
    pub max_seq_len:        usize,
}

impl<B: Backend> ContextualEncoder<B> {
    /// input_ids, segment_ids: [batch, seq_len] → hidden: [batch, seq_len, d_model]
    ///
    /// `mask_pad` marks padded positions with `true`; they are never
    /// attended to.
    pub fn forward(
        &self,
        input_ids:   Tensor<B, 2, Int>,
        segment_ids: Tensor<B, 2, Int>,
        mask_pad:    Option<Tensor<B, 2, Bool>>,
    ) -> Result<Tensor<B, 3>> {
        let [batch_size, seq_len] = input_ids.dims();
        if seq_len > self.max_seq_len {
            return Err(EmbedError::DimensionMismatch {
                what:     "sequence length",
                expected: self.max_seq_len,
                actual:   seq_len,
            });
        }
        if segment_ids.dims() != [batch_size, seq_len] {
            return Err(EmbedError::config("segment_ids must have the shape of input_ids"));
        }
        if let Some(mask) = &mask_pad {
            if mask.dims() != [batch_size, seq_len] {
                return Err(EmbedError::config("mask_pad must have the shape of input_ids"));
            }
        }

        let tok_emb = self.token_embedding.forward(input_ids);
        let seg_emb = self.segment_embedding.forward(segment_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let mut x = self.dropout.forward(self.embed_norm.forward(tok_emb + pos_emb + seg_emb));
        for layer in &self.layers {
            x = layer.forward(x, mask_pad.clone());
        }
        Ok(x)
    }

    /// Restore weights from a Burn named-MessagePack record.
    pub fn load_weights(self, path: &Path, device: &B::Device) -> Result<Self> {
        let record = NamedMpkFileRecorder::<FullPrecisionSettings>::new()
            .load(path.to_path_buf(), device)
            .map_err(|e| EmbedError::Serialization(format!("'{}': {e}", path.display())))?;
        Ok(self.load_record(record))
    }

    pub fn save_weights(&self, path: &Path) -> Result<()> {
        NamedMpkFileRecorder::<FullPrecisionSettings>::new()
            .record(self.clone().into_record(), path.to_path_buf())
            .map_err(|e| EmbedError::Serialization(format!("'{}': {e}", path.display())))
    }
}

/// Average the hidden states over the sequence axis, skipping the
/// positions `mask_pad` marks as padding.
pub fn mean_pool<B: Backend>(hidden: Tensor<B, 3>, mask_pad: Option<Tensor<B, 2, Bool>>) -> Tensor<B, 2> {
    let [batch_size, _, d_model] = hidden.dims();
    let Some(mask) = mask_pad else {
        return hidden.mean_dim(1).reshape([batch_size, d_model]);
    };

    // [batch, seq_len, 1]: 1.0 on real tokens, 0.0 on padding.
    let keep = mask.bool_not().float().unsqueeze_dim::<3>(2);
    let counts = keep.clone().sum_dim(1).clamp_min(1.0);
    (hidden * keep).sum_dim(1).div(counts).reshape([batch_size, d_model])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny() -> ContextualEncoderConfig {
        ContextualEncoderConfig::new(50)
            .with_max_seq_len(8)
            .with_d_model(16)
            .with_num_heads(2)
            .with_num_layers(1)
            .with_d_ff(32)
    }

    fn ids(values: &[i32]) -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints(values, &Default::default()).unsqueeze::<2>()
    }

    #[test]
    fn test_hidden_and_pooled_shapes() {
        let model: ContextualEncoder<TestBackend> = tiny().init(&Default::default());
        let hidden = model.forward(ids(&[1, 5, 7, 2]), ids(&[1, 1, 1, 1]), None).unwrap();
        assert_eq!(hidden.dims(), [1, 4, 16]);
        assert_eq!(mean_pool(hidden, None).dims(), [1, 16]);
    }

    #[test]
    fn test_too_long_sequence_rejected() {
        let model: ContextualEncoder<TestBackend> = tiny().init(&Default::default());
        let long = [3i32; 9];
        assert!(model.forward(ids(&long), ids(&long), None).is_err());
    }

    #[test]
    fn test_invalid_head_split() {
        assert!(tiny().with_num_heads(3).validate().is_err());
        assert!(tiny().validate().is_ok());
    }

    #[test]
    fn test_weights_round_trip() {
        let dir   = tempfile::tempdir().unwrap();
        let path  = dir.path().join("contextual");
        let device = Default::default();

        let model: ContextualEncoder<TestBackend> = tiny().init(&device);
        model.save_weights(&path).unwrap();
        let restored = tiny().init::<TestBackend>(&device).load_weights(&path, &device).unwrap();

        let a = mean_pool(model.forward(ids(&[1, 4, 2]), ids(&[1, 1, 1]), None).unwrap(), None).into_data();
        let b = mean_pool(restored.forward(ids(&[1, 4, 2]), ids(&[1, 1, 1]), None).unwrap(), None).into_data();
        assert_eq!(a, b);
    }

    #[test]
    fn test_padding_does_not_change_the_pooled_vector() {
        let device = Default::default();
        let model: ContextualEncoder<TestBackend> = tiny().init(&device);

        let alone = mean_pool(model.forward(ids(&[1, 5, 7, 2]), ids(&[1, 1, 1, 1]), None).unwrap(), None);

        let padded_ids = ids(&[1, 5, 7, 2, 0, 0]);
        let mask = Tensor::<TestBackend, 1, Int>::from_ints([0, 0, 0, 0, 1, 1], &device)
            .unsqueeze::<2>()
            .equal_elem(1);
        let hidden = model.forward(padded_ids, ids(&[1, 1, 1, 1, 1, 1]), Some(mask.clone())).unwrap();
        let padded = mean_pool(hidden, Some(mask));

        let a = alone.into_data().to_vec::<f32>().unwrap();
        let b = padded.into_data().to_vec::<f32>().unwrap();
        assert!(a.iter().zip(&b).all(|(x, y)| (x - y).abs() < 1e-5), "{a:?} vs {b:?}");
    }

    #[test]
    fn test_mismatched_mask_rejected() {
        let device = Default::default();
        let model: ContextualEncoder<TestBackend> = tiny().init(&device);
        let mask = Tensor::<TestBackend, 1, Int>::from_ints([0, 0], &device)
            .unsqueeze::<2>()
            .equal_elem(1);
        assert!(model.forward(ids(&[1, 5, 2]), ids(&[1, 1, 1]), Some(mask)).is_err());
    }
}
