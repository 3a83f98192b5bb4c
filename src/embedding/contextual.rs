// ============================================================
// Contextual Embedder
// ============================================================
// Sentence → one mean-pooled transformer vector.
//
//   "[CLS] text [SEP]" ─► tokenizer ─► ids (segment id 1 each)
//                      ─► ContextualEncoder (inference backend)
//                      ─► mean over tokens ─► Vec<f32> of d_model
//
// `embed_batch` pads shorter sentences with [PAD] and passes a
// padding mask, so each row matches what `embed` returns alone.
//
// The encoder runs on a non-autodiff backend, so dropout is off
// and the output is deterministic for fixed weights.

use std::path::Path;

use burn::prelude::*;
use tokenizers::Tokenizer;

use crate::domain::traits::TextEmbedding;
use crate::error::{EmbedError, Result};
use crate::ml::contextual::{mean_pool, ContextualEncoder, ContextualEncoderConfig};

const CLS: &str = "[CLS]";
const SEP: &str = "[SEP]";
const PAD: &str = "[PAD]";
const SEGMENT_ID: i32 = 1;

pub struct ContextualEmbedder<B: Backend> {
    model:     ContextualEncoder<B>,
    tokenizer: Tokenizer,
    config:    ContextualEncoderConfig,
    device:    B::Device,
    cls_id:    u32,
    sep_id:    u32,
    pad_id:    u32,
}

impl<B: Backend> ContextualEmbedder<B> {
    /// Build the encoder from `config`, restoring weights from a Burn
    /// record when `weights` is given.
    pub fn new(
        tokenizer: Tokenizer,
        config:    ContextualEncoderConfig,
        weights:   Option<&Path>,
        device:    &B::Device,
    ) -> Result<Self> {
        config.validate()?;
        let cls_id = special_id(&tokenizer, CLS)?;
        let sep_id = special_id(&tokenizer, SEP)?;
        let pad_id = special_id(&tokenizer, PAD)?;

        let largest = cls_id.max(sep_id).max(pad_id) as usize;
        let tokenizer_span = tokenizer
            .get_vocab(true)
            .values()
            .max()
            .map(|id| *id as usize + 1)
            .unwrap_or(0)
            .max(largest + 1);
        if tokenizer_span > config.vocab_size {
            return Err(EmbedError::DimensionMismatch {
                what:     "contextual vocab_size",
                expected: tokenizer_span,
                actual:   config.vocab_size,
            });
        }

        let model = config.init::<B>(device);
        let model = match weights {
            Some(path) => {
                tracing::info!("Loading contextual encoder weights from '{}'", path.display());
                model.load_weights(path, device)?
            }
            None => {
                tracing::warn!("No contextual encoder weights given, using a fresh initialisation");
                model
            }
        };

        Ok(Self { model, tokenizer, config, device: device.clone(), cls_id, sep_id, pad_id })
    }

    /// `[CLS] text [SEP]`, truncated so the whole thing fits max_seq_len.
    pub fn token_ids(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| EmbedError::Tokenizer(e.to_string()))?;

        let budget = self.config.max_seq_len - 2;
        let mut ids = Vec::with_capacity(budget + 2);
        ids.push(self.cls_id);
        ids.extend(encoding.get_ids().iter().take(budget).copied());
        ids.push(self.sep_id);
        Ok(ids)
    }

    /// Embed several texts in one forward pass. Returns one vector per
    /// text, in input order.
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let sequences = texts
            .iter()
            .map(|text| self.token_ids(text))
            .collect::<Result<Vec<_>>>()?;
        let batch_size = sequences.len();
        let seq_len = sequences.iter().map(Vec::len).max().unwrap_or(0);

        let mut ids = Vec::with_capacity(batch_size * seq_len);
        let mut padding = Vec::with_capacity(batch_size * seq_len);
        for seq in &sequences {
            ids.extend(seq.iter().map(|&id| id as i32));
            ids.extend(std::iter::repeat(self.pad_id as i32).take(seq_len - seq.len()));
            padding.extend(std::iter::repeat(0i32).take(seq.len()));
            padding.extend(std::iter::repeat(1i32).take(seq_len - seq.len()));
        }
        let segments = vec![SEGMENT_ID; ids.len()];

        let input_ids = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let segment_ids = Tensor::<B, 1, Int>::from_ints(segments.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let mask_pad = Tensor::<B, 1, Int>::from_ints(padding.as_slice(), &self.device)
            .reshape([batch_size, seq_len])
            .equal_elem(1);

        let hidden = self.model.forward(input_ids, segment_ids, Some(mask_pad.clone()))?;
        let flat = mean_pool(hidden, Some(mask_pad))
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| EmbedError::Tensor(format!("{e:?}")))?;

        tracing::debug!("Embedded {} texts padded to {} tokens", batch_size, seq_len);
        Ok(flat.chunks(self.config.d_model).map(<[f32]>::to_vec).collect())
    }
}

fn special_id(tokenizer: &Tokenizer, token: &str) -> Result<u32> {
    tokenizer
        .token_to_id(token)
        .ok_or_else(|| EmbedError::Tokenizer(format!("tokenizer has no {token} token")))
}

impl<B: Backend> TextEmbedding for ContextualEmbedder<B> {
    fn dimension(&self) -> usize {
        self.config.d_model
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let ids: Vec<i32> = self.token_ids(text)?.into_iter().map(|id| id as i32).collect();
        let segments = vec![SEGMENT_ID; ids.len()];

        let input_ids   = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device).unsqueeze::<2>();
        let segment_ids = Tensor::<B, 1, Int>::from_ints(segments.as_slice(), &self.device).unsqueeze::<2>();

        let hidden = self.model.forward(input_ids, segment_ids, None)?;
        mean_pool(hidden, None)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| EmbedError::Tensor(format!("{e:?}")))
    }
}
