// ============================================================
// Text Embedding Layer
// ============================================================
// Turns free-text catalog fields into fixed-length vectors that
// can sit next to (or be fed into) the autoencoder features.
//
//   bow.rs        — presence indicators over a vocabulary built
//                   with the shared TextAnalyzer
//   tfidf.rs      — corpus-fitted TF-IDF, L2-normalised rows
//   contextual.rs — mean-pooled transformer hidden states
//
// TextEmbedder owns exactly one of them, chosen by an
// EmbeddingModel. Each embedder carries its own state; nothing
// is shared between instances.

/// Bag-of-words vocabulary and embedder
pub mod bow;

/// TF-IDF vectorizer
pub mod tfidf;

/// Transformer sentence embeddings
pub mod contextual;

use std::path::Path;

use burn::prelude::Backend;
use tokenizers::Tokenizer;

use crate::data::preprocessor::TextAnalyzer;
use crate::domain::{embedding_model::EmbeddingModel, traits::TextEmbedding};
use crate::error::Result;
use crate::ml::contextual::ContextualEncoderConfig;

use bow::{BowEmbedder, Vocabulary};
use contextual::ContextualEmbedder;
use tfidf::TfIdfVectorizer;

/// One selected text-embedding strategy.
pub enum TextEmbedder<B: Backend> {
    Bow(BowEmbedder),
    TfIdf(TfIdfVectorizer),
    Bert(ContextualEmbedder<B>),
}

impl<B: Backend> TextEmbedder<B> {
    /// Bag-of-words with a vocabulary built from `corpus`.
    pub fn bow<S: AsRef<str>>(corpus: &[S]) -> Self {
        Self::Bow(BowEmbedder::new(Vocabulary::build(corpus, &TextAnalyzer::new())))
    }

    pub fn tf_idf<S: AsRef<str>>(corpus: &[S]) -> Result<Self> {
        Ok(Self::TfIdf(TfIdfVectorizer::fit(corpus)?))
    }

    pub fn bert(
        tokenizer: Tokenizer,
        config:    ContextualEncoderConfig,
        weights:   Option<&Path>,
        device:    &B::Device,
    ) -> Result<Self> {
        Ok(Self::Bert(ContextualEmbedder::new(tokenizer, config, weights, device)?))
    }

    pub fn model(&self) -> EmbeddingModel {
        match self {
            Self::Bow(_)   => EmbeddingModel::Bow,
            Self::TfIdf(_) => EmbeddingModel::TfIdf,
            Self::Bert(_)  => EmbeddingModel::Bert,
        }
    }

    fn inner(&self) -> &dyn TextEmbedding {
        match self {
            Self::Bow(e)   => e,
            Self::TfIdf(e) => e,
            Self::Bert(e)  => e,
        }
    }
}

impl<B: Backend> TextEmbedding for TextEmbedder<B> {
    fn dimension(&self) -> usize {
        self.inner().dimension()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.inner().embed(text)
    }
}
