// ============================================================
// Layer 2 — EmbedUseCase
// ============================================================
// Embeds one piece of text with the selected strategy:
//
//   bow    → vocabulary built from the corpus file
//   tf-idf → vectorizer fitted on the corpus file
//   bert   → tokenizer from --tokenizer-dir (built from the
//            corpus when absent) + transformer weights
//
// The corpus file holds one document per line.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::domain::{embedding_model::EmbeddingModel, traits::TextEmbedding};
use crate::embedding::TextEmbedder;
use crate::infra::tokenizer_store::TokenizerStore;
use crate::ml::{contextual::ContextualEncoderConfig, Device, InferBackend};

#[derive(Debug, Clone)]
pub struct EmbedRequest {
    pub model:         EmbeddingModel,
    pub text:          String,
    pub corpus_path:   PathBuf,
    pub tokenizer_dir: PathBuf,
    pub weights:       Option<PathBuf>,
    pub vocab_size:    usize,
    pub d_model:       usize,
    pub num_heads:     usize,
    pub num_layers:    usize,
    pub max_seq_len:   usize,
}

pub struct EmbedUseCase {
    request: EmbedRequest,
}

impl EmbedUseCase {
    pub fn new(request: EmbedRequest) -> Self {
        Self { request }
    }

    pub fn execute(&self) -> Result<Vec<f32>> {
        let embedder = self.build()?;
        let vector = embedder
            .embed(&self.request.text)
            .with_context(|| format!("Cannot embed text with '{}'", self.request.model))?;
        tracing::info!("{} embedding with {} dimensions", embedder.model(), vector.len());
        Ok(vector)
    }

    fn build(&self) -> Result<TextEmbedder<InferBackend>> {
        let req = &self.request;
        let corpus = read_corpus(&req.corpus_path)?;

        let embedder = match req.model {
            EmbeddingModel::Bow   => TextEmbedder::bow(&corpus),
            EmbeddingModel::TfIdf => TextEmbedder::tf_idf(&corpus)?,
            EmbeddingModel::Bert  => {
                let tokenizer = TokenizerStore::new(&req.tokenizer_dir)
                    .load_or_build(&corpus, req.vocab_size)?;
                let config = ContextualEncoderConfig::new(req.vocab_size)
                    .with_d_model(req.d_model)
                    .with_num_heads(req.num_heads)
                    .with_num_layers(req.num_layers)
                    .with_max_seq_len(req.max_seq_len)
                    .with_d_ff(req.d_model * 4);
                TextEmbedder::bert(tokenizer, config, req.weights.as_deref(), &Device::default())?
            }
        };
        Ok(embedder)
    }
}

fn read_corpus(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read corpus '{}'", path.display()))?;
    let docs: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    tracing::debug!("Read {} corpus documents", docs.len());
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(dir: &std::path::Path, model: EmbeddingModel) -> EmbedRequest {
        let corpus = dir.join("corpus.txt");
        fs::write(&corpus, "Robots in space\nA quiet love story\n\nSci-fi comedy of the 1980s\n").unwrap();
        EmbedRequest {
            model,
            text:          "robots and love".to_string(),
            corpus_path:   corpus,
            tokenizer_dir: dir.join("tokenizer"),
            weights:       None,
            vocab_size:    512,
            d_model:       16,
            num_heads:     2,
            num_layers:    1,
            max_seq_len:   32,
        }
    }

    #[test]
    fn test_bow_from_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let v = EmbedUseCase::new(request(dir.path(), EmbeddingModel::Bow)).execute().unwrap();
        assert_eq!(v.iter().sum::<f32>(), 2.0);
    }

    #[test]
    fn test_tf_idf_from_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let v = EmbedUseCase::new(request(dir.path(), EmbeddingModel::TfIdf)).execute().unwrap();
        assert!(v.iter().any(|x| *x > 0.0));
    }

    #[test]
    fn test_bert_with_built_tokenizer() {
        let dir = tempfile::tempdir().unwrap();
        let v = EmbedUseCase::new(request(dir.path(), EmbeddingModel::Bert)).execute().unwrap();
        assert_eq!(v.len(), 16);
        assert!(dir.path().join("tokenizer").join("tokenizer.json").exists());
    }

    #[test]
    fn test_missing_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path(), EmbeddingModel::Bow);
        req.corpus_path = dir.path().join("missing.txt");
        assert!(EmbedUseCase::new(req).execute().is_err());
    }
}
