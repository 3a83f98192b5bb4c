// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Supplies the `tokenizers::Tokenizer` the contextual embedder
// needs.
//
//   - `tokenizer.json` present in the directory → load it
//     (any HuggingFace tokenizer file works, e.g. a BERT
//     WordPiece vocabulary exported by the host)
//   - otherwise → build a word-level tokenizer from a corpus
//     and save it, so later runs reuse the same ids
//
// The built tokenizer keeps BERT's special-token ids:
//   [PAD]=0  [UNK]=1  [CLS]=101  [SEP]=102  [MASK]=103
// and numbers corpus words from 104 upwards, most frequent
// first (ties alphabetical, so a corpus always maps the same).
//
// The JSON is written by hand and loaded with from_file, which
// sidesteps the trainer/ModelWrapper type juggling of
// tokenizers 0.15.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use tokenizers::Tokenizer;

use crate::error::{EmbedError, Result};

pub const TOKENIZER_FILE: &str = "tokenizer.json";

const FIRST_WORD_ID: usize = 104;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Load `tokenizer.json`, or build one from `texts` when missing.
    pub fn load_or_build(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        if self.path().exists() {
            tracing::info!("Loading tokenizer from '{}'", self.path().display());
            self.load()
        } else {
            tracing::info!("Building word-level tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(texts, vocab_size)
        }
    }

    pub fn load(&self) -> Result<Tokenizer> {
        load_file(&self.path())
    }

    fn build_and_save(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        fs::create_dir_all(&self.dir).map_err(|e| EmbedError::io(&self.dir, e))?;

        let words = top_words(texts, vocab_size.saturating_sub(5));

        let mut vocab = serde_json::json!({
            "[PAD]":  0,
            "[UNK]":  1,
            "[CLS]":  101,
            "[SEP]":  102,
            "[MASK]": 103,
        });
        for (offset, word) in words.iter().enumerate() {
            vocab[word.as_str()] = serde_json::json!(FIRST_WORD_ID + offset);
        }

        let special = |id: usize, content: &str| {
            serde_json::json!({
                "id": id, "content": content, "single_word": false, "lstrip": false,
                "rstrip": false, "normalized": false, "special": true
            })
        };
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                special(0, "[PAD]"),
                special(1, "[UNK]"),
                special(101, "[CLS]"),
                special(102, "[SEP]"),
                special(103, "[MASK]"),
            ],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": { "type": "BertPreTokenizer" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let path = self.path();
        let json = serde_json::to_string_pretty(&tokenizer_json)
            .map_err(|e| EmbedError::Serialization(e.to_string()))?;
        fs::write(&path, json).map_err(|e| EmbedError::io(&path, e))?;

        tracing::info!("Tokenizer built with {} words, saved to '{}'", words.len(), path.display());
        load_file(&path)
    }
}

fn load_file(path: &Path) -> Result<Tokenizer> {
    Tokenizer::from_file(path)
        .map_err(|e| EmbedError::Tokenizer(format!("cannot load '{}': {e}", path.display())))
}

/// Lowercased, edge-trimmed words by descending frequency.
fn top_words(texts: &[String], limit: usize) -> Vec<String> {
    let mut freq: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for word in text.split_whitespace() {
            let w = word.to_lowercase();
            let w = w.trim_matches(|c: char| !c.is_alphanumeric());
            if !w.is_empty() && !w.starts_with('[') {
                *freq.entry(w.to_string()).or_insert(0) += 1;
            }
        }
    }

    let mut words: Vec<(String, usize)> = freq.into_iter().collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    words.truncate(limit);
    words.into_iter().map(|(w, _)| w).collect()
}
