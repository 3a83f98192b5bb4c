// ============================================================
// Layer 3 — Text Embedding Model Selector
// ============================================================
// Names the three text-embedding strategies. Parsed from the
// same strings callers have always used: "bow", "tf-idf", "bert".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EmbedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbeddingModel {
    /// Vocabulary presence indicators
    #[serde(rename = "bow")]
    Bow,
    /// Corpus-weighted term frequencies
    #[serde(rename = "tf-idf")]
    TfIdf,
    /// Mean-pooled transformer hidden states
    #[serde(rename = "bert")]
    Bert,
}

impl EmbeddingModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bow   => "bow",
            Self::TfIdf => "tf-idf",
            Self::Bert  => "bert",
        }
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingModel {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bow"                     => Ok(Self::Bow),
            "tf-idf" | "tfidf"        => Ok(Self::TfIdf),
            "bert"                    => Ok(Self::Bert),
            other => Err(EmbedError::config(format!(
                "unknown embedding model '{other}' (expected bow, tf-idf or bert)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!("bow".parse::<EmbeddingModel>().unwrap(), EmbeddingModel::Bow);
        assert_eq!("TF-IDF".parse::<EmbeddingModel>().unwrap(), EmbeddingModel::TfIdf);
        assert_eq!("bert".parse::<EmbeddingModel>().unwrap(), EmbeddingModel::Bert);
    }

    #[test]
    fn test_unknown_name_is_configuration_error() {
        let err = "word2vec".parse::<EmbeddingModel>().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_display_round_trips() {
        for m in [EmbeddingModel::Bow, EmbeddingModel::TfIdf, EmbeddingModel::Bert] {
            assert_eq!(m.to_string().parse::<EmbeddingModel>().unwrap(), m);
        }
    }
}
