// ============================================================
// Bag-of-Words Embedder
// ============================================================
// Presence indicators over a fixed vocabulary:
//
//   vocabulary  {"1990s": 0, "robot": 1, "scifi": 2}
//   text        "Sci-Fi robots of the 1990s"
//   tokens      ["scifi", "robot", "1990s"]
//   vector      [1, 1, 1]
//
// Tokens come from the shared TextAnalyzer, so the vocabulary
// must be built with the same analyzer. Lookup is a hash map;
// tokens outside the vocabulary are ignored.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::data::preprocessor::TextAnalyzer;
use crate::domain::traits::TextEmbedding;
use crate::error::{EmbedError, Result};

/// token → column index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Use a caller-supplied mapping. Indices must be exactly 0..len.
    pub fn from_map(index: HashMap<String, usize>) -> Result<Self> {
        let mut seen = vec![false; index.len()];
        for (token, &i) in &index {
            match seen.get_mut(i) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(EmbedError::config(format!(
                        "vocabulary index {i} for '{token}' is out of range or duplicated"
                    )))
                }
            }
        }
        Ok(Self { index })
    }

    /// Analyse every document and number the distinct tokens in
    /// sorted order, so the same corpus always yields the same map.
    pub fn build<S: AsRef<str>>(corpus: &[S], analyzer: &TextAnalyzer) -> Self {
        let tokens: BTreeSet<String> = corpus
            .iter()
            .flat_map(|doc| analyzer.analyze(doc.as_ref()))
            .collect();

        let index = tokens.into_iter().enumerate().map(|(i, t)| (t, i)).collect();
        Self { index }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }
}

pub struct BowEmbedder {
    vocabulary: Vocabulary,
    analyzer:   TextAnalyzer,
}

impl BowEmbedder {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary, analyzer: TextAnalyzer::new() }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// One presence vector for several fields of the same record.
    pub fn embed_fields<S: AsRef<str>>(&self, fields: &[S]) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.vocabulary.len()];
        for field in fields {
            for token in self.analyzer.analyze(field.as_ref()) {
                if let Some(i) = self.vocabulary.get(&token) {
                    vector[i] = 1.0;
                }
            }
        }
        vector
    }
}

impl TextEmbedding for BowEmbedder {
    fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_fields(&[text]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder() -> BowEmbedder {
        let corpus = ["Robots in space", "A sci-fi comedy from the 1980s"];
        BowEmbedder::new(Vocabulary::build(&corpus, &TextAnalyzer::new()))
    }

    #[test]
    fn test_vocabulary_is_sorted_and_dense() {
        let bow = embedder();
        let v = bow.vocabulary();
        assert_eq!(v.get("1980s"), Some(0));
        assert!(v.get(&TextAnalyzer::new().normalize_token("scifi")).is_some());
        assert!(v.get("the").is_none());
        assert_eq!(bow.dimension(), v.len());
    }

    #[test]
    fn test_presence_indicators() {
        let bow = embedder();
        let vector = bow.embed("space robots of the 1980s").unwrap();

        assert_eq!(vector.iter().filter(|v| **v == 1.0).count(), 3);
        assert_eq!(vector[0], 1.0);
        // Repeats do not count twice.
        assert_eq!(bow.embed("robot robot robot").unwrap().iter().sum::<f32>(), 1.0);
    }

    #[test]
    fn test_unknown_tokens_ignored() {
        let vector = embedder().embed("completely unrelated words").unwrap();
        assert!(vector.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_fields_are_merged() {
        let bow = embedder();
        let merged = bow.embed_fields(&["Robots", "comedy"]);
        assert_eq!(merged.iter().sum::<f32>(), 2.0);
    }

    #[test]
    fn test_from_map_rejects_gaps() {
        let ok: HashMap<String, usize> = [("a".to_string(), 0), ("b".to_string(), 1)].into();
        assert_eq!(Vocabulary::from_map(ok).unwrap().len(), 2);

        let gap: HashMap<String, usize> = [("a".to_string(), 0), ("b".to_string(), 5)].into();
        assert!(Vocabulary::from_map(gap).is_err());
    }
}
