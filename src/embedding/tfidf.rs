// ============================================================
// TF-IDF Vectorizer
// ============================================================
// Corpus-weighted term frequencies, unigram only.
//
// Fit:
//   1. Lowercase each document and pull tokens of two or more
//      word characters (\b\w\w+\b)
//   2. Drop English stop words
//   3. Document frequency df(t) = number of documents with t;
//      keep t when df(t) ≥ min_df × n_documents
//   4. Vocabulary = surviving terms in alphabetical order
//   5. idf(t) = ln((1 + n) / (1 + df(t))) + 1
//
// Transform:
//   count(t) × idf(t) for every vocabulary term, then scale the
//   row to unit L2 norm (all-zero rows stay zero).
//
// Reference: Salton & Buckley (1988) Term-weighting approaches
//            in automatic text retrieval

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::data::preprocessor::is_stop_word;
use crate::domain::traits::TextEmbedding;
use crate::error::{EmbedError, Result};

pub const DEFAULT_MIN_DF: f64 = 0.0001;

static TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("term pattern is valid"));

fn terms(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TERM.find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    min_df:     f64,
    vocabulary: HashMap<String, usize>,
    idf:        Vec<f32>,
}

impl TfIdfVectorizer {
    /// Fit on `corpus` with the default `min_df`.
    pub fn fit<S: AsRef<str>>(corpus: &[S]) -> Result<Self> {
        Self::fit_with_min_df(corpus, DEFAULT_MIN_DF)
    }

    /// `min_df` is a proportion of documents in [0, 1].
    pub fn fit_with_min_df<S: AsRef<str>>(corpus: &[S], min_df: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&min_df) {
            return Err(EmbedError::config(format!("min_df must be in [0, 1], got {min_df}")));
        }
        if corpus.is_empty() {
            return Err(EmbedError::config("cannot fit TF-IDF on an empty corpus"));
        }

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for doc in corpus {
            let unique: BTreeSet<String> = terms(doc.as_ref()).into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let n = corpus.len() as f64;
        let min_count = min_df * n;

        let mut vocabulary = HashMap::new();
        let mut idf = Vec::new();
        // BTreeMap iteration is alphabetical, which fixes the column order.
        for (term, df) in document_frequency.into_iter().filter(|(_, df)| *df as f64 >= min_count) {
            vocabulary.insert(term, idf.len());
            idf.push((((1.0 + n) / (1.0 + df as f64)).ln() + 1.0) as f32);
        }

        if vocabulary.is_empty() {
            return Err(EmbedError::config(
                "empty vocabulary: the corpus only contains stop words or short tokens",
            ));
        }
        tracing::debug!("TF-IDF fitted on {} documents, {} terms", corpus.len(), idf.len());
        Ok(Self { min_df, vocabulary, idf })
    }

    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut row = vec![0.0f32; self.idf.len()];
        for term in terms(text) {
            if let Some(&i) = self.vocabulary.get(&term) {
                row[i] += 1.0;
            }
        }
        for (value, idf) in row.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            row.iter_mut().for_each(|v| *v /= norm);
        }
        row
    }

    pub fn fit_transform<S: AsRef<str>>(corpus: &[S]) -> Result<(Self, Vec<Vec<f32>>)> {
        let vectorizer = Self::fit(corpus)?;
        let rows = corpus.iter().map(|doc| vectorizer.transform(doc.as_ref())).collect();
        Ok((vectorizer, rows))
    }

    /// Vocabulary terms in column order.
    pub fn feature_names(&self) -> Vec<&str> {
        let mut names = vec![""; self.idf.len()];
        for (term, &i) in &self.vocabulary {
            names[i] = term.as_str();
        }
        names
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    pub fn min_df(&self) -> f64 {
        self.min_df
    }
}

impl TextEmbedding for TfIdfVectorizer {
    fn dimension(&self) -> usize {
        self.idf.len()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.transform(text))
    }
}
