// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams the rest of the crate programs against:
//
//   FeatureSource  — anything that yields a FeatureMatrix
//                    (CSV files today, a database later)
//   TextEmbedding  — anything that turns a sentence into a
//                    fixed-length vector (bow, tf-idf, bert)
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::feature_matrix::FeatureMatrix;
use crate::error::Result;

// ─── FeatureSource ────────────────────────────────────────────────────────────
/// Any component that can load a feature matrix.
///
/// Implementations:
///   - CsvMatrixLoader → numeric CSV on disk
pub trait FeatureSource {
    fn load(&self) -> Result<FeatureMatrix>;
}

// ─── TextEmbedding ────────────────────────────────────────────────────────────
/// Any component that maps free text to a vector of fixed length.
///
/// Implementations:
///   - BowEmbedder         → presence indicators over a vocabulary
///   - TfIdfVectorizer     → corpus-weighted term frequencies
///   - ContextualEmbedder  → mean-pooled transformer states
pub trait TextEmbedding {
    /// Length of every vector returned by `embed`.
    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
