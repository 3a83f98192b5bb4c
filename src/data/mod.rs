// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a CSV file on disk and a tensor batch
// on the training device.
//
// The pipeline flows in this order:
//
//   features.csv
//       │
//       ▼
//   CsvMatrixLoader   → parses numeric rows into a FeatureMatrix
//       │
//       ▼
//   splitter::split   → seeded (validation, training) partition
//       │
//       ▼
//   SampleSource      → implements Burn's Dataset trait
//       │
//       ▼
//   ReconstructionBatcher → stacks samples into [N, F] tensors
//       │
//       ▼
//   DataLoader        → shuffles and feeds batches to the trainer
//
// The preprocessor lives here too: it is the text-side
// counterpart, turning raw fields into tokens for the
// bag-of-words and TF-IDF embedders.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads numeric CSV files into a FeatureMatrix
pub mod loader;

/// Seeded train/validation partitioning of row indices
pub mod splitter;

/// Implements Burn's Dataset trait for reconstruction samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Cleans and tokenises free text for the sparse embedders
pub mod preprocessor;
