// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the file system on behalf of the
// other layers:
//
//   checkpoint.rs      — encoder/decoder parameter maps and the
//                        run configuration (train_config.json)
//
//   tokenizer_store.rs — loads tokenizer.json or builds a
//                        word-level tokenizer from a corpus
//
//   metrics.rs         — appends loss reports to metrics.csv
//
//   export.rs          — writes matrices (encodings) as CSV
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §12 (I/O and File Handling)

/// Checkpoint files and run configuration
pub mod checkpoint;

/// Tokenizer loading and building
pub mod tokenizer_store;

/// Loss report CSV logger
pub mod metrics;

/// CSV export of encodings
pub mod export;
