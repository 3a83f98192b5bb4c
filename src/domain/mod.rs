// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe what the system works with.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// The immutable numeric table the autoencoder trains on
pub mod feature_matrix;

// Paired train/validation loss records
pub mod loss_history;

// Selector for bow / tf-idf / bert text embeddings
pub mod embedding_model;

// Core abstractions (traits) that other layers implement
pub mod traits;
