// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case strings the lower layers together for one
// command and reports failures with anyhow context.
//
// Rules for this layer:
//   - No network maths here (Layer 5)
//   - No printing here (Layer 1)
//   - No direct file formats here (Layers 4 and 6)
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Train the autoencoder and export encodings
pub mod train_use_case;

// Encode a feature file with a trained encoder
pub mod encode_use_case;

// Embed free text with bow / tf-idf / bert
pub mod embed_use_case;
