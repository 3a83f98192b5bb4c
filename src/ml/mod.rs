// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All network code lives here.
//
//   model.rs      — Encoder and Decoder halves of the autoencoder
//                   (Linear → optional BatchNorm → ReLU → Dropout)
//
//   state.rs      — named parameter maps used by checkpoints;
//                   restores tolerate topology changes
//
//   trainer.rs    — AutoEncoderConfig + AutoEncoder: partition,
//                   two Adam optimisers, train/eval steps, the
//                   reporting loop, encodings and checkpoints
//
//   inferencer.rs — chunked evaluate-mode encoding of a matrix
//
//   contextual.rs — BERT-style transformer used by the `bert`
//                   text embedder
//
// Backends
//   InferBackend is ndarray on the CPU by default, WGPU with the
//   `wgpu` feature. TrainBackend wraps it in Autodiff.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Encoder / Decoder networks
pub mod model;

/// StateDict export and non-strict restore
pub mod state;

/// Autoencoder training loop and outputs
pub mod trainer;

/// Evaluate-mode encoding of feature matrices
pub mod inferencer;

/// Transformer encoder for contextual text embeddings
pub mod contextual;

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

pub type Device = <InferBackend as burn::tensor::backend::Backend>::Device;
