// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All tensor code lives here and in the burn adapters of the
// data layer (dataset.rs, batcher.rs).
//
//   backend.rs    — WGPU / NdArray backend aliases and devices
//
//   model.rs      — TextCnn: embedding, one convolution + max-pool
//                   per filter height, dropout, linear output,
//                   cross-entropy with L2 on the output layer
//
//   trainer.rs    — step loop with Adam, periodic evaluation on
//                   the test set, gradient summaries and
//                   checkpointing
//
//   inferencer.rs — restores a run and classifies free text
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Kim (2014) Convolutional Neural Networks for Sentence Classification

/// Backend aliases and device selection
pub mod backend;

/// TextCnn model architecture
pub mod model;

/// Training loop with evaluation and checkpointing
pub mod trainer;

/// Inference engine: loads a run and classifies text
pub mod inferencer;
