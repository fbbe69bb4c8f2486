// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything a run leaves on disk:
//
//   run_dir.rs     — timestamped run folder layout + JSON helpers
//   checkpoint.rs  — model weights via Burn's CompactRecorder,
//                    with bounded retention
//   summary.rs     — per-step loss/accuracy and gradient CSVs
//   vocab_store.rs — vocabulary persisted as a tokenizer JSON

/// Run directory layout
pub mod run_dir;

/// Model checkpoint saving, retention and loading
pub mod checkpoint;

/// Training and evaluation summary CSV writers
pub mod summary;

/// Vocabulary saving and loading
pub mod vocab_store;
