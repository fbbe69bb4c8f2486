// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits so the
// corpus source and the classifier can be swapped without
// touching the pipeline.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::document::{NewsDocument, Subset};

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can load a labelled corpus subset.
///
/// Implementations:
///   - Text20News → the 20 Newsgroups "bydate" directory tree
pub trait CorpusSource {
    /// Load every document of `subset`.
    /// Returns the documents and the ordered class names their labels index.
    fn load_subset(&self, subset: Subset) -> Result<(Vec<NewsDocument>, Vec<String>)>;
}

// ─── TextClassifier ───────────────────────────────────────────────────────────
/// Outcome of classifying one piece of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub label:      usize,
    pub class_name: String,
    /// Softmax probability of the predicted class
    pub confidence: f32,
}

/// Any component that can assign a class to free text.
///
/// Implementations:
///   - Inferencer → a trained TextCnn restored from a run directory
pub trait TextClassifier {
    fn classify(&self, text: &str) -> Result<Prediction>;
}
