// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Persists the fitted vocabulary as a HuggingFace tokenizer JSON
// (WordLevel model, whitespace pre-tokenizer) so the same file can
// be opened with the `tokenizers` crate or any other HF tooling.
//
// The sequence length is not part of the tokenizer file; it is
// recorded in the model config of the run.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokenizers::Tokenizer;

use crate::data::vocab::{VocabularyProcessor, UNK_ID, UNK_TOKEN};

pub struct VocabStore {
    path: PathBuf,
}

impl VocabStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn save(&self, processor: &VocabularyProcessor) -> Result<()> {
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": UNK_ID, "content": UNK_TOKEN, "single_word": false, "lstrip": false,
                 "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": null,
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": processor.vocabulary(),
                "unk_token": UNK_TOKEN
            }
        });

        std::fs::write(&self.path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write vocabulary to '{}'", self.path.display()))?;

        tracing::info!(
            "Vocabulary of {} words saved to '{}'",
            processor.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Load the vocabulary back into a processor producing
    /// sequences of `sequence_length` indices.
    pub fn load(&self, sequence_length: usize) -> Result<VocabularyProcessor> {
        let tokenizer = Tokenizer::from_file(&self.path).map_err(|e| {
            anyhow::anyhow!("Cannot load vocabulary from '{}': {}", self.path.display(), e)
        })?;
        Ok(VocabularyProcessor::from_parts(sequence_length, tokenizer.get_vocab(false)))
    }
}
