// ============================================================
// Layer 4 — Vocabulary Processor
// ============================================================
// Maps documents to fixed-length sequences of vocabulary indices,
// the input format of the convolutional classifier.
//
//   "the rocket reached orbit"  →  [1, 2, 3, 4, 0, 0, ..., 0]
//
// Index 0 is reserved for <UNK>. It doubles as the padding index,
// so unknown words and padding share one (trainable) embedding.
// Indices are assigned in first-seen order while fitting.

use regex::Regex;
use std::collections::HashMap;

pub const UNK_TOKEN: &str = "<UNK>";
pub const UNK_ID: u32 = 0;

pub struct VocabularyProcessor {
    max_document_length: usize,
    /// token → index, always contains <UNK> → 0
    vocab:               HashMap<String, u32>,
    token_pattern:       Regex,
}

impl VocabularyProcessor {
    pub fn new(max_document_length: usize) -> Self {
        let mut vocab = HashMap::new();
        vocab.insert(UNK_TOKEN.to_string(), UNK_ID);
        Self::from_parts(max_document_length, vocab)
    }

    /// Rebuild a processor from a previously saved vocabulary.
    pub fn from_parts(max_document_length: usize, mut vocab: HashMap<String, u32>) -> Self {
        vocab.insert(UNK_TOKEN.to_string(), UNK_ID);
        Self {
            max_document_length,
            vocab,
            token_pattern: Regex::new(r"[\w'\-]+").expect("valid token pattern"),
        }
    }

    /// Longest document, in `' '`-separated pieces, over all given sets.
    pub fn max_document_length<S: AsRef<str>>(docs: &[&[S]]) -> usize {
        docs.iter()
            .flat_map(|set| set.iter())
            .map(|d| d.as_ref().split(' ').count())
            .max()
            .unwrap_or(0)
    }

    pub fn sequence_length(&self) -> usize {
        self.max_document_length
    }

    /// Number of entries including <UNK>
    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocab.len() <= 1
    }

    pub fn vocabulary(&self) -> &HashMap<String, u32> {
        &self.vocab
    }

    pub fn get(&self, token: &str) -> Option<u32> {
        self.vocab.get(token).copied()
    }

    fn tokens<'a>(&'a self, doc: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.token_pattern.find_iter(doc).map(|m| m.as_str())
    }

    /// Add every unseen token of `docs` to the vocabulary.
    pub fn fit<S: AsRef<str>>(&mut self, docs: &[S]) {
        let mut next_id = self.vocab.len() as u32;
        for doc in docs {
            let tokens: Vec<String> = self.tokens(doc.as_ref()).map(str::to_string).collect();
            for token in tokens {
                self.vocab.entry(token).or_insert_with(|| {
                    next_id += 1;
                    next_id - 1
                });
            }
        }
        tracing::debug!("Vocabulary fitted: {} entries", self.vocab.len());
    }

    /// Convert one document into exactly `sequence_length()` indices.
    pub fn transform_one(&self, doc: &str) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .tokens(doc)
            .take(self.max_document_length)
            .map(|t| self.get(t).unwrap_or(UNK_ID))
            .collect();
        ids.resize(self.max_document_length, UNK_ID);
        ids
    }

    pub fn transform<S: AsRef<str>>(&self, docs: &[S]) -> Vec<Vec<u32>> {
        docs.iter().map(|d| self.transform_one(d.as_ref())).collect()
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, docs: &[S]) -> Vec<Vec<u32>> {
        self.fit(docs);
        self.transform(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unk_is_index_zero() {
        let vp = VocabularyProcessor::new(4);
        assert_eq!(vp.get(UNK_TOKEN), Some(0));
        assert!(vp.is_empty());
    }

    #[test]
    fn test_first_seen_order() {
        let mut vp = VocabularyProcessor::new(5);
        let rows   = vp.fit_transform(&["b a b", "c a"]);
        assert_eq!(rows[0], vec![1, 2, 1, 0, 0]);
        assert_eq!(rows[1], vec![3, 2, 0, 0, 0]);
        assert_eq!(vp.len(), 4);
    }

    #[test]
    fn test_transform_maps_unknown_and_truncates() {
        let mut vp = VocabularyProcessor::new(3);
        vp.fit(&["alpha beta"]);
        assert_eq!(vp.transform_one("beta gamma alpha beta"), vec![2, 0, 1]);
    }

    #[test]
    fn test_every_row_has_fixed_length() {
        let mut vp = VocabularyProcessor::new(6);
        let rows   = vp.fit_transform(&["", "one", "one two three four five six seven"]);
        assert!(rows.iter().all(|r| r.len() == 6));
    }

    #[test]
    fn test_max_document_length_spans_sets() {
        let train = vec!["a b".to_string(), "a b c".to_string()];
        let test  = vec!["a b c d".to_string()];
        assert_eq!(VocabularyProcessor::max_document_length(&[train.as_slice(), test.as_slice()]), 4);
    }

    #[test]
    fn test_from_parts_restores_mapping() {
        let mut vp = VocabularyProcessor::new(2);
        vp.fit(&["x y"]);
        let restored = VocabularyProcessor::from_parts(2, vp.vocabulary().clone());
        assert_eq!(restored.transform_one("y x"), vec![2, 1]);
    }
}
