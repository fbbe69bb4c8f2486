// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw corpus tree to tensor batches:
//
//   20news-bydate-*/
//       │
//       ▼
//   Text20News          → reads articles, assigns labels
//       │
//       ▼
//   Corpus              → filters short docs, cleans text,
//       │                 vectorizes, drops encoded images
//       ▼
//   VocabularyProcessor → fixed-length index sequences
//       │
//       ▼
//   TextDataset         → implements Burn's Dataset trait
//       │
//       ▼
//   BatchIter + TextBatcher → shuffled tensor mini-batches
//
// The embedding loader sits beside this chain: it aligns a
// word2vec file with the fitted vocabulary.

/// Loads the 20 Newsgroups directory tree
pub mod loader;

/// Cleans and normalises raw article text
pub mod preprocessor;

/// Corpus filtering and term-document vectorization
pub mod corpus;

/// Token → index mapping with fixed-length output
pub mod vocab;

/// word2vec loading aligned to the vocabulary
pub mod embeddings;

/// Implements Burn's Dataset trait for vectorized documents
pub mod dataset;

/// Epoch batch iteration and Burn's Batcher implementation
pub mod batcher;
