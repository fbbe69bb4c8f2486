// ============================================================
// Layer 4 — Corpus
// ============================================================
// An in-memory labelled corpus plus the operations used to
// filter it before training:
//
//   remove_short_documents → drop articles with too few words
//   clean_text             → normalise every article
//   vectorize              → term-document count matrix
//   remove_encoded_images  → drop uuencoded attachments
//
// Documents, labels and matrix rows always stay aligned:
// every removal goes through keep_documents().

use anyhow::Result;
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::data::preprocessor::Preprocessor;
use crate::domain::document::{NewsDocument, Subset};
use crate::domain::traits::CorpusSource;

/// Term whose frequency betrays a uuencoded image in an article
const ENCODED_IMAGE_TERM: &str = "ax";

/// How to count words in `remove_short_documents`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabScope {
    /// Whitespace-separated words of the raw text
    Full,
    /// Counted terms of the vectorized vocabulary
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopWords {
    English,
    None,
}

/// One sparse row of the term-document matrix: term index → count
pub type TermCounts = HashMap<usize, u32>;

#[derive(Debug)]
pub struct Corpus {
    pub documents:   Vec<NewsDocument>,
    pub class_names: Vec<String>,
    /// Term vocabulary of the last `vectorize` call, sorted
    pub vocab:       Vec<String>,
    /// Term-document matrix, one row per document (empty until vectorized)
    data:            Vec<TermCounts>,
}

impl Corpus {
    pub fn new(documents: Vec<NewsDocument>, class_names: Vec<String>) -> Self {
        Self { documents, class_names, vocab: Vec::new(), data: Vec::new() }
    }

    /// Load one subset from any corpus source.
    pub fn load(source: &impl CorpusSource, subset: Subset) -> Result<Self> {
        let (documents, class_names) = source.load_subset(subset)?;
        Ok(Self::new(documents, class_names))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn texts(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.text.clone()).collect()
    }

    pub fn labels(&self) -> Vec<usize> {
        self.documents.iter().map(|d| d.label).collect()
    }

    pub fn is_vectorized(&self) -> bool {
        self.data.len() == self.documents.len() && !self.vocab.is_empty()
    }

    /// Term-document row of one document
    pub fn term_counts(&self, index: usize) -> Option<&TermCounts> {
        self.data.get(index)
    }

    /// Keep only the documents at `indices` (in that order).
    pub fn keep_documents(&mut self, indices: &[usize]) {
        let vectorized = self.is_vectorized();
        self.documents = indices.iter().map(|&i| self.documents[i].clone()).collect();
        if vectorized {
            self.data = indices.iter().map(|&i| self.data[i].clone()).collect();
        }
    }

    /// Remove documents with fewer than `nwords` words.
    pub fn remove_short_documents(&mut self, nwords: usize, scope: VocabScope) -> Result<()> {
        let counts: Vec<usize> = match scope {
            VocabScope::Full => self.documents.iter().map(NewsDocument::word_count).collect(),
            VocabScope::Selected => {
                if !self.is_vectorized() {
                    anyhow::bail!("Counting selected words requires vectorize() first");
                }
                self.data
                    .iter()
                    .map(|row| row.values().map(|&c| c as usize).sum())
                    .collect()
            }
        };

        let keep: Vec<usize> = counts
            .iter()
            .enumerate()
            .filter(|(_, &wc)| wc >= nwords)
            .map(|(i, _)| i)
            .collect();

        let before = self.len();
        self.keep_documents(&keep);
        tracing::info!(
            "Removed {} documents shorter than {} words ({} left)",
            before - self.len(), nwords, self.len()
        );
        Ok(())
    }

    /// Normalise the text of every document in place.
    pub fn clean_text(&mut self) {
        let preprocessor = Preprocessor::new();
        for doc in &mut self.documents {
            doc.text = preprocessor.clean(&doc.text);
        }
    }

    /// Build the term-document count matrix.
    ///
    /// Without `vocabulary`, the vocabulary is the sorted set of every
    /// term left after stop-word removal. With one, only its terms
    /// are counted and it becomes this corpus' vocabulary.
    pub fn vectorize(&mut self, stop_words: StopWords, vocabulary: Option<&[String]>) {
        let terms = Regex::new(r"\b\w\w+\b").expect("valid term pattern");
        let stop: HashSet<&str> = match stop_words {
            StopWords::English => ENGLISH_STOP_WORDS.iter().copied().collect(),
            StopWords::None    => HashSet::new(),
        };

        let tokenized: Vec<Vec<String>> = self
            .documents
            .iter()
            .map(|d| {
                terms
                    .find_iter(&d.text.to_lowercase())
                    .map(|m| m.as_str().to_string())
                    .filter(|t| !stop.contains(t.as_str()))
                    .collect()
            })
            .collect();

        self.vocab = match vocabulary {
            Some(v) => v.to_vec(),
            None => tokenized
                .iter()
                .flatten()
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        };

        let index: HashMap<&str, usize> = self
            .vocab
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        self.data = tokenized
            .iter()
            .map(|tokens| {
                let mut row = TermCounts::new();
                for t in tokens {
                    if let Some(&i) = index.get(t.as_str()) {
                        *row.entry(i).or_insert(0) += 1;
                    }
                }
                row
            })
            .collect();

        tracing::debug!("Vectorized {} documents over {} terms", self.len(), self.vocab.len());
    }

    /// Remove documents where the encoded-image marker term occurs
    /// at least `freq` times.
    pub fn remove_encoded_images(&mut self, freq: u32) -> Result<()> {
        if !self.is_vectorized() {
            anyhow::bail!("Removing encoded images requires vectorize() first");
        }

        let Some(term) = self.vocab.iter().position(|t| t == ENCODED_IMAGE_TERM) else {
            tracing::warn!("Term '{}' not in vocabulary, no encoded images removed", ENCODED_IMAGE_TERM);
            return Ok(());
        };

        let keep: Vec<usize> = self
            .data
            .iter()
            .enumerate()
            .filter(|(_, row)| row.get(&term).copied().unwrap_or(0) < freq)
            .map(|(i, _)| i)
            .collect();

        let before = self.len();
        self.keep_documents(&keep);
        tracing::info!("Removed {} documents with encoded images", before - self.len());
        Ok(())
    }
}

/// English stop-word list applied by `vectorize`
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone",
    "anything", "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became",
    "because", "become", "becomes", "becoming", "been", "before", "beforehand", "behind",
    "being", "below", "beside", "besides", "between", "beyond", "bill", "both", "bottom",
    "but", "by", "call", "can", "cannot", "cant", "co", "con", "could", "couldnt", "cry",
    "de", "describe", "detail", "do", "done", "down", "due", "during", "each", "eg",
    "eight", "either", "eleven", "else", "elsewhere", "empty", "enough", "etc", "even",
    "ever", "every", "everyone", "everything", "everywhere", "except", "few", "fifteen",
    "fifty", "fill", "find", "fire", "first", "five", "for", "former", "formerly", "forty",
    "found", "four", "from", "front", "full", "further", "get", "give", "go", "had", "has",
    "hasnt", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein",
    "hereupon", "hers", "herself", "him", "himself", "his", "how", "however", "hundred",
    "i", "ie", "if", "in", "inc", "indeed", "interest", "into", "is", "it", "its", "itself",
    "keep", "last", "latter", "latterly", "least", "less", "ltd", "made", "many", "may",
    "me", "meanwhile", "might", "mill", "mine", "more", "moreover", "most", "mostly",
    "move", "much", "must", "my", "myself", "name", "namely", "neither", "never",
    "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
    "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
    "part", "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem",
    "seemed", "seeming", "seems", "serious", "several", "she", "should", "show", "side",
    "since", "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something",
    "sometime", "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than",
    "that", "the", "their", "them", "themselves", "then", "thence", "there", "thereafter",
    "thereby", "therefore", "therein", "thereupon", "these", "they", "thick", "thin",
    "third", "this", "those", "though", "three", "through", "throughout", "thru", "thus",
    "to", "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "un",
    "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were",
    "what", "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas",
    "whereby", "wherein", "whereupon", "wherever", "whether", "which", "while", "whither",
    "who", "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without",
    "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];
