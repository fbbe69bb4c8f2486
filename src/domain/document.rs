// ============================================================
// Layer 3 — News Document Domain Type
// ============================================================
// One article of the corpus together with the index of the
// newsgroup it was posted to.

use serde::{Deserialize, Serialize};

/// Which half of the corpus to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subset {
    Train,
    Test,
}

impl Subset {
    /// Directory suffix used by the "bydate" distribution of the corpus
    pub fn dir_name(&self) -> &'static str {
        match self {
            Subset::Train => "20news-bydate-train",
            Subset::Test  => "20news-bydate-test",
        }
    }
}

/// A raw news article loaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsDocument {
    /// File path relative to the subset directory, kept for traceability
    pub source: String,

    /// Article text (headers included); cleaned in place later
    pub text: String,

    /// Index into the corpus' class names
    pub label: usize,
}

impl NewsDocument {
    pub fn new(source: impl Into<String>, text: impl Into<String>, label: usize) -> Self {
        Self {
            source: source.into(),
            text:   text.into(),
            label,
        }
    }

    /// Number of whitespace-separated words in the text
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_ignores_repeated_whitespace() {
        let doc = NewsDocument::new("a/1", "  one two\n\tthree  ", 0);
        assert_eq!(doc.word_count(), 3);
    }

    #[test]
    fn test_subset_dir_names() {
        assert_eq!(Subset::Train.dir_name(), "20news-bydate-train");
        assert_eq!(Subset::Test.dir_name(),  "20news-bydate-test");
    }
}
