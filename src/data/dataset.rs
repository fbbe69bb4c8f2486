use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One vectorized document: padded vocabulary indices and its class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSample {
    pub token_ids: Vec<u32>,
    pub label:     usize,
}

impl TextSample {
    pub fn new(token_ids: Vec<u32>, label: usize) -> Self {
        Self { token_ids, label }
    }
}

pub struct TextDataset {
    samples: Vec<TextSample>,
}

impl TextDataset {
    pub fn new(samples: Vec<TextSample>) -> Self { Self { samples } }

    /// Pair each row of indices with its label.
    pub fn from_rows(rows: Vec<Vec<u32>>, labels: &[usize]) -> Self {
        let samples = rows
            .into_iter()
            .zip(labels.iter().copied())
            .map(|(ids, label)| TextSample::new(ids, label))
            .collect();
        Self { samples }
    }

    /// Samples at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Vec<TextSample> {
        indices.iter().filter_map(|&i| self.samples.get(i).cloned()).collect()
    }
}

impl Dataset<TextSample> for TextDataset {
    fn get(&self, index: usize) -> Option<TextSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
