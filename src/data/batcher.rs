// ============================================================
// Layer 4 — Mini-batching
// ============================================================
// Two pieces:
//
//   BatchIter    → yields index batches over `num_epochs` passes,
//                  reshuffling the data at the start of each epoch
//   TextBatcher  → Burn Batcher turning samples into tensors
//
// With n samples and batch size b, every epoch yields
// (n - 1) / b + 1 batches; the last one may be short.

use anyhow::Result;
use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::dataset::TextSample;

// ─── BatchIter ────────────────────────────────────────────────────────────────
pub struct BatchIter {
    order:      Vec<usize>,
    batch_size: usize,
    num_epochs: usize,
    shuffle:    bool,
    rng:        StdRng,
    epoch:      usize,
    position:   usize,
}

impl BatchIter {
    pub fn new(
        len:        usize,
        batch_size: usize,
        num_epochs: usize,
        shuffle:    bool,
        seed:       u64,
    ) -> Result<Self> {
        if batch_size == 0 {
            anyhow::bail!("batch size must be greater than zero");
        }
        let mut iter = Self {
            order: (0..len).collect(),
            batch_size,
            num_epochs,
            shuffle,
            rng: StdRng::seed_from_u64(seed),
            epoch: 0,
            position: 0,
        };
        iter.start_epoch();
        Ok(iter)
    }

    pub fn batches_per_epoch(&self) -> usize {
        if self.order.is_empty() {
            0
        } else {
            (self.order.len() - 1) / self.batch_size + 1
        }
    }

    /// Total number of batches over all epochs
    pub fn total_batches(&self) -> usize {
        self.batches_per_epoch() * self.num_epochs
    }

    fn start_epoch(&mut self) {
        if self.shuffle {
            self.order.shuffle(&mut self.rng);
        }
        self.position = 0;
    }
}

impl Iterator for BatchIter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.order.is_empty() {
            return None;
        }
        if self.position >= self.order.len() {
            self.epoch += 1;
            if self.epoch >= self.num_epochs {
                return None;
            }
            self.start_epoch();
        }
        if self.epoch >= self.num_epochs {
            return None;
        }

        let end   = (self.position + self.batch_size).min(self.order.len());
        let batch = self.order[self.position..end].to_vec();
        self.position = end;
        Some(batch)
    }
}

// ─── TextBatch ────────────────────────────────────────────────────────────────
/// A batch of documents ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct TextBatch<B: Backend> {
    /// Vocabulary indices, shape [batch_size, sequence_length]
    pub token_ids: Tensor<B, 2, Int>,

    /// Class indices, shape [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

// ─── TextBatcher ──────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct TextBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TextBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<TextSample, TextBatch<B>> for TextBatcher<B> {
    fn batch(&self, items: Vec<TextSample>) -> TextBatch<B> {
        let batch_size = items.len();
        // Every sample is pre-padded to the same length
        let seq_len    = items.first().map(|s| s.token_ids.len()).unwrap_or(0);

        let ids: Vec<i64> = items
            .iter()
            .flat_map(|s| s.token_ids.iter().map(|&x| x as i64))
            .collect();
        let labels: Vec<i64> = items.iter().map(|s| s.label as i64).collect();

        let token_ids = Tensor::<B, 2, Int>::from_data(
            TensorData::new(ids, [batch_size, seq_len]),
            &self.device,
        );
        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]),
            &self.device,
        );

        TextBatch { token_ids, labels }
    }
}
