// ============================================================
// Layer 5 — TextCnn Model
// ============================================================
// Convolutional sentence classifier:
//
//   token ids      [batch, seq_len]
//     → embedding  [batch, seq_len, emb]
//     → transpose  [batch, emb, seq_len]
//     → for each filter height h:
//          Conv1d(emb → features, kernel h) + ReLU
//          max over time            [batch, features]
//     → concat     [batch, features * n_heights]
//     → dropout (training only)
//     → linear     [batch, num_classes]
//
// A Conv1d whose input channels are the embedding dimensions is
// the same operation as a 2-D convolution spanning the whole
// embedding width.
//
// Loss = mean cross-entropy + λ · (‖W‖² + ‖b‖²) / 2
// over the output layer's weights W and bias b.
//
// Reference: Kim (2014) Convolutional Neural Networks for Sentence Classification

use anyhow::Result;
use burn::{
    module::Param,
    nn::{
        conv::{Conv1d, Conv1dConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::data::embeddings::Embeddings;

#[derive(Config, Debug)]
pub struct TextCnnConfig {
    pub vocab_size:        usize,
    pub sequence_length:   usize,
    pub embedding_size:    usize,
    pub num_classes:       usize,
    pub filter_heights:    Vec<usize>,
    pub num_features:      usize,
    #[config(default = 0.5)]
    pub dropout_keep_prob: f64,
    #[config(default = 0.0)]
    pub l2_reg_lambda:     f64,
}

impl TextCnnConfig {
    /// Check the architecture fits the input before building anything.
    pub fn validate(&self) -> Result<()> {
        if self.filter_heights.is_empty() {
            anyhow::bail!("at least one filter height is required");
        }
        if let Some(&h) = self.filter_heights.iter().find(|&&h| h == 0 || h > self.sequence_length) {
            anyhow::bail!(
                "filter height {} does not fit sequence length {}",
                h, self.sequence_length
            );
        }
        if !(0.0..=1.0).contains(&self.dropout_keep_prob) || self.dropout_keep_prob == 0.0 {
            anyhow::bail!("dropout keep probability must be in (0, 1], got {}", self.dropout_keep_prob);
        }
        Ok(())
    }

    /// Randomly initialised model
    pub fn init<B: Backend>(&self, device: &B::Device) -> TextCnn<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_size).init(device);
        let convs = self
            .filter_heights
            .iter()
            .map(|&h| Conv1dConfig::new(self.embedding_size, self.num_features, h).init(device))
            .collect();
        let output = LinearConfig::new(
            self.num_features * self.filter_heights.len(),
            self.num_classes,
        )
        .init(device);
        let dropout = DropoutConfig::new(1.0 - self.dropout_keep_prob).init();

        TextCnn {
            embedding, convs, output, dropout,
            l2_reg_lambda: self.l2_reg_lambda,
        }
    }

    /// Model whose embedding table starts from pre-trained vectors
    pub fn init_with_embeddings<B: Backend>(
        &self,
        device:     &B::Device,
        embeddings: &Embeddings,
    ) -> Result<TextCnn<B>> {
        if embeddings.vocab_size != self.vocab_size || embeddings.dim != self.embedding_size {
            anyhow::bail!(
                "embedding matrix is {}x{}, model expects {}x{}",
                embeddings.vocab_size, embeddings.dim, self.vocab_size, self.embedding_size
            );
        }

        let mut model = self.init(device);
        let weight = Tensor::<B, 2>::from_data(
            TensorData::new(embeddings.values.clone(), [embeddings.vocab_size, embeddings.dim]),
            device,
        );
        model.embedding.weight = Param::from_tensor(weight);
        Ok(model)
    }
}

#[derive(Module, Debug)]
pub struct TextCnn<B: Backend> {
    pub embedding:     Embedding<B>,
    /// One convolution per filter height
    pub convs:         Vec<Conv1d<B>>,
    pub output:        Linear<B>,
    pub dropout:       Dropout,
    pub l2_reg_lambda: f64,
}

pub struct ClassificationOutput<B: Backend> {
    /// Scalar loss, shape [1]
    pub loss:    Tensor<B, 1>,
    /// Unnormalised class scores, shape [batch, num_classes]
    pub logits:  Tensor<B, 2>,
    /// Predicted class per document, shape [batch]
    pub predictions: Tensor<B, 1, Int>,
}

impl<B: Backend> TextCnn<B> {
    /// token_ids: [batch, seq_len] → logits: [batch, num_classes]
    pub fn forward(&self, token_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let embedded = self.embedding.forward(token_ids).swap_dims(1, 2);

        let pooled: Vec<Tensor<B, 2>> = self
            .convs
            .iter()
            .map(|conv| {
                let features = relu(conv.forward(embedded.clone())); // [batch, features, time]
                features.max_dim(2).flatten::<2>(1, 2)
            })
            .collect();

        let x = Tensor::cat(pooled, 1);
        self.output.forward(self.dropout.forward(x))
    }

    /// Forward pass plus regularised cross-entropy loss.
    pub fn forward_classification(
        &self,
        token_ids: Tensor<B, 2, Int>,
        labels:    Tensor<B, 1, Int>,
    ) -> ClassificationOutput<B> {
        let logits = self.forward(token_ids);
        let ce = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), labels);

        let loss = if self.l2_reg_lambda > 0.0 {
            ce + self.output_l2_loss().mul_scalar(self.l2_reg_lambda)
        } else {
            ce
        };

        let predictions = logits.clone().argmax(1).flatten::<1>(0, 1);
        ClassificationOutput { loss, logits, predictions }
    }

    /// (‖W‖² + ‖b‖²) / 2 of the output layer, shape [1]
    fn output_l2_loss(&self) -> Tensor<B, 1> {
        let w = self.output.weight.val();
        let mut l2 = (w.clone() * w).sum();
        if let Some(bias) = &self.output.bias {
            let b = bias.val();
            l2 = l2 + (b.clone() * b).sum();
        }
        l2.div_scalar(2.0)
    }
}

/// Number of `predictions` equal to `labels`
pub fn count_correct<B: Backend>(predictions: Tensor<B, 1, Int>, labels: Tensor<B, 1, Int>) -> usize {
    predictions
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use rand::{rngs::StdRng, SeedableRng};

    type TestBackend = NdArray<f32>;

    fn config() -> TextCnnConfig {
        TextCnnConfig::new(12, 8, 6, 4, vec![2, 3], 5)
    }

    fn ids(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2, Int> {
        Tensor::from_data(
            TensorData::new(vec![1i64, 2, 3, 4, 5, 0, 0, 0, 6, 7, 8, 9, 10, 11, 0, 0], [2, 8]),
            device,
        )
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model: TextCnn<TestBackend> = config().init(&device);
        let logits = model.forward(ids(&device));
        assert_eq!(logits.dims(), [2, 4]);
    }

    #[test]
    fn test_classification_output() {
        let device = Default::default();
        let model: TextCnn<TestBackend> = config().init(&device);
        let labels = Tensor::from_data(TensorData::new(vec![1i64, 3], [2]), &device);
        let out = model.forward_classification(ids(&device), labels.clone());

        assert_eq!(out.loss.dims(), [1]);
        assert_eq!(out.predictions.dims(), [2]);
        assert!(count_correct(out.predictions, labels) <= 2);
    }

    #[test]
    fn test_l2_penalty_increases_loss() {
        let device = Default::default();
        let plain: TextCnn<TestBackend> = config().init(&device);
        let mut regularised = plain.clone();
        regularised.l2_reg_lambda = 1.0;

        let labels = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![0i64, 1], [2]), &device);
        let a = plain.forward_classification(ids(&device), labels.clone()).loss.into_scalar();
        let b = regularised.forward_classification(ids(&device), labels).loss.into_scalar();
        assert!(b > a);
    }

    #[test]
    fn test_pretrained_embeddings_are_copied() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(3);
        let embeddings = Embeddings::random(12, 6, &mut rng);

        let model: TextCnn<TestBackend> = config().init_with_embeddings(&device, &embeddings).unwrap();
        let weight: Vec<f32> = model.embedding.weight.val().into_data().to_vec().unwrap();
        assert_eq!(weight, embeddings.values);
    }

    #[test]
    fn test_embedding_shape_mismatch_is_rejected() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(3);
        let embeddings = Embeddings::random(10, 6, &mut rng);
        assert!(config().init_with_embeddings::<TestBackend>(&device, &embeddings).is_err());
    }

    #[test]
    fn test_validate_rejects_long_filters() {
        let cfg = TextCnnConfig::new(12, 2, 6, 4, vec![3], 5);
        assert!(cfg.validate().is_err());
        assert!(config().validate().is_ok());
    }
}
