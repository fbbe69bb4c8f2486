// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds a trained TextCnn from a run directory:
//
//   model_config.json  → architecture (and sequence length)
//   vocab.json         → vocabulary processor
//   labels.json        → class names
//   checkpoints/       → weights of the latest checkpoint
//
// Runs on a plain (non-autodiff) backend, so dropout is inactive.

use anyhow::Result;
use burn::{
    data::dataloader::{batcher::Batcher, DataLoaderBuilder},
    prelude::*,
    tensor::activation::softmax,
};

use crate::data::{
    batcher::TextBatcher,
    dataset::{TextDataset, TextSample},
    preprocessor::Preprocessor,
    vocab::VocabularyProcessor,
};
use crate::domain::traits::{Prediction, TextClassifier};
use crate::infra::{checkpoint::CheckpointManager, run_dir::RunDir, vocab_store::VocabStore};
use crate::ml::model::{TextCnn, TextCnnConfig};
use crate::ml::trainer::{evaluate, EvalMetrics};

pub struct Inferencer<B: Backend> {
    model:        TextCnn<B>,
    vocab:        VocabularyProcessor,
    class_names:  Vec<String>,
    preprocessor: Preprocessor,
    device:       B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn from_run(run: &RunDir, device: B::Device) -> Result<Self> {
        let model_cfg: TextCnnConfig = run.load_json(&run.model_config_path())?;
        let class_names: Vec<String> = run.load_json(&run.labels_path())?;
        if class_names.len() != model_cfg.num_classes {
            anyhow::bail!(
                "labels.json lists {} classes but the model has {}",
                class_names.len(),
                model_cfg.num_classes
            );
        }

        let vocab = VocabStore::new(run.vocab_path()).load(model_cfg.sequence_length)?;

        let model: TextCnn<B> = model_cfg.init(&device);
        let model = CheckpointManager::open(run.checkpoints())?.load_latest(model, &device)?;
        tracing::info!(
            "Model loaded from '{}' ({} classes, {} words)",
            run.root().display(),
            class_names.len(),
            vocab.len()
        );

        Ok(Self { model, vocab, class_names, preprocessor: Preprocessor::new(), device })
    }

    pub fn vocab(&self) -> &VocabularyProcessor {
        &self.vocab
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Classify each text with the training-time cleaning and vocabulary.
    pub fn predict(&self, texts: &[&str]) -> Result<Vec<Prediction>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let samples: Vec<TextSample> = texts
            .iter()
            .map(|t| TextSample::new(self.vocab.transform_one(&self.preprocessor.clean(t)), 0))
            .collect();
        let batch = TextBatcher::<B>::new(self.device.clone()).batch(samples);

        let probs = softmax(self.model.forward(batch.token_ids), 1);
        let [n, num_classes] = probs.dims();
        let values: Vec<f32> = probs
            .into_data()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("Cannot read class probabilities: {e:?}"))?;

        let predictions = values
            .chunks(num_classes)
            .take(n)
            .map(|row| {
                let (label, &confidence) = row
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .unwrap_or((0, &0.0));
                Prediction {
                    label,
                    class_name: self.class_names[label].clone(),
                    confidence,
                }
            })
            .collect();
        Ok(predictions)
    }

    /// Loss and accuracy of the restored model over `samples`.
    pub fn evaluate(&self, samples: Vec<TextSample>, batch_size: usize) -> Result<EvalMetrics> {
        if batch_size == 0 {
            anyhow::bail!("batch size must be at least 1");
        }
        let loader = DataLoaderBuilder::new(TextBatcher::<B>::new(self.device.clone()))
            .batch_size(batch_size)
            .build(TextDataset::new(samples));
        Ok(evaluate(&self.model, loader.as_ref()))
    }
}

impl<B: Backend> TextClassifier for Inferencer<B> {
    fn classify(&self, text: &str) -> Result<Prediction> {
        self.predict(&[text])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("No prediction produced"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::vocab_store::VocabStore;
    use crate::ml::backend::{cpu_device, CpuBackend};
    use tempfile::tempdir;

    fn saved_run(root: &std::path::Path) -> RunDir {
        let run = RunDir::create_at(root).unwrap();

        let mut vocab = VocabularyProcessor::new(5);
        vocab.fit(&["engine car wheel", "goal hockey puck"]);
        VocabStore::new(run.vocab_path()).save(&vocab).unwrap();

        let labels = vec!["rec.autos".to_string(), "rec.sport.hockey".to_string()];
        run.save_json(&run.labels_path(), &labels).unwrap();

        let model_cfg = TextCnnConfig::new(vocab.len(), 5, 4, 2, vec![2, 3], 3);
        run.save_json(&run.model_config_path(), &model_cfg).unwrap();

        let model: TextCnn<CpuBackend> = model_cfg.init(&cpu_device());
        CheckpointManager::new(run.checkpoints(), 5).unwrap().save(&model, 100).unwrap();
        run
    }

    #[test]
    fn test_restored_model_classifies_text() {
        let tmp = tempdir().unwrap();
        let run = saved_run(&tmp.path().join("run"));

        let inferencer = Inferencer::<CpuBackend>::from_run(&run, cpu_device()).unwrap();
        assert_eq!(inferencer.class_names().len(), 2);

        let p = inferencer.classify("The car's ENGINE has 4 wheels!").unwrap();
        assert!(p.label < 2);
        assert_eq!(p.class_name, inferencer.class_names()[p.label]);
        assert!(p.confidence >= 0.5 && p.confidence <= 1.0);
    }

    #[test]
    fn test_evaluate_reports_all_samples() {
        let tmp = tempdir().unwrap();
        let run = saved_run(&tmp.path().join("run"));
        let inferencer = Inferencer::<CpuBackend>::from_run(&run, cpu_device()).unwrap();

        let samples = vec![
            TextSample::new(inferencer.vocab().transform_one("engine car"), 0),
            TextSample::new(inferencer.vocab().transform_one("hockey puck"), 1),
            TextSample::new(inferencer.vocab().transform_one("goal"), 1),
        ];
        let metrics = inferencer.evaluate(samples, 2).unwrap();
        assert_eq!(metrics.samples, 3);
        assert!(metrics.loss.is_finite());
    }

    #[test]
    fn test_missing_checkpoint_is_reported() {
        let tmp = tempdir().unwrap();
        let run = RunDir::create_at(tmp.path().join("empty")).unwrap();
        assert!(Inferencer::<CpuBackend>::from_run(&run, cpu_device()).is_err());
    }
}
