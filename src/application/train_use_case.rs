// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load + filter the train subset   (Layer 4 - data)
//   Step 2: Load + filter the test subset    (Layer 4 - data)
//   Step 3: Fit the vocabulary processor     (Layer 4 - data)
//   Step 4: Load pre-trained embeddings      (Layer 4 - data)
//   Step 5: Describe the model               (Layer 5 - ml)
//   Step 6: Create the run dir, save configs (Layer 6 - infra)
//   Step 7: Run the training loop            (Layer 5 - ml)
//
// Reference: Kim (2014) Convolutional Neural Networks for Sentence Classification
//            Burn Book §5 (Training)

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    corpus::{Corpus, StopWords, VocabScope},
    dataset::TextDataset,
    embeddings::{load_word2vec, Embeddings},
    loader::Text20News,
    vocab::VocabularyProcessor,
};
use crate::domain::{document::Subset, traits::CorpusSource};
use crate::infra::{run_dir::RunDir, vocab_store::VocabStore};
use crate::ml::{
    backend::DeviceKind,
    model::TextCnnConfig,
    trainer::{run_training, TrainingReport},
};

/// Documents in which the encoded-image marker occurs this often are dropped
pub const ENCODED_IMAGE_FREQ: u32 = 1000;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved as config.json in the run directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:          PathBuf,
    /// word2vec file; `None` keeps the random initialisation
    pub embedding_file:    Option<PathBuf>,
    pub embedding_dim:     usize,
    pub filter_heights:    Vec<usize>,
    pub num_features:      usize,
    pub learning_rate:     f64,
    pub batch_size:        usize,
    pub num_epochs:        usize,
    pub dropout_keep_prob: f64,
    pub l2_reg_lambda:     f64,
    pub evaluate_every:    usize,
    pub checkpoint_every:  usize,
    pub num_checkpoints:   usize,
    pub min_words:         usize,
    pub runs_dir:          PathBuf,
    pub seed:              u64,
    pub device:            DeviceKind,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:          PathBuf::from("data/20news"),
            embedding_file:    Some(PathBuf::from("data/GoogleNews-vectors-negative300.bin")),
            embedding_dim:     300,
            filter_heights:    vec![3, 4, 5],
            num_features:      128,
            learning_rate:     1e-3,
            batch_size:        64,
            num_epochs:        200,
            dropout_keep_prob: 0.5,
            l2_reg_lambda:     0.0,
            evaluate_every:    100,
            checkpoint_every:  100,
            num_checkpoints:   5,
            min_words:         20,
            runs_dir:          PathBuf::from("runs"),
            seed:              42,
            device:            DeviceKind::Wgpu,
        }
    }
}

impl TrainConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("embedding_dim",    self.embedding_dim),
            ("num_features",     self.num_features),
            ("batch_size",       self.batch_size),
            ("num_epochs",       self.num_epochs),
            ("evaluate_every",   self.evaluate_every),
            ("checkpoint_every", self.checkpoint_every),
            ("num_checkpoints",  self.num_checkpoints),
        ];
        for (name, value) in positive {
            if value == 0 {
                anyhow::bail!("{name} must be at least 1");
            }
        }
        if self.filter_heights.is_empty() || self.filter_heights.contains(&0) {
            anyhow::bail!("filter heights must be a non-empty list of positive sizes");
        }
        if !(self.dropout_keep_prob > 0.0 && self.dropout_keep_prob <= 1.0) {
            anyhow::bail!("dropout keep probability must be in (0, 1], got {}", self.dropout_keep_prob);
        }
        if self.learning_rate <= 0.0 {
            anyhow::bail!("learning rate must be positive, got {}", self.learning_rate);
        }
        if self.l2_reg_lambda < 0.0 {
            anyhow::bail!("L2 regularization lambda must not be negative");
        }
        Ok(())
    }
}

// ─── Corpus preparation ──────────────────────────────────────────────────────

/// Train subset: drop short documents, clean, vectorize, drop encoded images.
pub fn prepare_train_corpus(source: &impl CorpusSource, min_words: usize) -> Result<Corpus> {
    let mut corpus = Corpus::load(source, Subset::Train)?;
    corpus.remove_short_documents(min_words, VocabScope::Full)?;
    ensure_not_empty(&corpus)?;
    corpus.clean_text();
    corpus.vectorize(StopWords::English, None);
    corpus.remove_encoded_images(ENCODED_IMAGE_FREQ)?;
    ensure_not_empty(&corpus)?;
    Ok(corpus)
}

fn ensure_not_empty(corpus: &Corpus) -> Result<()> {
    if corpus.is_empty() {
        anyhow::bail!("No training documents left after filtering");
    }
    Ok(())
}

/// Test subset: clean, vectorize over `vocabulary`, drop encoded images.
pub fn prepare_test_corpus(source: &impl CorpusSource, vocabulary: Option<&[String]>) -> Result<Corpus> {
    let mut corpus = Corpus::load(source, Subset::Test)?;
    corpus.clean_text();
    corpus.vectorize(StopWords::English, vocabulary);
    corpus.remove_encoded_images(ENCODED_IMAGE_FREQ)?;
    Ok(corpus)
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingReport> {
        let cfg = &self.config;
        cfg.validate()?;

        let source = Text20News::new(&cfg.data_dir);

        // ── Step 1: Train subset ──────────────────────────────────────────────
        let train = prepare_train_corpus(&source, cfg.min_words)?;

        // ── Step 2: Test subset, counted over the train vocabulary ───────────
        let test = prepare_test_corpus(&source, Some(train.vocab.as_slice()))?;
        if test.class_names != train.class_names {
            anyhow::bail!(
                "Train and test subsets have different classes ({} vs {})",
                train.class_names.len(),
                test.class_names.len()
            );
        }

        // ── Step 3: Vocabulary ────────────────────────────────────────────────
        let train_texts = train.texts();
        let test_texts  = test.texts();
        let max_len = VocabularyProcessor::max_document_length(&[
            train_texts.as_slice(),
            test_texts.as_slice(),
        ]);
        if max_len == 0 {
            anyhow::bail!("Every document is empty after cleaning");
        }

        let mut vocab = VocabularyProcessor::new(max_len);
        let x_train = vocab.fit_transform(&train_texts);
        let x_test  = vocab.transform(&test_texts);

        tracing::info!("Vocabulary Size: {}", vocab.len());
        tracing::info!("Max. Document Length: {}", max_len);
        tracing::info!("Number of Classes: {}", train.class_names.len());
        tracing::info!("Train/Test split: {}/{}", x_train.len(), x_test.len());

        // ── Step 4: Embeddings ────────────────────────────────────────────────
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let embeddings = match &cfg.embedding_file {
            Some(path) => {
                tracing::info!("Loading word2vec embeddings from '{}'", path.display());
                load_word2vec(path, &vocab, cfg.embedding_dim, &mut rng)?
            }
            None => {
                tracing::info!("No embedding file given, using random embeddings");
                Embeddings::random(vocab.len(), cfg.embedding_dim, &mut rng)
            }
        };

        // ── Step 5: Model description ─────────────────────────────────────────
        let model_cfg = TextCnnConfig::new(
            vocab.len(),
            vocab.sequence_length(),
            cfg.embedding_dim,
            train.class_names.len(),
            cfg.filter_heights.clone(),
            cfg.num_features,
        )
        .with_dropout_keep_prob(cfg.dropout_keep_prob)
        .with_l2_reg_lambda(cfg.l2_reg_lambda);
        model_cfg.validate()?;

        // ── Step 6: Run directory ─────────────────────────────────────────────
        let run = RunDir::create(&cfg.runs_dir)?;
        VocabStore::new(run.vocab_path()).save(&vocab)?;
        run.save_json(&run.labels_path(), &train.class_names)?;
        run.save_json(&run.config_path(), cfg)?;
        run.save_json(&run.model_config_path(), &model_cfg)?;

        // ── Step 7: Train ─────────────────────────────────────────────────────
        let train_set = TextDataset::from_rows(x_train, &train.labels());
        let test_set  = TextDataset::from_rows(x_test, &test.labels());

        run_training(cfg, &model_cfg, &embeddings, train_set, test_set, &run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const AUTOS: &str = "the engine of my car makes a noise when the wheel turns and the \
                         brakes squeal on every corner of the road near the garage today";
    const HOCKEY: &str = "the goalie stopped the puck twice before the team scored a goal \
                          in overtime and the fans cheered loudly across the arena tonight";

    fn write_subset(root: &Path, subset: Subset, per_class: usize) {
        for (class, text) in [("rec.autos", AUTOS), ("rec.sport.hockey", HOCKEY)] {
            let dir = root.join(subset.dir_name()).join(class);
            fs::create_dir_all(&dir).unwrap();
            for i in 0..per_class {
                fs::write(dir.join(format!("{}", 100 + i)), format!("{text} {i}")).unwrap();
            }
            // Too short for training
            fs::write(dir.join("1"), "short post").unwrap();
        }
    }

    fn small_config(root: &Path) -> TrainConfig {
        TrainConfig {
            data_dir:         root.join("20news"),
            embedding_file:   None,
            embedding_dim:    8,
            filter_heights:   vec![2, 3],
            num_features:     4,
            batch_size:       4,
            num_epochs:       2,
            evaluate_every:   2,
            checkpoint_every: 2,
            num_checkpoints:  2,
            runs_dir:         root.join("runs"),
            device:           DeviceKind::Cpu,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let bad = [
            TrainConfig { batch_size: 0, ..TrainConfig::default() },
            TrainConfig { filter_heights: vec![], ..TrainConfig::default() },
            TrainConfig { filter_heights: vec![3, 0], ..TrainConfig::default() },
            TrainConfig { dropout_keep_prob: 0.0, ..TrainConfig::default() },
            TrainConfig { learning_rate: -1.0, ..TrainConfig::default() },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
    }

    #[test]
    fn test_prepare_train_corpus_drops_short_documents() {
        let tmp = tempdir().unwrap();
        write_subset(&tmp.path().join("20news"), Subset::Train, 3);

        let corpus = prepare_train_corpus(&Text20News::new(tmp.path().join("20news")), 20).unwrap();
        assert_eq!(corpus.len(), 6);
        assert_eq!(corpus.labels(), vec![0, 0, 0, 1, 1, 1]);
        assert!(corpus.texts().iter().all(|t| t.ends_with("num")));
    }

    #[test]
    fn test_prepare_train_corpus_fails_when_every_document_is_short() {
        let tmp = tempdir().unwrap();
        write_subset(&tmp.path().join("20news"), Subset::Train, 3);

        let err = prepare_train_corpus(&Text20News::new(tmp.path().join("20news")), 10_000).unwrap_err();
        assert!(err.to_string().contains("No training documents left"));
    }

    #[test]
    fn test_execute_trains_and_writes_run() {
        let tmp = tempdir().unwrap();
        let data = tmp.path().join("20news");
        write_subset(&data, Subset::Train, 4);
        write_subset(&data, Subset::Test, 2);

        let report = TrainUseCase::new(small_config(tmp.path())).execute().unwrap();

        // 8 train documents, batch 4 → 2 steps per epoch
        assert_eq!(report.steps, 4);
        assert!(report.last_checkpoint.is_some());

        let run = RunDir::open(&report.run_dir).unwrap();
        let labels: Vec<String> = run.load_json(&run.labels_path()).unwrap();
        assert_eq!(labels, vec!["rec.autos", "rec.sport.hockey"]);

        let model_cfg: TextCnnConfig = run.load_json(&run.model_config_path()).unwrap();
        assert_eq!(model_cfg.num_classes, 2);
        assert_eq!(model_cfg.filter_heights, vec![2, 3]);

        let saved: TrainConfig = run.load_json(&run.config_path()).unwrap();
        assert_eq!(saved.batch_size, 4);
        assert!(run.vocab_path().exists());
    }

    #[test]
    fn test_filter_longer_than_documents_fails_early() {
        let tmp = tempdir().unwrap();
        let data = tmp.path().join("20news");
        write_subset(&data, Subset::Train, 2);
        write_subset(&data, Subset::Test, 1);

        let cfg = TrainConfig { filter_heights: vec![500], ..small_config(tmp.path()) };
        assert!(TrainUseCase::new(cfg).execute().is_err());
        assert!(!tmp.path().join("runs").exists());
    }
}
