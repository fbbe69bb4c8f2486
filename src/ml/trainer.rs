// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Step-driven training with Adam:
//
//   for each mini-batch (BatchIter over num_epochs):
//     forward + loss → backward → gradient summaries → Adam step
//     every `evaluate_every` steps  → evaluate on the test set
//     every `checkpoint_every` steps → save a checkpoint
//
// The global step counts optimizer updates and starts at 1.
//
// Training runs on the autodiff backend B; evaluation runs on
// model.valid(), i.e. B::InnerBackend with dropout disabled.
//
// Reference: Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::{
        dataloader::{batcher::Batcher, DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{BatchIter, TextBatch, TextBatcher},
    dataset::TextDataset,
    embeddings::Embeddings,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    run_dir::RunDir,
    summary::{GradientSummary, ScalarSummary, SummaryWriter},
};
use crate::ml::backend::{self, DeviceKind};
use crate::ml::model::{count_correct, TextCnn, TextCnnConfig};

/// Outcome of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub run_dir:         PathBuf,
    pub steps:           usize,
    pub max_accuracy:    f64,
    pub last_checkpoint: Option<PathBuf>,
}

/// Mean loss and accuracy over a dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub loss:     f64,
    pub accuracy: f64,
    pub samples:  usize,
}

pub fn run_training(
    cfg:        &TrainConfig,
    model_cfg:  &TextCnnConfig,
    embeddings: &Embeddings,
    train:      TextDataset,
    test:       TextDataset,
    run:        &RunDir,
) -> Result<TrainingReport> {
    match cfg.device {
        DeviceKind::Wgpu => {
            let device = backend::wgpu_device();
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<backend::WgpuTrainBackend>(cfg, model_cfg, embeddings, train, test, run, device)
        }
        DeviceKind::Cpu => {
            let device = backend::cpu_device();
            tracing::info!("Using CPU device: {:?}", device);
            train_loop::<backend::CpuTrainBackend>(cfg, model_cfg, embeddings, train, test, run, device)
        }
    }
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:        &TrainConfig,
    model_cfg:  &TextCnnConfig,
    embeddings: &Embeddings,
    train:      TextDataset,
    test:       TextDataset,
    run:        &RunDir,
    device:     B::Device,
) -> Result<TrainingReport> {
    B::seed(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: TextCnn<B> = model_cfg.init_with_embeddings(&device, embeddings)?;
    tracing::info!(
        "Model ready: filter heights {:?}, {} features each",
        model_cfg.filter_heights, model_cfg.num_features
    );

    let mut optim = adam_config().init();

    // ── Summaries & checkpoints ───────────────────────────────────────────────
    let train_writer = SummaryWriter::with_gradients(run.train_summaries())?;
    let test_writer  = SummaryWriter::scalars(run.test_summaries())?;
    let mut ckpt     = CheckpointManager::new(run.checkpoints(), cfg.num_checkpoints)?;

    // ── Data ──────────────────────────────────────────────────────────────────
    let train_batcher = TextBatcher::<B>::new(device.clone());
    let batches = BatchIter::new(train.len(), cfg.batch_size, cfg.num_epochs, true, cfg.seed)?;
    tracing::info!(
        "{} batches per epoch, {} steps in total",
        batches.batches_per_epoch(),
        batches.total_batches()
    );

    let test_loader = DataLoaderBuilder::new(TextBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(test);

    // ── Step loop ─────────────────────────────────────────────────────────────
    let mut step            = 0usize;
    let mut max_accuracy    = 0.0f64;
    let mut last_checkpoint = None;

    for indices in batches {
        let batch: TextBatch<B> = train_batcher.batch(train.select(&indices));
        let batch_size = indices.len();

        let output = model.forward_classification(batch.token_ids, batch.labels.clone());
        let loss: f64 = output.loss.clone().into_scalar().elem::<f64>();
        let accuracy  = count_correct(output.predictions, batch.labels) as f64 / batch_size as f64;

        let grads = output.loss.backward();
        let grad_summaries = gradient_summaries(&model, &grads);
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(cfg.learning_rate, model, grads);
        step += 1;

        tracing::info!("Step {}, Loss {:.6}, Accuracy {:.4}", step, loss, accuracy);
        train_writer.add_scalars(&ScalarSummary::new(step, loss, accuracy))?;
        train_writer.add_gradients(step, &grad_summaries)?;

        if step % cfg.evaluate_every == 0 {
            tracing::info!("Evaluation:");
            let metrics = evaluate(&model.valid(), test_loader.as_ref());
            tracing::info!(
                "Step {}, Loss {:.6}, Accuracy {:.4}",
                step, metrics.loss, metrics.accuracy
            );
            test_writer.add_scalars(&ScalarSummary::new(step, metrics.loss, metrics.accuracy))?;

            if metrics.accuracy > max_accuracy {
                max_accuracy = metrics.accuracy;
            }
            tracing::info!("Max. Test Accuracy: {:.4}", max_accuracy);
        }

        if step % cfg.checkpoint_every == 0 {
            let path = ckpt.save(&model, step)?;
            tracing::info!("Saved model checkpoint to {}", path.display());
            last_checkpoint = Some(path);
        }
    }

    tracing::info!("Training complete after {} steps", step);
    Ok(TrainingReport {
        run_dir: run.root().to_path_buf(),
        steps: step,
        max_accuracy,
        last_checkpoint,
    })
}

/// Adam with the usual epsilon of 1e-8
pub fn adam_config() -> AdamConfig {
    AdamConfig::new().with_epsilon(1e-8)
}

/// Mean loss and accuracy of `model` over every batch of `loader`.
pub fn evaluate<B: Backend>(model: &TextCnn<B>, loader: &dyn DataLoader<TextBatch<B>>) -> EvalMetrics {
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut samples  = 0usize;

    for batch in loader.iter() {
        let n      = batch.labels.dims()[0];
        let output = model.forward_classification(batch.token_ids, batch.labels.clone());

        loss_sum += output.loss.into_scalar().elem::<f64>() * n as f64;
        correct  += count_correct(output.predictions, batch.labels);
        samples  += n;
    }

    if samples == 0 {
        return EvalMetrics { loss: f64::NAN, accuracy: 0.0, samples };
    }
    EvalMetrics {
        loss:     loss_sum / samples as f64,
        accuracy: correct as f64 / samples as f64,
        samples,
    }
}

/// Histogram statistics and sparsity of every trainable parameter's gradient
fn gradient_summaries<B: AutodiffBackend>(model: &TextCnn<B>, grads: &B::Gradients) -> Vec<GradientSummary> {
    let mut out = Vec::new();

    if let Some(g) = model.embedding.weight.val().grad(grads) {
        out.push(GradientSummary::from_tensor("embedding/weight", g));
    }
    for conv in &model.convs {
        let height = conv.weight.val().dims()[2];
        if let Some(g) = conv.weight.val().grad(grads) {
            out.push(GradientSummary::from_tensor(format!("conv-maxpool-{height}/weight"), g));
        }
        if let Some(g) = conv.bias.as_ref().and_then(|b| b.val().grad(grads)) {
            out.push(GradientSummary::from_tensor(format!("conv-maxpool-{height}/bias"), g));
        }
    }
    if let Some(g) = model.output.weight.val().grad(grads) {
        out.push(GradientSummary::from_tensor("output/weight", g));
    }
    if let Some(g) = model.output.bias.as_ref().and_then(|b| b.val().grad(grads)) {
        out.push(GradientSummary::from_tensor("output/bias", g));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::TextSample;
    use crate::ml::backend::{CpuBackend, CpuTrainBackend};
    use rand::{rngs::StdRng, SeedableRng};
    use std::fs;
    use tempfile::tempdir;

    fn samples() -> Vec<TextSample> {
        // Class 0 documents use words 1..4, class 1 documents words 5..8
        (0..12)
            .map(|i| {
                let label = i % 2;
                let base  = 1 + 4 * label as u32;
                TextSample::new(vec![base, base + 1, base + 2, base + 3, 0, 0], label)
            })
            .collect()
    }

    fn config() -> TrainConfig {
        TrainConfig {
            batch_size:       4,
            num_epochs:       2,
            evaluate_every:   3,
            checkpoint_every: 2,
            num_checkpoints:  2,
            embedding_dim:    4,
            filter_heights:   vec![2, 3],
            num_features:     3,
            device:           DeviceKind::Cpu,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_train_loop_writes_summaries_and_checkpoints() {
        let tmp = tempdir().unwrap();
        let run = RunDir::create_at(tmp.path().join("run")).unwrap();
        let cfg = config();

        let model_cfg  = TextCnnConfig::new(9, 6, 4, 2, cfg.filter_heights.clone(), cfg.num_features);
        let mut rng    = StdRng::seed_from_u64(0);
        let embeddings = Embeddings::random(9, 4, &mut rng);

        let report = train_loop::<CpuTrainBackend>(
            &cfg, &model_cfg, &embeddings,
            TextDataset::new(samples()), TextDataset::new(samples()),
            &run, backend::cpu_device(),
        )
        .unwrap();

        // 12 samples / batch 4 = 3 steps per epoch, 2 epochs
        assert_eq!(report.steps, 6);
        assert!(report.last_checkpoint.is_some());
        assert!((0.0..=1.0).contains(&report.max_accuracy));

        let train_csv = fs::read_to_string(run.train_summaries().join("scalars.csv")).unwrap();
        assert_eq!(train_csv.lines().count(), 1 + 6);
        let test_csv = fs::read_to_string(run.test_summaries().join("scalars.csv")).unwrap();
        assert_eq!(test_csv.lines().count(), 1 + 2);
        let grads_csv = fs::read_to_string(run.train_summaries().join("gradients.csv")).unwrap();
        assert!(grads_csv.contains("conv-maxpool-3/weight"));

        let ckpt = CheckpointManager::new(run.checkpoints(), 2).unwrap();
        assert_eq!(ckpt.retained(), &[4, 6]);
    }

    #[test]
    fn test_adam_uses_small_epsilon() {
        let adam = adam_config();
        assert!((adam.epsilon - 1e-8).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_counts_every_sample() {
        let device = backend::cpu_device();
        let model: TextCnn<CpuBackend> = TextCnnConfig::new(9, 6, 4, 2, vec![2], 3).init(&device);
        let loader = DataLoaderBuilder::new(TextBatcher::<CpuBackend>::new(device))
            .batch_size(5)
            .build(TextDataset::new(samples()));

        let metrics = evaluate(&model, loader.as_ref());
        assert_eq!(metrics.samples, 12);
        assert!(metrics.loss.is_finite());
        assert!((0.0..=1.0).contains(&metrics.accuracy));
    }
}
