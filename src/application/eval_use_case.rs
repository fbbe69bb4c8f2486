// ============================================================
// Layer 2 — Evaluate / Predict Use Case
// ============================================================
// Works on the folder of a finished training run:
//
//   evaluate — rebuilds the test subset the way training did and
//              reports loss and accuracy of the latest checkpoint
//   predict  — classifies free text
//
// The run's config.json supplies the defaults (data dir, device).

use anyhow::Result;
use burn::prelude::Backend;
use std::path::{Path, PathBuf};

use crate::application::train_use_case::{prepare_test_corpus, TrainConfig};
use crate::data::{dataset::TextSample, loader::Text20News};
use crate::domain::traits::Prediction;
use crate::infra::run_dir::RunDir;
use crate::ml::{
    backend::{self, DeviceKind},
    inferencer::Inferencer,
    trainer::EvalMetrics,
};

pub struct EvalUseCase {
    run:    RunDir,
    config: TrainConfig,
    device: DeviceKind,
}

impl EvalUseCase {
    /// Open `run_dir`; `device` overrides the one the run was trained on.
    pub fn new(run_dir: impl Into<PathBuf>, device: Option<DeviceKind>) -> Result<Self> {
        let run = RunDir::open(run_dir)?;
        let config: TrainConfig = run.load_json(&run.config_path())?;
        let device = device.unwrap_or(config.device);
        Ok(Self { run, config, device })
    }

    /// Loss and accuracy over the test subset of `data_dir`
    /// (the training data dir when `None`).
    pub fn evaluate(&self, data_dir: Option<&Path>, batch_size: usize) -> Result<EvalMetrics> {
        let data_dir = data_dir.unwrap_or(&self.config.data_dir);
        match self.device {
            DeviceKind::Wgpu => evaluate_with::<backend::WgpuBackend>(
                &self.run, backend::wgpu_device(), data_dir, batch_size,
            ),
            DeviceKind::Cpu => evaluate_with::<backend::CpuBackend>(
                &self.run, backend::cpu_device(), data_dir, batch_size,
            ),
        }
    }

    pub fn predict(&self, texts: &[&str]) -> Result<Vec<Prediction>> {
        match self.device {
            DeviceKind::Wgpu => {
                Inferencer::<backend::WgpuBackend>::from_run(&self.run, backend::wgpu_device())?
                    .predict(texts)
            }
            DeviceKind::Cpu => {
                Inferencer::<backend::CpuBackend>::from_run(&self.run, backend::cpu_device())?
                    .predict(texts)
            }
        }
    }
}

fn evaluate_with<B: Backend>(
    run:        &RunDir,
    device:     B::Device,
    data_dir:   &Path,
    batch_size: usize,
) -> Result<EvalMetrics> {
    let inferencer = Inferencer::<B>::from_run(run, device)?;

    let test = prepare_test_corpus(&Text20News::new(data_dir), None)?;
    if test.class_names != inferencer.class_names() {
        anyhow::bail!(
            "Classes in '{}' do not match the {} classes the model was trained on",
            data_dir.display(),
            inferencer.class_names().len()
        );
    }

    let samples: Vec<TextSample> = inferencer
        .vocab()
        .transform(&test.texts())
        .into_iter()
        .zip(test.labels())
        .map(|(ids, label)| TextSample::new(ids, label))
        .collect();

    tracing::info!("Evaluating on {} test documents", samples.len());
    let metrics = inferencer.evaluate(samples, batch_size)?;
    tracing::info!("Loss {:.6}, Accuracy {:.4}", metrics.loss, metrics.accuracy);
    Ok(metrics)
}
