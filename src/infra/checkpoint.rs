// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// File layout inside the run's checkpoints/ folder:
//
//   model-100.mpk        ← weights after global step 100
//   model-200.mpk
//   ...
//   checkpoint.json      ← {"latest": 500, "all": [100, ..., 500]}
//
// At most `max_to_keep` checkpoints are kept on disk; saving one
// more deletes the oldest. The recorder picks the file extension,
// so deletion removes every file named `model-<step>.*`.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::ml::model::TextCnn;

const STATE_FILE: &str = "checkpoint.json";

/// Pointer file listing the retained checkpoints, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CheckpointState {
    latest: Option<usize>,
    all:    Vec<usize>,
}

pub struct CheckpointManager {
    dir:         PathBuf,
    max_to_keep: usize,
    state:       CheckpointState,
}

impl CheckpointManager {
    /// Manage the checkpoints in `dir`, creating it if needed and
    /// picking up any checkpoints already listed there.
    pub fn new(dir: impl Into<PathBuf>, max_to_keep: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;

        let state_path = dir.join(STATE_FILE);
        let state = if state_path.exists() {
            let json = fs::read_to_string(&state_path)
                .with_context(|| format!("Cannot read '{}'", state_path.display()))?;
            serde_json::from_str(&json)?
        } else {
            CheckpointState::default()
        };

        Ok(Self { dir, max_to_keep: max_to_keep.max(1), state })
    }

    /// Read-only view of an existing checkpoint folder.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            anyhow::bail!("Checkpoint directory '{}' does not exist", dir.display());
        }
        Self::new(dir, usize::MAX)
    }

    /// Path prefix (no extension) of the checkpoint for `step`
    pub fn checkpoint_path(&self, step: usize) -> PathBuf {
        self.dir.join(format!("model-{step}"))
    }

    /// Steps of the checkpoints currently kept, oldest first
    pub fn retained(&self) -> &[usize] {
        &self.state.all
    }

    pub fn latest_step(&self) -> Option<usize> {
        self.state.latest
    }

    /// Save model weights for a global step and apply retention.
    pub fn save<B: Backend>(&mut self, model: &TextCnn<B>, step: usize) -> Result<PathBuf> {
        let path = self.checkpoint_path(step);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.state.all.retain(|&s| s != step);
        self.state.all.push(step);
        self.state.latest = Some(step);

        while self.state.all.len() > self.max_to_keep {
            let oldest = self.state.all.remove(0);
            remove_checkpoint_files(&self.dir, oldest)?;
            tracing::debug!("Deleted checkpoint for step {}", oldest);
        }

        self.write_state()?;
        Ok(path)
    }

    /// Load weights from the most recent checkpoint into `model`.
    pub fn load_latest<B: Backend>(&self, model: TextCnn<B>, device: &B::Device) -> Result<TextCnn<B>> {
        let step = self.latest_step().with_context(|| {
            format!(
                "No checkpoint listed in '{}'. Have you run 'train' first?",
                self.dir.join(STATE_FILE).display()
            )
        })?;
        let path = self.checkpoint_path(step);

        tracing::info!("Loading checkpoint from step {}", step);
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        Ok(model.load_record(record))
    }

    fn write_state(&self) -> Result<()> {
        let path = self.dir.join(STATE_FILE);
        fs::write(&path, serde_json::to_string_pretty(&self.state)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }
}

fn remove_checkpoint_files(dir: &Path, step: usize) -> Result<()> {
    let prefix = format!("model-{step}.");
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&prefix));
        if matches {
            fs::remove_file(&path)
                .with_context(|| format!("Cannot delete '{}'", path.display()))?;
        }
    }
    Ok(())
}
