// ============================================================
// Layer 6 — Run Directory
// ============================================================
// Every training run writes into its own timestamped folder:
//
//   runs/v1/1700000000/
//     summaries/train/     scalars.csv, gradients.csv
//     summaries/test/      scalars.csv
//     checkpoints/         model-<step>.*, checkpoint.json
//     vocab.json           vocabulary (HuggingFace tokenizer format)
//     labels.json          class names, indexed by label
//     config.json          TrainConfig of the run
//     model_config.json    TextCnnConfig of the run

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

/// Model family folder under the runs directory
const RUN_FAMILY: &str = "v1";

#[derive(Debug, Clone)]
pub struct RunDir {
    root: PathBuf,
}

impl RunDir {
    /// Create `<runs_dir>/v1/<unix-seconds>` and its sub-folders.
    pub fn create(runs_dir: impl AsRef<Path>) -> Result<Self> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("System clock is before the Unix epoch")?
            .as_secs();
        let root = runs_dir.as_ref().join(RUN_FAMILY).join(timestamp.to_string());
        Self::create_at(root)
    }

    /// Create the layout under an explicit root.
    pub fn create_at(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let run  = Self { root };
        for dir in [run.train_summaries(), run.test_summaries(), run.checkpoints()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }
        let root = fs::canonicalize(&run.root).unwrap_or_else(|_| run.root.clone());
        tracing::info!("Writing to {}", root.display());
        Ok(Self { root })
    }

    /// Open the folder of a finished run.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            anyhow::bail!(
                "Run directory '{}' does not exist. Have you run 'train' first?",
                root.display()
            );
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn train_summaries(&self) -> PathBuf {
        self.root.join("summaries").join("train")
    }

    pub fn test_summaries(&self) -> PathBuf {
        self.root.join("summaries").join("test")
    }

    pub fn checkpoints(&self) -> PathBuf {
        self.root.join("checkpoints")
    }

    pub fn vocab_path(&self) -> PathBuf {
        self.root.join("vocab.json")
    }

    pub fn labels_path(&self) -> PathBuf {
        self.root.join("labels.json")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn model_config_path(&self) -> PathBuf {
        self.root.join("model_config.json")
    }

    /// Pretty-print `value` as JSON to `path`.
    pub fn save_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    pub fn load_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_builds_layout() {
        let tmp = tempdir().unwrap();
        let run = RunDir::create(tmp.path()).unwrap();

        assert!(run.root().starts_with(fs::canonicalize(tmp.path()).unwrap().join("v1")));
        assert!(run.train_summaries().is_dir());
        assert!(run.test_summaries().is_dir());
        assert!(run.checkpoints().is_dir());
    }

    #[test]
    fn test_json_round_trip_through_run_dir() {
        let tmp = tempdir().unwrap();
        let run = RunDir::create_at(tmp.path().join("run")).unwrap();
        let labels = vec!["alt.atheism".to_string(), "sci.space".to_string()];

        run.save_json(&run.labels_path(), &labels).unwrap();
        let back: Vec<String> = run.load_json(&run.labels_path()).unwrap();
        assert_eq!(back, labels);
    }

    #[test]
    fn test_open_missing_run_fails() {
        let tmp = tempdir().unwrap();
        assert!(RunDir::open(tmp.path().join("nope")).is_err());
    }
}
