// ============================================================
// Layer 6 — Summary Writers
// ============================================================
// Records what happens during training as CSV files, one
// directory per phase:
//
//   summaries/train/scalars.csv     step,loss,accuracy
//   summaries/train/gradients.csv   step,param,min,max,mean,sparsity
//   summaries/test/scalars.csv      step,loss,accuracy
//
// Sparsity is the fraction of exactly-zero gradient entries.
// The min/max/mean columns summarise the gradient histogram.

use anyhow::{Context, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Loss and accuracy at one global step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarSummary {
    pub step:     usize,
    pub loss:     f64,
    pub accuracy: f64,
}

impl ScalarSummary {
    pub fn new(step: usize, loss: f64, accuracy: f64) -> Self {
        Self { step, loss, accuracy }
    }
}

/// Statistics of one parameter's gradient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientSummary {
    pub name:     String,
    pub min:      f64,
    pub max:      f64,
    pub mean:     f64,
    pub sparsity: f64,
}

impl GradientSummary {
    pub fn from_tensor<B: Backend, const D: usize>(name: impl Into<String>, grad: Tensor<B, D>) -> Self {
        let numel = grad.shape().num_elements().max(1) as f64;
        let zeros = grad
            .clone()
            .equal_elem(0.0)
            .int()
            .sum()
            .into_scalar()
            .elem::<f64>();

        Self {
            name:     name.into(),
            min:      grad.clone().min().into_scalar().elem::<f64>(),
            max:      grad.clone().max().into_scalar().elem::<f64>(),
            mean:     grad.mean().into_scalar().elem::<f64>(),
            sparsity: zeros / numel,
        }
    }
}

const SCALARS_FILE:   &str = "scalars.csv";
const GRADIENTS_FILE: &str = "gradients.csv";

/// Appends summaries to the CSV files of one phase directory.
pub struct SummaryWriter {
    scalars:   PathBuf,
    gradients: Option<PathBuf>,
}

impl SummaryWriter {
    /// Scalars only (evaluation phase)
    pub fn scalars(dir: impl AsRef<Path>) -> Result<Self> {
        Self::new(dir.as_ref(), false)
    }

    /// Scalars and gradient statistics (training phase)
    pub fn with_gradients(dir: impl AsRef<Path>) -> Result<Self> {
        Self::new(dir.as_ref(), true)
    }

    fn new(dir: &Path, gradients: bool) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let scalars = dir.join(SCALARS_FILE);
        write_header(&scalars, "step,loss,accuracy")?;

        let gradients = if gradients {
            let path = dir.join(GRADIENTS_FILE);
            write_header(&path, "step,param,min,max,mean,sparsity")?;
            Some(path)
        } else {
            None
        };

        Ok(Self { scalars, gradients })
    }

    pub fn add_scalars(&self, s: &ScalarSummary) -> Result<()> {
        let mut f = append(&self.scalars)?;
        writeln!(f, "{},{:.6},{:.6}", s.step, s.loss, s.accuracy)?;
        Ok(())
    }

    /// No-op for a scalars-only writer.
    pub fn add_gradients(&self, step: usize, grads: &[GradientSummary]) -> Result<()> {
        let Some(path) = &self.gradients else { return Ok(()) };
        let mut f = append(path)?;
        for g in grads {
            writeln!(
                f,
                "{},{},{:.6e},{:.6e},{:.6e},{:.6}",
                step, g.name, g.min, g.max, g.mean, g.sparsity
            )?;
        }
        Ok(())
    }
}

fn write_header(path: &Path, header: &str) -> Result<()> {
    if !path.exists() {
        let mut f = fs::File::create(path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        writeln!(f, "{header}")?;
        tracing::debug!("Created summary file '{}'", path.display());
    }
    Ok(())
}

fn append(path: &Path) -> Result<fs::File> {
    OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot append to '{}'", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use tempfile::tempdir;

    #[test]
    fn test_scalars_are_appended_after_header() {
        let tmp    = tempdir().unwrap();
        let writer = SummaryWriter::scalars(tmp.path()).unwrap();
        writer.add_scalars(&ScalarSummary::new(100, 1.5, 0.25)).unwrap();
        writer.add_scalars(&ScalarSummary::new(200, 1.0, 0.5)).unwrap();

        let csv   = fs::read_to_string(tmp.path().join(SCALARS_FILE)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "step,loss,accuracy");
        assert_eq!(lines[2], "200,1.000000,0.500000");
    }

    #[test]
    fn test_gradient_rows() {
        let tmp    = tempdir().unwrap();
        let writer = SummaryWriter::with_gradients(tmp.path()).unwrap();
        let grads  = vec![GradientSummary {
            name: "output/weight".into(), min: -1.0, max: 1.0, mean: 0.0, sparsity: 0.5,
        }];
        writer.add_gradients(7, &grads).unwrap();

        let csv = fs::read_to_string(tmp.path().join(GRADIENTS_FILE)).unwrap();
        assert!(csv.lines().nth(1).unwrap().starts_with("7,output/weight,"));
    }

    #[test]
    fn test_gradient_summary_statistics() {
        let device = Default::default();
        let grad   = Tensor::<NdArray, 2>::from_data(
            TensorData::new(vec![0.0f32, 2.0, 0.0, -2.0], [2, 2]),
            &device,
        );
        let s = GradientSummary::from_tensor("w", grad);
        assert_eq!(s.sparsity, 0.5);
        assert_eq!(s.min, -2.0);
        assert_eq!(s.max, 2.0);
        assert_eq!(s.mean, 0.0);
    }
}
