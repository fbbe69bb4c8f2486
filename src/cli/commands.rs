// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `evaluate` and
// `predict`, and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::ml::backend::DeviceKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the text CNN on the 20 Newsgroups corpus
    Train(TrainArgs),

    /// Evaluate a trained run on the test subset
    Evaluate(EvaluateArgs),

    /// Classify text with a trained run
    Predict(PredictArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceArg {
    /// GPU through WGPU
    Wgpu,
    /// NdArray on the CPU
    Cpu,
}

impl From<DeviceArg> for DeviceKind {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Wgpu => DeviceKind::Wgpu,
            DeviceArg::Cpu  => DeviceKind::Cpu,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding 20news-bydate-train and 20news-bydate-test
    #[arg(long, default_value = "data/20news")]
    pub data_dir: PathBuf,

    /// Pre-trained word2vec file (binary, or text for .txt/.vec)
    #[arg(long, default_value = "data/GoogleNews-vectors-negative300.bin")]
    pub embedding_file: PathBuf,

    /// Skip the word2vec file and start from random embeddings
    #[arg(long)]
    pub random_embeddings: bool,

    /// Dimensionality of the word embeddings
    #[arg(long, default_value_t = 300)]
    pub embedding_dim: usize,

    /// Comma-separated convolution filter heights
    #[arg(long, value_delimiter = ',', default_value = "3,4,5")]
    pub filter_heights: Vec<usize>,

    /// Number of features per filter height
    #[arg(long, default_value_t = 128)]
    pub num_features: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 200)]
    pub num_epochs: usize,

    /// Probability of keeping an activation in the dropout layer
    #[arg(long, default_value_t = 0.5)]
    pub dropout_keep_prob: f64,

    /// L2 regularization strength on the output layer
    #[arg(long, default_value_t = 0.0)]
    pub l2_reg_lambda: f64,

    /// Evaluate on the test set after this many steps
    #[arg(long, default_value_t = 100)]
    pub evaluate_every: usize,

    /// Save a checkpoint after this many steps
    #[arg(long, default_value_t = 100)]
    pub checkpoint_every: usize,

    /// Number of checkpoints to keep
    #[arg(long, default_value_t = 5)]
    pub num_checkpoints: usize,

    /// Training documents with fewer words are dropped
    #[arg(long, default_value_t = 20)]
    pub min_words: usize,

    /// Root folder of the timestamped run directories
    #[arg(long, default_value = "runs")]
    pub runs_dir: PathBuf,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = DeviceArg::Wgpu)]
    pub device: DeviceArg,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:          a.data_dir,
            embedding_file:    (!a.random_embeddings).then_some(a.embedding_file),
            embedding_dim:     a.embedding_dim,
            filter_heights:    a.filter_heights,
            num_features:      a.num_features,
            learning_rate:     a.learning_rate,
            batch_size:        a.batch_size,
            num_epochs:        a.num_epochs,
            dropout_keep_prob: a.dropout_keep_prob,
            l2_reg_lambda:     a.l2_reg_lambda,
            evaluate_every:    a.evaluate_every,
            checkpoint_every:  a.checkpoint_every,
            num_checkpoints:   a.num_checkpoints,
            min_words:         a.min_words,
            runs_dir:          a.runs_dir,
            seed:              a.seed,
            device:            a.device.into(),
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Folder of a finished run, e.g. runs/v1/1700000000
    #[arg(long)]
    pub run_dir: PathBuf,

    /// Corpus directory (defaults to the one used for training)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Device override (defaults to the one used for training)
    #[arg(long, value_enum)]
    pub device: Option<DeviceArg>,
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Folder of a finished run, e.g. runs/v1/1700000000
    #[arg(long)]
    pub run_dir: PathBuf,

    /// Text to classify; repeat the flag for several texts
    #[arg(long, required = true)]
    pub text: Vec<String>,

    #[arg(long, value_enum)]
    pub device: Option<DeviceArg>,
}
