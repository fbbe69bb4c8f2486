// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`    — trains a text CNN, writing a new run directory
//   2. `evaluate` — scores a run's latest checkpoint on the test set
//   3. `predict`  — classifies text with a run's latest checkpoint
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "news-text-cnn",
    version,
    about = "Train a convolutional text classifier on 20 Newsgroups, then evaluate or query it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on corpus in: {}", args.data_dir.display());

    let report = TrainUseCase::new(args.into()).execute()?;

    println!("Training complete after {} steps.", report.steps);
    println!("Max. test accuracy: {:.4}", report.max_accuracy);
    println!("Run directory: {}", report.run_dir.display());
    if let Some(ckpt) = report.last_checkpoint {
        println!("Last checkpoint: {}", ckpt.display());
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::eval_use_case::EvalUseCase;

    let use_case = EvalUseCase::new(args.run_dir, args.device.map(Into::into))?;
    let metrics  = use_case.evaluate(args.data_dir.as_deref(), args.batch_size)?;

    println!("Test documents: {}", metrics.samples);
    println!("Loss:           {:.6}", metrics.loss);
    println!("Accuracy:       {:.4}", metrics.accuracy);
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::eval_use_case::EvalUseCase;

    let use_case = EvalUseCase::new(args.run_dir, args.device.map(Into::into))?;
    let texts: Vec<&str> = args.text.iter().map(String::as_str).collect();

    for (text, p) in texts.iter().zip(use_case.predict(&texts)?) {
        println!("{}\t{:.4}\t{}", p.class_name, p.confidence, text);
    }
    Ok(())
}
