// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
//
//   1. `train`  — trains the VRNN on MNIST and logs curves/images
//   2. `sample` — loads a checkpoint and writes generated digits
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, SampleArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "vrnn-mnist",
    version = "0.1.0",
    about = "Train a Variational Recurrent Neural Network on MNIST rows, then sample digits."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case; the CLI layer only routes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)  => run_train(args),
            Commands::Sample(args) => run_sample(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training, logging to: {}", args.log_dir);

    let summary = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training complete after {} epochs. Best test loss {:.4} at epoch {} (final {:.4}).",
        summary.epochs, summary.best_loss, summary.best_epoch, summary.final_loss,
    );
    Ok(())
}

fn run_sample(args: SampleArgs) -> Result<()> {
    use crate::application::sample_use_case::SampleUseCase;

    let use_case = SampleUseCase::new(args.checkpoint_dir.clone(), args.epoch_choice(), args.seed)?;
    let epoch = use_case.execute(args.num_samples, &args.output)?;

    println!("Wrote {} samples from epoch {} to {}", args.num_samples, epoch, args.output.display());
    Ok(())
}
