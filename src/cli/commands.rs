// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `sample`, and all
// their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::sample_use_case::EpochChoice;
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the VRNN on MNIST rows-as-sequences
    Train(TrainArgs),

    /// Generate digits from a trained checkpoint
    Sample(SampleArgs),
}

/// All arguments for the `train` command
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory for metrics.csv and sample/reconstruction PNGs
    #[arg(long, default_value = "logs")]
    pub log_dir: String,

    /// Directory to save model checkpoints
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Number of sequences per mini-batch
    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Number of full passes through the training split
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Width of the hidden state and of the phi_x / phi_z features
    #[arg(long, default_value_t = 100)]
    pub h_dim: usize,

    /// Width of the per-timestep latent variable
    #[arg(long, default_value_t = 64)]
    pub z_dim: usize,

    /// Seed for tensor sampling, shuffling and subset selection
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Images generated (and reconstructed) per epoch
    #[arg(long, default_value_t = 32)]
    pub num_samples: usize,

    /// DataLoader worker threads
    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    /// Threshold pixels at 0.5 instead of using grey levels
    #[arg(long)]
    pub binarize: bool,

    /// Use at most this many training images
    #[arg(long)]
    pub train_limit: Option<usize>,

    /// Use at most this many test images
    #[arg(long)]
    pub test_limit: Option<usize>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            log_dir:        a.log_dir,
            checkpoint_dir: a.checkpoint_dir,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            h_dim:          a.h_dim,
            z_dim:          a.z_dim,
            seed:           a.seed,
            num_samples:    a.num_samples,
            num_workers:    a.num_workers,
            binarize:       a.binarize,
            train_limit:    a.train_limit,
            test_limit:     a.test_limit,
        }
    }
}

/// All arguments for the `sample` command
#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Epoch to load (defaults to the latest)
    #[arg(long, conflicts_with = "best")]
    pub epoch: Option<usize>,

    /// Load the epoch with the lowest test loss
    #[arg(long)]
    pub best: bool,

    /// Number of digits to generate
    #[arg(long, default_value_t = 64)]
    pub num_samples: usize,

    /// PNG file to write
    #[arg(long, default_value = "samples.png")]
    pub output: PathBuf,

    /// Sampling seed; a fresh one is drawn when omitted
    #[arg(long)]
    pub seed: Option<u64>,
}

impl SampleArgs {
    pub fn epoch_choice(&self) -> EpochChoice {
        match (self.epoch, self.best) {
            (Some(e), _) => EpochChoice::Epoch(e),
            (None, true) => EpochChoice::Best,
            (None, false) => EpochChoice::Latest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::parse_from(["vrnn-mnist", "train"]);
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        let def = TrainConfig::default();

        assert_eq!(cfg.batch_size, def.batch_size);
        assert_eq!(cfg.epochs, def.epochs);
        assert_eq!(cfg.h_dim, def.h_dim);
        assert_eq!(cfg.z_dim, def.z_dim);
        assert_eq!(cfg.lr, def.lr);
        assert_eq!(cfg.train_limit, None);
        assert!(!cfg.binarize);
    }

    #[test]
    fn test_train_flags_are_parsed() {
        let cli = Cli::parse_from([
            "vrnn-mnist", "train", "--epochs", "2", "--h-dim", "32",
            "--binarize", "--train-limit", "500",
        ]);
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.epochs, 2);
        assert_eq!(cfg.h_dim, 32);
        assert!(cfg.binarize);
        assert_eq!(cfg.train_limit, Some(500));
    }

    #[test]
    fn test_sample_epoch_choice() {
        let pick = |argv: &[&str]| {
            let cli = Cli::parse_from(argv);
            let Commands::Sample(args) = cli.command else { panic!("expected sample") };
            args.epoch_choice()
        };
        assert_eq!(pick(&["vrnn-mnist", "sample"]), EpochChoice::Latest);
        assert_eq!(pick(&["vrnn-mnist", "sample", "--best"]), EpochChoice::Best);
        assert_eq!(pick(&["vrnn-mnist", "sample", "--epoch", "4"]), EpochChoice::Epoch(4));
    }

    #[test]
    fn test_sample_seed_is_optional() {
        let seed = |argv: &[&str]| {
            let cli = Cli::parse_from(argv);
            let Commands::Sample(args) = cli.command else { panic!("expected sample") };
            args.seed
        };
        assert_eq!(seed(&["vrnn-mnist", "sample"]), None);
        assert_eq!(seed(&["vrnn-mnist", "sample", "--seed", "42"]), Some(42));
    }

    #[test]
    fn test_epoch_and_best_conflict() {
        assert!(Cli::try_parse_from(["vrnn-mnist", "sample", "--epoch", "1", "--best"]).is_err());
    }
}
