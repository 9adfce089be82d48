// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration
//   Step 2: Load MNIST train/test     (Layer 4 - data)
//   Step 3: Scale pixels to [0, 1]    (Layer 4 - data)
//   Step 4: Build datasets            (Layer 4 - data)
//   Step 5: Save config               (Layer 6 - infra)
//   Step 6: Open metrics + image sinks(Layer 6 - infra)
//   Step 7: Run training loop         (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::SequenceDataset,
    loader::{MnistLoader, Split},
    preprocessor::Preprocessor,
};
use crate::domain::digit::{ROW_WIDTH, SEQ_LEN};
use crate::domain::traits::ImageSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    image_writer::ImageWriter,
    metrics::MetricsLogger,
};
use crate::ml::model::VrnnConfig;
use crate::ml::trainer::{run_training, TrainingSummary};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved next to the checkpoints so the sampler can rebuild the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub log_dir:        String,
    pub checkpoint_dir: String,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub h_dim:          usize,
    pub z_dim:          usize,
    pub seed:           u64,
    pub num_samples:    usize,
    pub num_workers:    usize,
    pub binarize:       bool,
    pub train_limit:    Option<usize>,
    pub test_limit:     Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            log_dir:        "logs".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            batch_size:     128,
            epochs:         10,
            lr:             1e-3,
            h_dim:          100,
            z_dim:          64,
            seed:           1,
            num_samples:    32,
            num_workers:    1,
            binarize:       false,
            train_limit:    None,
            test_limit:     None,
        }
    }
}

impl TrainConfig {
    /// Reject settings that would make the run meaningless or panic later
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be at least 1");
        }
        if self.epochs == 0 {
            anyhow::bail!("epochs must be at least 1");
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            anyhow::bail!("lr must be a positive number, got {}", self.lr);
        }
        if self.h_dim == 0 || self.z_dim == 0 {
            anyhow::bail!("h_dim and z_dim must be non-zero");
        }
        if self.num_samples == 0 {
            anyhow::bail!("num_samples must be at least 1");
        }
        // DataLoaderBuilder splits the dataset across workers
        if self.num_workers == 0 {
            anyhow::bail!("num_workers must be at least 1");
        }
        Ok(())
    }

    /// Model architecture implied by this run. Row width and
    /// sequence length are fixed by the image size.
    pub fn model_config(&self) -> VrnnConfig {
        VrnnConfig::new()
            .with_x_dim(ROW_WIDTH)
            .with_seq_len(SEQ_LEN)
            .with_h_dim(self.h_dim)
            .with_z_dim(self.z_dim)
    }
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
    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Load MNIST ───────────────────────────────────────────────
        tracing::info!("Loading MNIST (downloaded to the Burn cache on first use)");
        let train_images = MnistLoader::new(Split::Train)
            .with_limit(cfg.train_limit, cfg.seed)
            .load_all()?;
        let test_images = MnistLoader::new(Split::Test)
            .with_limit(cfg.test_limit, cfg.seed)
            .load_all()?;

        // ── Step 3: Preprocess ────────────────────────────────────────────────
        let preprocessor  = Preprocessor::new(cfg.binarize);
        let train_samples = preprocessor.process_all(&train_images);
        let test_samples  = preprocessor.process_all(&test_images);
        if train_samples.is_empty() {
            anyhow::bail!("no usable training images");
        }
        tracing::info!(
            "Prepared {} train / {} test sequences of {} rows x {} pixels",
            train_samples.len(),
            test_samples.len(),
            SEQ_LEN,
            ROW_WIDTH,
        );

        // ── Step 4: Build Burn datasets ───────────────────────────────────────
        let train_dataset = SequenceDataset::new(train_samples);
        let test_dataset  = SequenceDataset::new(test_samples);

        // ── Step 5: Save config for sampling ─────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_config(cfg)?;

        // ── Step 6: Metrics and image output ─────────────────────────────────
        let metrics = MetricsLogger::new(&cfg.log_dir)?;
        let images  = ImageWriter::new(&cfg.log_dir)?;
        tracing::info!("Writing metrics to '{}'", metrics.csv_path().display());

        // ── Step 7: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, train_dataset, test_dataset, ckpt_manager, metrics, images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let base = TrainConfig::default();
        assert!(TrainConfig { batch_size: 0, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { epochs: 0, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { lr: 0.0, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { lr: f64::NAN, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { z_dim: 0, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { num_samples: 0, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { num_workers: 0, ..base }.validate().is_err());
    }

    #[test]
    fn test_model_config_uses_image_geometry() {
        let cfg = TrainConfig { h_dim: 50, z_dim: 10, ..TrainConfig::default() };
        let model_cfg = cfg.model_config();
        assert_eq!(model_cfg.x_dim, ROW_WIDTH);
        assert_eq!(model_cfg.seq_len, SEQ_LEN);
        assert_eq!(model_cfg.h_dim, 50);
        assert_eq!(model_cfg.z_dim, 10);
    }

    #[test]
    fn test_config_json_keeps_optional_limits() {
        let cfg = TrainConfig { train_limit: Some(1000), ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.train_limit, Some(1000));
        assert_eq!(back.test_limit, None);
    }
}
