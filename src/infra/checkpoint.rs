// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores VRNN weights using Burn's CompactRecorder.
//
// File layout:
//   checkpoints/
//     model_epoch_1.mpk.gz   ← weights after epoch 1
//     model_epoch_2.mpk.gz   ← weights after epoch 2
//     ...
//     latest_epoch.json      ← number of the last saved epoch
//     best_epoch.json        ← epoch with the lowest test loss
//     train_config.json      ← hyperparameters to rebuild the model
//
// The sampler reads train_config.json first, builds a model of
// the same shape, then loads the weights into it.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::Vrnn;

const LATEST_FILE: &str = "latest_epoch.json";
const BEST_FILE:   &str = "best_epoch.json";
const CONFIG_FILE: &str = "train_config.json";

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if needed.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Save model weights for a given epoch and point `latest` at it.
    pub fn save_model<B: Backend>(&self, model: &Vrnn<B>, epoch: usize) -> Result<()> {
        // Recorder adds the .mpk.gz extension
        let path = self.model_path(epoch);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        self.write_pointer(LATEST_FILE, epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load weights into `model`. `epoch = None` means the latest one.
    ///
    /// The model must have the same architecture as the checkpoint.
    pub fn load_model<B: Backend>(
        &self,
        model:  Vrnn<B>,
        epoch:  Option<usize>,
        device: &B::Device,
    ) -> Result<Vrnn<B>> {
        let epoch = match epoch {
            Some(e) => e,
            None    => self.latest_epoch()?,
        };
        let path = self.model_path(epoch);

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Record `epoch` as the best one so far
    pub fn mark_best(&self, epoch: usize) -> Result<()> {
        self.write_pointer(BEST_FILE, epoch)
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| {
                format!("Cannot write config to '{}'", path.display())
            })?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration from JSON.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'sample'.",
                    path.display()
                )
            })?;

        Ok(serde_json::from_str(&json)?)
    }

    pub fn latest_epoch(&self) -> Result<usize> {
        self.read_pointer(LATEST_FILE)
    }

    pub fn best_epoch(&self) -> Result<usize> {
        self.read_pointer(BEST_FILE)
    }

    fn model_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("model_epoch_{epoch}"))
    }

    fn write_pointer(&self, name: &str, epoch: usize) -> Result<()> {
        fs::write(self.dir.join(name), serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write {name}"))
    }

    fn read_pointer(&self, name: &str) -> Result<usize> {
        let s = fs::read_to_string(self.dir.join(name))
            .with_context(|| format!("Cannot find '{name}'. Have you run 'train' first?"))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}
