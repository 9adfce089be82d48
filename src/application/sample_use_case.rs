// ============================================================
// Layer 2 — SampleUseCase
// ============================================================
// Generates new digits from a trained checkpoint:
//
//   Step 1: Resolve which epoch to load (given, best, or latest)
//   Step 2: Rebuild the model and load its weights (Layer 5)
//   Step 3: Unroll the prior for n sequences         (Layer 5)
//   Step 4: Tile them into one PNG                   (Layer 6)

use anyhow::Result;
use burn::prelude::*;
use std::path::Path;

use crate::infra::{checkpoint::CheckpointManager, image_writer::ImageWriter};
use crate::ml::sampler::Sampler;

/// Which checkpoint to sample from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochChoice {
    Latest,
    Best,
    Epoch(usize),
}

pub struct SampleUseCase {
    ckpt_manager: CheckpointManager,
    choice:       EpochChoice,
    seed:         Option<u64>,
}

impl SampleUseCase {
    pub fn new(checkpoint_dir: impl Into<String>, choice: EpochChoice, seed: Option<u64>) -> Result<Self> {
        let ckpt_manager = CheckpointManager::new(checkpoint_dir)?;
        Ok(Self { ckpt_manager, choice, seed })
    }

    /// Generate `num_samples` digits into `output` on the GPU; returns the epoch used
    pub fn execute(&self, num_samples: usize, output: &Path) -> Result<usize> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        self.execute_on::<burn::backend::Wgpu>(num_samples, output, &device)
    }

    pub fn execute_on<B: Backend>(&self, num_samples: usize, output: &Path, device: &B::Device) -> Result<usize> {
        if num_samples == 0 {
            anyhow::bail!("num_samples must be at least 1");
        }

        let epoch = match self.choice {
            EpochChoice::Latest   => self.ckpt_manager.latest_epoch()?,
            EpochChoice::Best     => self.ckpt_manager.best_epoch()?,
            EpochChoice::Epoch(e) => e,
        };

        let sampler = Sampler::<B>::from_checkpoint(&self.ckpt_manager, Some(epoch), self.seed, device)?;
        let images  = sampler.sample(num_samples)?;
        let (width, height) = sampler.image_size();

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        ImageWriter::write_to(output, &images, width, height)?;
        tracing::info!("Wrote {} samples from epoch {} to '{}'", images.len(), epoch, output.display());
        Ok(epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::ml::model::Vrnn;
    use burn::backend::NdArray;
    use std::path::PathBuf;

    type TestBackend = NdArray<f32>;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vrnn-sample-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    /// Two saved epochs, epoch 1 marked best
    fn trained_checkpoints(dir: &Path) {
        let manager = CheckpointManager::new(dir.to_string_lossy().into_owned()).unwrap();
        let cfg = TrainConfig { h_dim: 8, z_dim: 4, ..TrainConfig::default() };
        manager.save_config(&cfg).unwrap();

        let model: Vrnn<TestBackend> = cfg.model_config().init(&Default::default());
        manager.save_model(&model, 1).unwrap();
        manager.save_model(&model, 2).unwrap();
        manager.mark_best(1).unwrap();
    }

    fn run(dir: &Path, choice: EpochChoice, output: &Path) -> Result<usize> {
        let use_case = SampleUseCase::new(dir.to_string_lossy().into_owned(), choice, Some(5))?;
        use_case.execute_on::<TestBackend>(3, output, &Default::default())
    }

    #[test]
    fn test_resolves_latest_best_and_explicit_epoch() {
        let dir = temp_dir("choice");
        trained_checkpoints(&dir);

        assert_eq!(run(&dir, EpochChoice::Latest, &dir.join("latest.png")).unwrap(), 2);
        assert_eq!(run(&dir, EpochChoice::Best, &dir.join("best.png")).unwrap(), 1);
        assert_eq!(run(&dir, EpochChoice::Epoch(1), &dir.join("one.png")).unwrap(), 1);
        assert!(dir.join("latest.png").exists());
        assert!(dir.join("best.png").exists());
    }

    #[test]
    fn test_output_parent_is_created() {
        let dir = temp_dir("nested");
        trained_checkpoints(&dir);

        let output = dir.join("out").join("grid.png");
        run(&dir, EpochChoice::Latest, &output).unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_zero_samples_is_rejected() {
        let dir = temp_dir("zero");
        trained_checkpoints(&dir);

        let use_case = SampleUseCase::new(dir.to_string_lossy().into_owned(), EpochChoice::Latest, None).unwrap();
        assert!(use_case.execute_on::<TestBackend>(0, &dir.join("none.png"), &Default::default()).is_err());
        assert!(!dir.join("none.png").exists());
    }

    #[test]
    fn test_unknown_epoch_is_an_error() {
        let dir = temp_dir("unknown");
        trained_checkpoints(&dir);
        assert!(run(&dir, EpochChoice::Epoch(9), &dir.join("nine.png")).is_err());
    }
}
