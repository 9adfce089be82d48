// ============================================================
// Layer 5 — Sampler
// ============================================================
// Loads a trained VRNN from a checkpoint and unrolls its prior
// to produce new digit images.
//
// The model architecture is rebuilt from train_config.json,
// then the weights are loaded into it.
//
// The sampling seed is independent of the training seed: without
// one, a fresh seed is drawn and logged so a run can be repeated.

use anyhow::Result;
use burn::prelude::*;

use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::Vrnn;

pub struct Sampler<B: Backend> {
    model:  Vrnn<B>,
    device: B::Device,
}

impl<B: Backend> Sampler<B> {
    /// `epoch = None` loads the latest checkpoint
    pub fn from_checkpoint(
        ckpt_manager: &CheckpointManager,
        epoch:        Option<usize>,
        seed:         Option<u64>,
        device:       &B::Device,
    ) -> Result<Self> {
        let cfg   = ckpt_manager.load_config()?;
        let model: Vrnn<B> = cfg.model_config().init(device);
        let model = ckpt_manager.load_model(model, epoch, device)?;
        tracing::info!("Model loaded from checkpoint");

        let seed = seed.unwrap_or_else(rand::random);
        B::seed(seed);
        tracing::info!("Sampling with seed {}", seed);

        Ok(Self { model, device: device.clone() })
    }

    /// Generate `n` images as flat row-major pixel buffers in [0, 1]
    pub fn sample(&self, n: usize) -> Result<Vec<Vec<f32>>> {
        images_from_tensor(self.model.generate(n, &self.device))
    }

    /// (width, height) of every generated image
    pub fn image_size(&self) -> (usize, usize) {
        (self.model.x_dim, self.model.seq_len)
    }
}

/// Split a [n, rows, cols] tensor into n flat pixel buffers
pub fn images_from_tensor<B: Backend>(t: Tensor<B, 3>) -> Result<Vec<Vec<f32>>> {
    let [n, rows, cols] = t.dims();
    let flat = t
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Cannot read tensor data: {e:?}"))?;

    if n == 0 {
        return Ok(Vec::new());
    }
    Ok(flat.chunks_exact(rows * cols).map(|c| c.to_vec()).collect())
}

/// [a0, b0, a1, b1, ...] — originals next to their reconstructions
pub fn interleave<T>(a: Vec<T>, b: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let mut b = b.into_iter();
    for item in a {
        out.push(item);
        if let Some(other) = b.next() {
            out.push(other);
        }
    }
    out.extend(b);
    out
}
