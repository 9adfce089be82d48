// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Variational inference driver for the VRNN.
//
//   train_step — forward, negative ELBO, backward, Adam update
//   test_step  — forward only, on the inner (non-autodiff) model
//
// Per epoch:
//   1. train_step over shuffled training batches
//   2. test_step over the test split with model.valid()
//   3. sample-weighted mean losses → metrics CSV + log line
//   4. generated samples + reconstructions → PNG grids
//   5. checkpoint, and move the `best` pointer on improvement
//
// Training uses MyBackend (Autodiff<Wgpu>); model.valid()
// returns the same model on MyInnerBackend (Wgpu), so the test
// batcher is built for the inner backend.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::{batcher::Batcher, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{SequenceBatch, SequenceBatcher},
    dataset::SequenceDataset,
};
use crate::domain::traits::ImageSink;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{Vrnn, VrnnOutput};
use crate::ml::sampler::{images_from_tensor, interleave};

type MyBackend      = burn::backend::Autodiff<burn::backend::Wgpu>;
type MyInnerBackend = burn::backend::Wgpu;

/// Loss components of one batch (or one epoch, once averaged)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchStats {
    pub loss: f64,
    pub nll:  f64,
    pub kl:   f64,
}

impl BatchStats {
    fn from_output<B: Backend>(out: &VrnnOutput<B>) -> Self {
        Self {
            loss: out.loss.clone().into_scalar().elem::<f64>(),
            nll:  out.nll.clone().into_scalar().elem::<f64>(),
            kl:   out.kl.clone().into_scalar().elem::<f64>(),
        }
    }

    fn nan() -> Self {
        Self { loss: f64::NAN, nll: f64::NAN, kl: f64::NAN }
    }
}

/// Sample-weighted running mean, so a short last batch
/// counts for what it holds.
#[derive(Debug, Default)]
pub struct LossMeter {
    loss_sum: f64,
    nll_sum:  f64,
    kl_sum:   f64,
    samples:  usize,
}

impl LossMeter {
    pub fn update(&mut self, stats: BatchStats, batch_size: usize) {
        let n = batch_size as f64;
        self.loss_sum += stats.loss * n;
        self.nll_sum  += stats.nll * n;
        self.kl_sum   += stats.kl * n;
        self.samples  += batch_size;
    }

    /// NaN for every field when nothing was seen
    pub fn mean(&self) -> BatchStats {
        if self.samples == 0 {
            return BatchStats::nan();
        }
        let n = self.samples as f64;
        BatchStats {
            loss: self.loss_sum / n,
            nll:  self.nll_sum / n,
            kl:   self.kl_sum / n,
        }
    }
}

/// What a finished run reports back to the caller
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub epochs:     usize,
    pub best_epoch: usize,
    pub best_loss:  f64,
    pub final_loss: f64,
}

// ─── Steps ────────────────────────────────────────────────────────────────────

/// One gradient step on the negative ELBO.
pub fn train_step<B, O>(
    model: Vrnn<B>,
    optim: &mut O,
    x:     Tensor<B, 3>,
    lr:    f64,
) -> (Vrnn<B>, BatchStats)
where
    B: AutodiffBackend,
    O: Optimizer<Vrnn<B>, B>,
{
    let out   = model.forward_loss(x);
    let stats = BatchStats::from_output(&out);

    let grads = out.loss.backward();
    let grads = GradientsParams::from_grads(grads, &model);
    (optim.step(lr, model, grads), stats)
}

/// Loss of one batch without building a graph.
pub fn test_step<B: Backend>(model: &Vrnn<B>, x: Tensor<B, 3>) -> BatchStats {
    BatchStats::from_output(&model.forward_loss(x))
}

pub fn train_epoch<B, O>(
    mut model: Vrnn<B>,
    optim:     &mut O,
    batches:   impl IntoIterator<Item = SequenceBatch<B>>,
    lr:        f64,
) -> (Vrnn<B>, BatchStats)
where
    B: AutodiffBackend,
    O: Optimizer<Vrnn<B>, B>,
{
    let mut meter = LossMeter::default();
    for batch in batches {
        let batch_size = batch.batch_size();
        let (next, stats) = train_step(model, optim, batch.x, lr);
        model = next;
        meter.update(stats, batch_size);
    }
    (model, meter.mean())
}

pub fn test_epoch<B: Backend>(
    model:   &Vrnn<B>,
    batches: impl IntoIterator<Item = SequenceBatch<B>>,
) -> BatchStats {
    let mut meter = LossMeter::default();
    for batch in batches {
        let batch_size = batch.batch_size();
        meter.update(test_step(model, batch.x), batch_size);
    }
    meter.mean()
}

// ─── Full run ─────────────────────────────────────────────────────────────────

pub fn run_training<S: ImageSink>(
    cfg:           &TrainConfig,
    train_dataset: SequenceDataset,
    test_dataset:  SequenceDataset,
    ckpt_manager:  CheckpointManager,
    metrics:       MetricsLogger,
    images:        S,
) -> Result<TrainingSummary> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    MyBackend::seed(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: Vrnn<MyBackend> = cfg.model_config().init(&device);
    tracing::info!(
        "VRNN ready: h_dim={}, z_dim={}, {} parameters",
        cfg.h_dim, cfg.z_dim, model.num_params(),
    );

    let mut optim = AdamConfig::new().init();

    // Snapshot inputs are fixed for the whole run so grids are comparable
    let recon_source = test_dataset.head(cfg.num_samples);

    let train_loader = DataLoaderBuilder::new(SequenceBatcher::<MyBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.num_workers)
        .build(train_dataset);

    let test_loader = DataLoaderBuilder::new(SequenceBatcher::<MyInnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers)
        .build(test_dataset);

    let mut best_loss  = f64::INFINITY;
    let mut best_epoch = 0usize;
    let mut final_loss = f64::NAN;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let (trained, train_stats) = train_epoch(model, &mut optim, train_loader.iter(), cfg.lr);
        model = trained;

        let model_valid = model.valid();
        let test_stats  = test_epoch(&model_valid, test_loader.iter());

        let row = EpochMetrics::new(epoch, train_stats, test_stats);
        metrics.log(&row)?;

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | test_loss={:.4} | test_nll={:.4} | test_kl={:.4}",
            epoch, cfg.epochs, train_stats.loss, test_stats.loss, test_stats.nll, test_stats.kl,
        );

        // ── Image snapshots ──────────────────────────────────────────────────
        let generated = model_valid.generate(cfg.num_samples, &device);
        let (width, height) = (model_valid.x_dim, model_valid.seq_len);
        let path = images.write(
            &format!("samples_epoch_{epoch}"),
            &images_from_tensor(generated)?,
            width,
            height,
        )?;
        tracing::debug!("Wrote generated samples to '{}'", path);

        if !recon_source.is_empty() {
            let batch = SequenceBatcher::<MyInnerBackend>::new(device.clone())
                .batch(recon_source.clone());
            let recon = model_valid.reconstruct(batch.x.clone());
            let pairs = interleave(images_from_tensor(batch.x)?, images_from_tensor(recon)?);
            let path = images.write(&format!("recon_epoch_{epoch}"), &pairs, width, height)?;
            tracing::debug!("Wrote reconstructions to '{}'", path);
        }

        // ── Checkpoint ───────────────────────────────────────────────────────
        ckpt_manager.save_model(&model, epoch)?;
        if row.is_improvement(best_loss) {
            best_loss  = test_stats.loss;
            best_epoch = epoch;
            ckpt_manager.mark_best(epoch)?;
            tracing::info!("New best test loss {:.4} at epoch {}", best_loss, epoch);
        }
        final_loss = test_stats.loss;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    tracing::info!("Training complete!");
    Ok(TrainingSummary { epochs: cfg.epochs, best_epoch, best_loss, final_loss })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::SequenceSample;
    use crate::ml::model::VrnnConfig;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = NdArray<f32>;
    type TestAutodiffBackend = Autodiff<TestBackend>;

    fn zero_batch<B: Backend>(n: usize) -> SequenceBatch<B> {
        let samples = vec![SequenceSample { pixels: vec![0.0; 28 * 28], label: 0 }; n];
        SequenceBatcher::<B>::new(Default::default()).batch(samples)
    }

    #[test]
    fn test_meter_weights_by_batch_size() {
        let mut meter = LossMeter::default();
        meter.update(BatchStats { loss: 1.0, nll: 1.0, kl: 0.0 }, 3);
        meter.update(BatchStats { loss: 5.0, nll: 4.0, kl: 1.0 }, 1);

        let mean = meter.mean();
        assert!((mean.loss - 2.0).abs() < 1e-12);
        assert!((mean.nll - 1.75).abs() < 1e-12);
        assert!((mean.kl - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_empty_meter_is_nan() {
        let mean = LossMeter::default().mean();
        assert!(mean.loss.is_nan());
        assert!(mean.nll.is_nan());
        assert!(mean.kl.is_nan());
    }

    #[test]
    fn test_train_steps_reduce_loss_on_fixed_batch() {
        TestAutodiffBackend::seed(1);
        let device = Default::default();
        let mut model: Vrnn<TestAutodiffBackend> = VrnnConfig::new()
            .with_h_dim(16)
            .with_z_dim(8)
            .init(&device);
        let mut optim = AdamConfig::new().init::<TestAutodiffBackend, Vrnn<TestAutodiffBackend>>();

        let mut losses = Vec::new();
        for _ in 0..30 {
            let batch = zero_batch::<TestAutodiffBackend>(4);
            let (next, stats) = train_step(model, &mut optim, batch.x, 1e-2);
            model = next;
            losses.push(stats.loss);
        }

        let first = losses[0];
        let last  = *losses.last().unwrap();
        assert!(last < first, "loss should drop: first={first}, last={last}");
    }

    #[test]
    fn test_epochs_report_weighted_means() {
        let device = Default::default();
        let model: Vrnn<TestAutodiffBackend> = VrnnConfig::new()
            .with_h_dim(8)
            .with_z_dim(4)
            .init(&device);
        let mut optim = AdamConfig::new().init::<TestAutodiffBackend, Vrnn<TestAutodiffBackend>>();

        let batches = vec![zero_batch::<TestAutodiffBackend>(3), zero_batch(2)];
        let (model, train_stats) = train_epoch(model, &mut optim, batches, 1e-3);
        assert!(train_stats.loss.is_finite());

        let valid = model.valid();
        let test_stats = test_epoch(&valid, vec![zero_batch::<TestBackend>(2)]);
        assert!(test_stats.loss.is_finite());
        assert!(test_stats.kl >= -1e-3);
    }

    #[test]
    fn test_epoch_without_batches_is_nan() {
        let model: Vrnn<TestBackend> = VrnnConfig::new()
            .with_h_dim(8)
            .with_z_dim(4)
            .init(&Default::default());
        let stats = test_epoch(&model, Vec::<SequenceBatch<TestBackend>>::new());
        assert!(stats.loss.is_nan());
    }
}
