// ============================================================
// Layer 5 — VRNN Model
// ============================================================
// Variational Recurrent Neural Network over image rows.
//
// At every timestep t, with hidden state h = h_{t-1}:
//
//   phi_x(x_t)                  feature extractor for a row
//   phi_z(z_t)                  feature extractor for a latent
//   p(z_t | h)        Prior      Normal(loc, softplus scale)
//   q(z_t | x_t, h)   Inference  Normal(loc, softplus scale)
//   p(x_t | z_t, h)   Generator  Bernoulli(sigmoid logits)
//   h_t = GRU([phi_x(x_t), phi_z(z_t)], h)   Recurrence
//
// Training (encoder-with-recurrence):
//   z_t ~ q, loss_t = -log p(x_t | z_t, h) + KL(q || p(z_t | h))
//   loss = mean over batch of Σ_t loss_t
//
// Generation (generate-from-prior):
//   z_t ~ p(z_t | h), x_t = E[p(x_t | z_t, h)], h_t from (x_t, z_t)
//
// The hidden state starts at zero for every sequence.

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::{relu, sigmoid, softplus},
};

use crate::ml::distributions::{Bernoulli, Normal};
use crate::ml::recurrence::GruCell;

/// Keeps log(scale) finite when softplus underflows
const MIN_SCALE: f64 = 1e-4;

#[derive(Config, Debug)]
pub struct VrnnConfig {
    /// Width of one observation row
    #[config(default = 28)]
    pub x_dim: usize,
    /// Hidden state and feature width
    #[config(default = 100)]
    pub h_dim: usize,
    /// Latent width
    #[config(default = 64)]
    pub z_dim: usize,
    /// Timesteps produced by `generate`
    #[config(default = 28)]
    pub seq_len: usize,
}

impl VrnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Vrnn<B> {
        let (x, h, z) = (self.x_dim, self.h_dim, self.z_dim);
        Vrnn {
            phi_x: FeatureExtractor::new(x, h, device),
            phi_z: FeatureExtractor::new(z, h, device),
            prior: Prior {
                fc1:      LinearConfig::new(h, h).init(device),
                fc_loc:   LinearConfig::new(h, z).init(device),
                fc_scale: LinearConfig::new(h, z).init(device),
            },
            generator: Generator {
                fc1: LinearConfig::new(2 * h, h).init(device),
                fc2: LinearConfig::new(h, x).init(device),
            },
            inference: Inference {
                fc1:      LinearConfig::new(2 * h, h).init(device),
                fc_loc:   LinearConfig::new(h, z).init(device),
                fc_scale: LinearConfig::new(h, z).init(device),
            },
            recurrence: GruCell::new(2 * h, h, device),
            x_dim: x,
            h_dim: h,
            z_dim: z,
            seq_len: self.seq_len,
        }
    }
}

// ─── Building blocks ──────────────────────────────────────────────────────────

/// Affine + ReLU. Used as phi_x (rows) and phi_z (latents).
#[derive(Module, Debug)]
pub struct FeatureExtractor<B: Backend> {
    pub fc: Linear<B>,
}

impl<B: Backend> FeatureExtractor<B> {
    pub fn new(d_in: usize, d_out: usize, device: &B::Device) -> Self {
        Self { fc: LinearConfig::new(d_in, d_out).init(device) }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        relu(self.fc.forward(x))
    }
}

/// p(z_t | h_{t-1})
#[derive(Module, Debug)]
pub struct Prior<B: Backend> {
    pub fc1:      Linear<B>,
    pub fc_loc:   Linear<B>,
    pub fc_scale: Linear<B>,
}

impl<B: Backend> Prior<B> {
    pub fn forward(&self, h: Tensor<B, 2>) -> Normal<B> {
        let hid = relu(self.fc1.forward(h));
        gaussian_head(&self.fc_loc, &self.fc_scale, hid)
    }
}

/// p(x_t | z_t, h_{t-1}), takes phi_z(z_t)
#[derive(Module, Debug)]
pub struct Generator<B: Backend> {
    pub fc1: Linear<B>,
    pub fc2: Linear<B>,
}

impl<B: Backend> Generator<B> {
    pub fn forward(&self, z_feat: Tensor<B, 2>, h: Tensor<B, 2>) -> Bernoulli<B> {
        let hid = relu(self.fc1.forward(Tensor::cat(vec![z_feat, h], 1)));
        Bernoulli::new(sigmoid(self.fc2.forward(hid)))
    }
}

/// q(z_t | x_t, h_{t-1}), takes phi_x(x_t)
#[derive(Module, Debug)]
pub struct Inference<B: Backend> {
    pub fc1:      Linear<B>,
    pub fc_loc:   Linear<B>,
    pub fc_scale: Linear<B>,
}

impl<B: Backend> Inference<B> {
    pub fn forward(&self, x_feat: Tensor<B, 2>, h: Tensor<B, 2>) -> Normal<B> {
        let hid = relu(self.fc1.forward(Tensor::cat(vec![x_feat, h], 1)));
        gaussian_head(&self.fc_loc, &self.fc_scale, hid)
    }
}

fn gaussian_head<B: Backend>(
    fc_loc:   &Linear<B>,
    fc_scale: &Linear<B>,
    hid:      Tensor<B, 2>,
) -> Normal<B> {
    let loc   = fc_loc.forward(hid.clone());
    let scale = softplus(fc_scale.forward(hid), 1.0).add_scalar(MIN_SCALE);
    Normal::new(loc, scale)
}

// ─── VRNN ─────────────────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct Vrnn<B: Backend> {
    pub phi_x:      FeatureExtractor<B>,
    pub phi_z:      FeatureExtractor<B>,
    pub prior:      Prior<B>,
    pub generator:  Generator<B>,
    pub inference:  Inference<B>,
    pub recurrence: GruCell<B>,
    pub x_dim:      usize,
    pub h_dim:      usize,
    pub z_dim:      usize,
    pub seq_len:    usize,
}

/// Batch-mean losses, each a single-element tensor.
pub struct VrnnOutput<B: Backend> {
    /// nll + kl, the negative ELBO
    pub loss: Tensor<B, 1>,
    pub nll:  Tensor<B, 1>,
    pub kl:   Tensor<B, 1>,
}

/// Result of one posterior step
struct PosteriorStep<B: Backend> {
    nll:    Tensor<B, 2>,
    kl:     Tensor<B, 2>,
    recon:  Tensor<B, 2>,
    hidden: Tensor<B, 2>,
}

impl<B: Backend> Vrnn<B> {
    /// x: [batch, seq_len, x_dim] → losses summed over time, averaged over batch
    pub fn forward_loss(&self, x: Tensor<B, 3>) -> VrnnOutput<B> {
        let [batch, seq_len, _] = x.dims();
        let device = x.device();

        let mut h       = self.initial_hidden(batch, &device);
        let mut nll_sum = Tensor::<B, 2>::zeros([batch, 1], &device);
        let mut kl_sum  = Tensor::<B, 2>::zeros([batch, 1], &device);

        for t in 0..seq_len {
            let step = self.posterior_step(self.row(&x, t), h);
            nll_sum = nll_sum + step.nll;
            kl_sum  = kl_sum + step.kl;
            h = step.hidden;
        }

        let nll = nll_sum.mean();
        let kl  = kl_sum.mean();
        VrnnOutput { loss: nll.clone() + kl.clone(), nll, kl }
    }

    /// Decoder means along a posterior trajectory, same shape as x
    pub fn reconstruct(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, seq_len, _] = x.dims();
        let device = x.device();

        let mut h    = self.initial_hidden(batch, &device);
        let mut rows = Vec::with_capacity(seq_len);
        for t in 0..seq_len {
            let step = self.posterior_step(self.row(&x, t), h);
            rows.push(step.recon.reshape([batch, 1, self.x_dim]));
            h = step.hidden;
        }
        Tensor::cat(rows, 1)
    }

    /// Unroll the prior for `seq_len` steps → [num_samples, seq_len, x_dim]
    pub fn generate(&self, num_samples: usize, device: &B::Device) -> Tensor<B, 3> {
        let mut h    = self.initial_hidden(num_samples, device);
        let mut rows = Vec::with_capacity(self.seq_len);

        for _ in 0..self.seq_len {
            let z       = self.prior.forward(h.clone()).sample();
            let z_feat  = self.phi_z.forward(z);
            let x_t     = self.generator.forward(z_feat.clone(), h.clone()).mean();
            let x_feat  = self.phi_x.forward(x_t.clone());
            h = self.recurrence.forward(Tensor::cat(vec![x_feat, z_feat], 1), h);
            rows.push(x_t.reshape([num_samples, 1, self.x_dim]));
        }
        Tensor::cat(rows, 1)
    }

    fn posterior_step(&self, x_t: Tensor<B, 2>, h: Tensor<B, 2>) -> PosteriorStep<B> {
        let x_feat    = self.phi_x.forward(x_t.clone());
        let posterior = self.inference.forward(x_feat.clone(), h.clone());
        let prior     = self.prior.forward(h.clone());

        let z       = posterior.sample();
        let z_feat  = self.phi_z.forward(z);
        let decoder = self.generator.forward(z_feat.clone(), h.clone());

        PosteriorStep {
            nll:    decoder.nll(x_t),
            kl:     posterior.kl_divergence(&prior),
            recon:  decoder.mean(),
            hidden: self.recurrence.forward(Tensor::cat(vec![x_feat, z_feat], 1), h),
        }
    }

    fn initial_hidden(&self, batch: usize, device: &B::Device) -> Tensor<B, 2> {
        Tensor::zeros([batch, self.h_dim], device)
    }

    /// Row t of every sequence → [batch, x_dim]
    fn row(&self, x: &Tensor<B, 3>, t: usize) -> Tensor<B, 2> {
        let [batch, _, x_dim] = x.dims();
        x.clone().slice([0..batch, t..t + 1, 0..x_dim]).reshape([batch, x_dim])
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::{Distribution, ElementConversion};

    type TestBackend = NdArray<f32>;

    fn small_model() -> Vrnn<TestBackend> {
        VrnnConfig::new()
            .with_h_dim(16)
            .with_z_dim(8)
            .init(&Default::default())
    }

    fn random_batch(batch: usize) -> Tensor<TestBackend, 3> {
        Tensor::random([batch, 28, 28], Distribution::Uniform(0.0, 1.0), &Default::default())
    }

    #[test]
    fn test_default_config_matches_mnist_rows() {
        let cfg = VrnnConfig::new();
        assert_eq!(cfg.x_dim, 28);
        assert_eq!(cfg.seq_len, 28);
        assert_eq!(cfg.h_dim, 100);
        assert_eq!(cfg.z_dim, 64);
    }

    #[test]
    fn test_forward_loss_is_scalar_and_finite() {
        let model = small_model();
        let out = model.forward_loss(random_batch(4));

        assert_eq!(out.loss.dims(), [1]);
        let loss: f32 = out.loss.into_scalar().elem::<f32>();
        let nll:  f32 = out.nll.into_scalar().elem::<f32>();
        let kl:   f32 = out.kl.into_scalar().elem::<f32>();

        assert!(loss.is_finite());
        assert!((loss - (nll + kl)).abs() < 1e-2 * loss.abs().max(1.0));
        assert!(kl >= -1e-3, "KL should be non-negative, got {kl}");
        assert!(nll > 0.0);
    }

    #[test]
    fn test_generate_shape_and_range() {
        let model = small_model();
        let samples = model.generate(5, &Default::default());
        assert_eq!(samples.dims(), [5, 28, 28]);

        let values = samples.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_reconstruct_keeps_shape() {
        let model = small_model();
        assert_eq!(model.reconstruct(random_batch(3)).dims(), [3, 28, 28]);
    }

    #[test]
    fn test_shorter_sequences_are_accepted() {
        let model = small_model();
        let x = Tensor::<TestBackend, 3>::zeros([2, 5, 28], &Default::default());
        let loss: f32 = model.forward_loss(x).loss.into_scalar().elem::<f32>();
        assert!(loss.is_finite());
    }

    #[test]
    fn test_generate_honours_configured_length() {
        let model = VrnnConfig::new()
            .with_h_dim(8)
            .with_z_dim(4)
            .with_seq_len(10)
            .init::<TestBackend>(&Default::default());
        assert_eq!(model.generate(2, &Default::default()).dims(), [2, 10, 28]);
    }
}
