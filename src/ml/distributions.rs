// ============================================================
// Layer 5 — Distributions
// ============================================================
// The two distribution families a VRNN needs, written as
// thin wrappers over Burn tensors so gradients flow through
// every parameter:
//
//   Normal     — diagonal Gaussian for prior and posterior
//                over z_t. Sampled with the reparameterisation
//                trick: z = loc + scale * eps, eps ~ N(0, I)
//
//   Bernoulli  — independent pixel probabilities for the
//                decoder's p(x_t | z_t, h_{t-1})
//
// Every per-sample quantity is reduced over the feature axis
// and returned as [batch, 1].
//
// Closed forms used:
//   KL(N(m1,s1) || N(m2,s2)) = log(s2/s1)
//                            + (s1² + (m1-m2)²) / (2 s2²) - ½
//   KL(N(m,s)   || N(0,1))   = -½ Σ (1 + log s² - m² - s²)
//   log N(x; m, s)           = -(x-m)²/(2s²) - log s - ½ log 2π
//   log Bern(x; p)           = x log p + (1-x) log(1-p)
//
// Reference: Kingma & Welling (2014) Auto-Encoding Variational Bayes
//            Chung et al. (2015) A Recurrent Latent Variable Model
//            for Sequential Data

use burn::{prelude::*, tensor::Distribution};

/// Probabilities are clamped away from 0 and 1 before taking logs
const PROB_EPS: f64 = 1e-7;

/// ½ log(2π)
const HALF_LOG_TWO_PI: f64 = 0.918_938_533_204_672_7;

// ─── Normal ───────────────────────────────────────────────────────────────────
/// Diagonal Gaussian, parameters of shape [batch, dim].
#[derive(Debug, Clone)]
pub struct Normal<B: Backend> {
    pub loc:   Tensor<B, 2>,
    pub scale: Tensor<B, 2>,
}

impl<B: Backend> Normal<B> {
    pub fn new(loc: Tensor<B, 2>, scale: Tensor<B, 2>) -> Self {
        Self { loc, scale }
    }

    /// N(0, I) with the given shape
    pub fn standard(shape: [usize; 2], device: &B::Device) -> Self {
        Self {
            loc:   Tensor::zeros(shape, device),
            scale: Tensor::ones(shape, device),
        }
    }

    /// Reparameterised draw: differentiable in loc and scale
    pub fn sample(&self) -> Tensor<B, 2> {
        let eps = Tensor::<B, 2>::random(
            self.loc.dims(),
            Distribution::Normal(0.0, 1.0),
            &self.loc.device(),
        );
        self.loc.clone() + self.scale.clone() * eps
    }

    /// log N(x; loc, scale) summed over dims → [batch, 1]
    pub fn log_prob(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let z = (x - self.loc.clone()) / self.scale.clone();
        (z.powf_scalar(2.0).mul_scalar(-0.5) - self.scale.clone().log())
            .sub_scalar(HALF_LOG_TWO_PI)
            .sum_dim(1)
    }

    /// Analytic KL(self || other) summed over dims → [batch, 1]
    pub fn kl_divergence(&self, other: &Normal<B>) -> Tensor<B, 2> {
        let var_self  = self.scale.clone().powf_scalar(2.0);
        let var_other = other.scale.clone().powf_scalar(2.0);
        let mean_diff = (self.loc.clone() - other.loc.clone()).powf_scalar(2.0);

        let log_ratio = other.scale.clone().log() - self.scale.clone().log();
        let quad      = (var_self + mean_diff) / var_other.mul_scalar(2.0);

        (log_ratio + quad).sub_scalar(0.5).sum_dim(1)
    }

    /// Analytic KL(self || N(0, I)) summed over dims → [batch, 1]
    pub fn kl_unit_normal(&self) -> Tensor<B, 2> {
        let var = self.scale.clone().powf_scalar(2.0);
        (var.clone().log().add_scalar(1.0) - self.loc.clone().powf_scalar(2.0) - var)
            .sum_dim(1)
            .mul_scalar(-0.5)
    }
}

// ─── Bernoulli ────────────────────────────────────────────────────────────────
/// Independent Bernoulli per feature, probabilities of shape [batch, dim].
#[derive(Debug, Clone)]
pub struct Bernoulli<B: Backend> {
    pub probs: Tensor<B, 2>,
}

impl<B: Backend> Bernoulli<B> {
    pub fn new(probs: Tensor<B, 2>) -> Self {
        Self { probs }
    }

    pub fn mean(&self) -> Tensor<B, 2> {
        self.probs.clone()
    }

    /// Hard 0/1 draw. Not differentiable; used for generation only.
    pub fn sample(&self) -> Tensor<B, 2> {
        let u = Tensor::<B, 2>::random(
            self.probs.dims(),
            Distribution::Uniform(0.0, 1.0),
            &self.probs.device(),
        );
        u.lower(self.probs.clone()).float()
    }

    /// log Bern(x; p) summed over dims → [batch, 1].
    /// Works with continuous x in [0, 1] as a cross-entropy.
    pub fn log_prob(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let p = self.probs.clone().clamp(PROB_EPS, 1.0 - PROB_EPS);
        let one_minus_x = x.clone().neg().add_scalar(1.0);
        let one_minus_p = p.clone().neg().add_scalar(1.0);
        (x * p.log() + one_minus_x * one_minus_p.log()).sum_dim(1)
    }

    /// Negative log-likelihood → [batch, 1]
    pub fn nll(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.log_prob(x).neg()
    }
}
