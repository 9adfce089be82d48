// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model, loss and optimisation code lives here.
//
//   distributions.rs — Normal (reparameterised) and Bernoulli,
//                      log-likelihoods and analytic KL
//
//   recurrence.rs    — GRU cell driving the hidden state
//
//   model.rs         — the VRNN: feature extractors, prior,
//                      generator, inference network, loss
//                      assembly across timesteps, generation
//
//   trainer.rs       — train/test steps, epoch loop, logging,
//                      checkpointing
//
//   sampler.rs       — loads a checkpoint and generates images
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Chung et al. (2015) A Recurrent Latent Variable
//            Model for Sequential Data

/// Normal and Bernoulli distributions over tensors
pub mod distributions;

/// Gated recurrent cell for the hidden state update
pub mod recurrence;

/// VRNN architecture and its loss
pub mod model;

/// Training loop with test evaluation and checkpointing
pub mod trainer;

/// Checkpoint loading and prior sampling
pub mod sampler;
