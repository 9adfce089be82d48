// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-system concerns shared by training and sampling:
//
//   checkpoint.rs   — model weights via Burn's CompactRecorder,
//                     latest/best epoch pointers, and the
//                     TrainConfig as JSON so the sampler can
//                     rebuild the model
//
//   metrics.rs      — per-epoch loss curves as CSV
//
//   image_writer.rs — generated samples and reconstructions
//                     tiled into PNG grids
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// PNG grids of generated and reconstructed digits
pub mod image_writer;
