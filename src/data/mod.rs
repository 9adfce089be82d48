// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the MNIST files on disk and the tensor
// batches the training loop consumes.
//
//   MNIST (Burn cache)
//       │
//       ▼
//   MnistLoader       → reads a split as DigitImages
//       │
//       ▼
//   Preprocessor      → scales pixels to [0, 1], optional binarize
//       │
//       ▼
//   SequenceDataset   → implements Burn's Dataset trait
//       │
//       ▼
//   SequenceBatcher   → stacks samples into [batch, 28, 28]
//       │
//       ▼
//   DataLoader        → shuffled mini-batches for the trainer
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads MNIST train/test splits through Burn's vision datasets
pub mod loader;

/// Scales raw pixels into the decoder's [0, 1] range
pub mod preprocessor;

/// Implements Burn's Dataset trait for row sequences
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
