// ============================================================
// Layer 4 — Sequence Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<SequenceSample>
// into one float tensor.
//
//   Input:  N samples, each SEQ_LEN * ROW_WIDTH pixels
//   Output: SequenceBatch with x of shape [N, SEQ_LEN, ROW_WIDTH]
//
// Samples are already row-major, so concatenating their pixel
// buffers and reshaping gives the batch directly:
//   [s1_r0, s1_r1, ..., s1_r27, s2_r0, ..., sN_r27] → [N, 28, 28]
//
// The time axis stays in position 1; the model slices one row
// per timestep out of it.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::SequenceSample;
use crate::domain::digit::{ROW_WIDTH, SEQ_LEN};

// ─── SequenceBatch ────────────────────────────────────────────────────────────
/// A batch of image sequences ready for the VRNN.
#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// Pixel rows — shape: [batch_size, SEQ_LEN, ROW_WIDTH]
    pub x: Tensor<B, 3>,

    /// Digit labels — shape: [batch_size]. Not used by the loss.
    pub labels: Tensor<B, 1, Int>,
}

impl<B: Backend> SequenceBatch<B> {
    pub fn batch_size(&self) -> usize {
        self.x.dims()[0]
    }
}

/// Holds the target device so tensors are created on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct SequenceBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SequenceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
impl<B: Backend> Batcher<SequenceSample, SequenceBatch<B>> for SequenceBatcher<B> {
    fn batch(&self, items: Vec<SequenceSample>) -> SequenceBatch<B> {
        let batch_size = items.len();

        let flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.pixels.iter().copied())
            .collect();

        let labels: Vec<i64> = items.iter().map(|s| s.label as i64).collect();

        let x = Tensor::<B, 3>::from_data(
            TensorData::new(flat, [batch_size, SEQ_LEN, ROW_WIDTH]),
            &self.device,
        );
        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]),
            &self.device,
        );

        SequenceBatch { x, labels }
    }
}
