use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One preprocessed image: SEQ_LEN rows of ROW_WIDTH pixels in [0, 1],
/// stored row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceSample {
    pub pixels: Vec<f32>,
    pub label:  u8,
}

pub struct SequenceDataset {
    samples: Vec<SequenceSample>,
}

impl SequenceDataset {
    pub fn new(samples: Vec<SequenceSample>) -> Self { Self { samples } }

    /// The first `n` samples, used for reconstruction snapshots
    pub fn head(&self, n: usize) -> Vec<SequenceSample> {
        self.samples.iter().take(n).cloned().collect()
    }
}

impl Dataset<SequenceSample> for SequenceDataset {
    fn get(&self, index: usize) -> Option<SequenceSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
