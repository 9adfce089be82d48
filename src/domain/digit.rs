// ============================================================
// Layer 3 — Digit Image Domain Type
// ============================================================
// One 28x28 grayscale image. The VRNN never sees it as an
// image: every row is one timestep, so the image becomes
// a sequence of 28 vectors of width 28.
//
//   row 0  → x_0   [28 pixels]
//   row 1  → x_1   [28 pixels]
//   ...
//   row 27 → x_27  [28 pixels]
//
// Pixels are stored row-major in a flat Vec so the batcher
// can copy them straight into a tensor.

use serde::{Deserialize, Serialize};

/// Number of rows per image = number of timesteps per sequence
pub const SEQ_LEN: usize = 28;

/// Number of pixels per row = width of one timestep vector
pub const ROW_WIDTH: usize = 28;

/// A raw image as loaded from the dataset.
/// Pixel values are in the dataset's native range (0–255).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitImage {
    /// Row-major pixels, length SEQ_LEN * ROW_WIDTH
    pub pixels: Vec<f32>,

    /// Ground-truth digit. The model is unsupervised,
    /// the label only travels along for inspection.
    pub label: u8,
}

impl DigitImage {
    /// Build an image from row arrays as produced by the MNIST reader.
    pub fn from_rows(rows: &[[f32; ROW_WIDTH]; SEQ_LEN], label: u8) -> Self {
        let pixels = rows.iter().flat_map(|row| row.iter().copied()).collect();
        Self { pixels, label }
    }

    /// True when the pixel buffer has exactly SEQ_LEN full rows
    pub fn is_well_formed(&self) -> bool {
        self.pixels.len() == SEQ_LEN * ROW_WIDTH
    }
}
