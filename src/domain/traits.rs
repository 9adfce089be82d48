// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits, not
// against the concrete MNIST reader or PNG writer.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::digit::DigitImage;

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Any component that can produce a split of digit images.
///
/// Implementations:
///   - MnistLoader → Burn's cached MNIST train/test files
pub trait ImageSource {
    /// Load every image of this source.
    fn load_all(&self) -> Result<Vec<DigitImage>>;
}

// ─── ImageSink ────────────────────────────────────────────────────────────────
/// Any component that can persist a set of equally sized grayscale
/// images (pixels in [0, 1]) under a name.
///
/// Implementations:
///   - ImageWriter → tiles the images into one PNG grid
pub trait ImageSink {
    /// Write `images` (each `height * width` pixels) under `name`.
    /// Returns the location that was written.
    fn write(
        &self,
        name:   &str,
        images: &[Vec<f32>],
        width:  usize,
        height: usize,
    ) -> Result<String>;
}
