// ============================================================
// Layer 4 — Pixel Preprocessor
// ============================================================
// Turns raw DigitImages (pixels 0–255) into SequenceSamples
// (pixels in [0, 1]) that the decoder's Bernoulli can score.
//
// Steps (applied in order):
//   1. Divide every pixel by 255
//   2. Clamp to [0, 1] (guards against out-of-range sources)
//   3. Optionally binarize at 0.5
//
// Images with the wrong number of pixels are dropped with a
// warning instead of producing ragged sequences.

use crate::data::dataset::SequenceSample;
use crate::domain::digit::{DigitImage, ROW_WIDTH, SEQ_LEN};

const MAX_PIXEL: f32 = 255.0;
const BINARIZE_THRESHOLD: f32 = 0.5;

pub struct Preprocessor {
    binarize: bool,
}

impl Preprocessor {
    pub fn new(binarize: bool) -> Self {
        Self { binarize }
    }

    /// Scale a single raw pixel into the model's range
    pub fn scale(&self, raw: f32) -> f32 {
        let v = (raw / MAX_PIXEL).clamp(0.0, 1.0);
        if self.binarize {
            if v >= BINARIZE_THRESHOLD { 1.0 } else { 0.0 }
        } else {
            v
        }
    }

    /// Convert one image, or None if it is malformed
    pub fn process(&self, image: &DigitImage) -> Option<SequenceSample> {
        if !image.is_well_formed() {
            tracing::warn!(
                "Dropping image with {} pixels (expected {})",
                image.pixels.len(),
                SEQ_LEN * ROW_WIDTH,
            );
            return None;
        }
        let pixels = image.pixels.iter().map(|&p| self.scale(p)).collect();
        Some(SequenceSample { pixels, label: image.label })
    }

    /// Convert a whole split, skipping malformed images
    pub fn process_all(&self, images: &[DigitImage]) -> Vec<SequenceSample> {
        images.iter().filter_map(|img| self.process(img)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(value: f32) -> DigitImage {
        DigitImage { pixels: vec![value; SEQ_LEN * ROW_WIDTH], label: 4 }
    }

    #[test]
    fn test_scales_into_unit_range() {
        let p = Preprocessor::new(false);
        assert_eq!(p.scale(0.0), 0.0);
        assert_eq!(p.scale(255.0), 1.0);
        assert!((p.scale(51.0) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_pixels_are_clamped() {
        let p = Preprocessor::new(false);
        assert_eq!(p.scale(300.0), 1.0);
        assert_eq!(p.scale(-5.0), 0.0);
    }

    #[test]
    fn test_binarize_thresholds_at_half() {
        let p = Preprocessor::new(true);
        assert_eq!(p.scale(100.0), 0.0);
        assert_eq!(p.scale(128.0), 1.0);
    }

    #[test]
    fn test_process_keeps_label_and_length() {
        let sample = Preprocessor::new(false).process(&image(255.0)).unwrap();
        assert_eq!(sample.label, 4);
        assert_eq!(sample.pixels.len(), SEQ_LEN * ROW_WIDTH);
        assert!(sample.pixels.iter().all(|&p| p == 1.0));
    }

    #[test]
    fn test_malformed_images_are_dropped() {
        let bad = DigitImage { pixels: vec![0.0; 10], label: 0 };
        let out = Preprocessor::new(false).process_all(&[image(0.0), bad, image(10.0)]);
        assert_eq!(out.len(), 2);
    }
}
