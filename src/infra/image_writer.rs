// ============================================================
// Layer 6 — Image Writer
// ============================================================
// Tiles a set of small grayscale images into one PNG grid so a
// whole epoch's samples can be opened with any image viewer.
//
//   ┌──┬──┬──┐
//   │ 0│ 1│ 2│   cols = ceil(sqrt(n))
//   ├──┼──┼──┤   PADDING black pixels between tiles
//   │ 3│ 4│  │   empty cells stay black
//   └──┴──┴──┘
//
// Pixel values are expected in [0, 1] and are clamped before
// being scaled to 0–255.

use anyhow::{Context, Result};
use image::GrayImage;
use std::{fs, path::{Path, PathBuf}};

use crate::domain::traits::ImageSink;

/// Black border between tiles, in pixels
const PADDING: usize = 2;

/// A tiled grayscale grid ready to be encoded
#[derive(Debug, Clone)]
pub struct Grid {
    pub width:  usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

/// Arrange `images` (each `width * height`, row-major) into a grid.
pub fn tile_grid(images: &[Vec<f32>], width: usize, height: usize) -> Result<Grid> {
    if images.is_empty() {
        anyhow::bail!("no images to tile");
    }
    if let Some(bad) = images.iter().find(|img| img.len() != width * height) {
        anyhow::bail!(
            "pixel buffer length {} does not match image size {}x{}",
            bad.len(),
            width,
            height
        );
    }

    let n    = images.len();
    let cols = (n as f64).sqrt().ceil() as usize;
    let rows = n.div_ceil(cols);

    let grid_w = cols * width + (cols + 1) * PADDING;
    let grid_h = rows * height + (rows + 1) * PADDING;
    let mut pixels = vec![0u8; grid_w * grid_h];

    for (i, img) in images.iter().enumerate() {
        let x0 = PADDING + (i % cols) * (width + PADDING);
        let y0 = PADDING + (i / cols) * (height + PADDING);
        for (r, row) in img.chunks_exact(width).enumerate() {
            let start = (y0 + r) * grid_w + x0;
            for (c, &v) in row.iter().enumerate() {
                pixels[start + c] = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
        }
    }

    Ok(Grid { width: grid_w, height: grid_h, pixels })
}

/// Writes `<dir>/<name>.png`.
pub struct ImageWriter {
    dir: PathBuf,
}

impl ImageWriter {
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create image dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Write to an explicit file path instead of `<dir>/<name>.png`
    pub fn write_to(
        path:   &Path,
        images: &[Vec<f32>],
        width:  usize,
        height: usize,
    ) -> Result<()> {
        let grid = tile_grid(images, width, height)?;
        let img = GrayImage::from_raw(grid.width as u32, grid.height as u32, grid.pixels)
            .context("grid buffer does not match its dimensions")?;
        img.save(path)
            .with_context(|| format!("Failed to write image '{}'", path.display()))?;
        Ok(())
    }
}

impl ImageSink for ImageWriter {
    fn write(
        &self,
        name:   &str,
        images: &[Vec<f32>],
        width:  usize,
        height: usize,
    ) -> Result<String> {
        let path = self.dir.join(format!("{name}.png"));
        Self::write_to(&path, images, width, height)?;
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size_for_perfect_square() {
        let images = vec![vec![0.0; 4 * 3]; 4];
        let grid = tile_grid(&images, 4, 3).unwrap();
        // 2x2 tiles
        assert_eq!(grid.width, 2 * 4 + 3 * PADDING);
        assert_eq!(grid.height, 2 * 3 + 3 * PADDING);
        assert_eq!(grid.pixels.len(), grid.width * grid.height);
    }

    #[test]
    fn test_grid_size_for_partial_last_row() {
        let images = vec![vec![0.0; 28 * 28]; 5];
        let grid = tile_grid(&images, 28, 28).unwrap();
        // 3 columns, 2 rows
        assert_eq!(grid.width, 3 * 28 + 4 * PADDING);
        assert_eq!(grid.height, 2 * 28 + 3 * PADDING);
    }

    #[test]
    fn test_tile_pixels_are_placed_and_clamped() {
        let images = vec![vec![2.0; 2 * 2]];
        let grid = tile_grid(&images, 2, 2).unwrap();
        // Top-left tile pixel sits just inside the padding
        assert_eq!(grid.pixels[PADDING * grid.width + PADDING], 255);
        // Padding stays black
        assert_eq!(grid.pixels[0], 0);
    }

    #[test]
    fn test_mismatched_buffer_is_rejected() {
        let images = vec![vec![0.0; 10]];
        assert!(tile_grid(&images, 28, 28).is_err());
        assert!(tile_grid(&[], 28, 28).is_err());
    }

    #[test]
    fn test_writer_creates_png() {
        let dir = std::env::temp_dir().join(format!("vrnn-images-{}", std::process::id()));
        let writer = ImageWriter::new(dir.to_string_lossy().into_owned()).unwrap();
        let path = writer.write("grid", &vec![vec![0.5; 28 * 28]; 3], 28, 28).unwrap();
        assert!(path.ends_with("grid.png"));
        assert!(std::path::Path::new(&path).exists());
    }
}
