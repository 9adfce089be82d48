// ============================================================
// Layer 4 — MNIST Loader
// ============================================================
// Reads the MNIST train or test split through Burn's vision
// datasets. Burn downloads the files on first use and caches
// them locally, so this loader never touches the network
// itself.
//
// An optional `limit` keeps a seeded random subset of the
// split, which keeps quick experiments and smoke runs cheap
// while staying reproducible.
//
// Reference: Burn Book §4 (Datasets)
//            rand crate documentation (index sampling)

use anyhow::Result;
use burn::data::dataset::{
    vision::{MnistDataset, MnistItem},
    Dataset,
};
use rand::{rngs::StdRng, SeedableRng};

use crate::domain::digit::DigitImage;
use crate::domain::traits::ImageSource;

/// Which half of MNIST to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// 60 000 training images
    Train,
    /// 10 000 test images
    Test,
}

impl Split {
    pub fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test  => "test",
        }
    }
}

/// Loads one MNIST split as DigitImages.
/// Implements the ImageSource trait from Layer 3.
pub struct MnistLoader {
    split: Split,
    limit: Option<usize>,
    seed:  u64,
}

impl MnistLoader {
    pub fn new(split: Split) -> Self {
        Self { split, limit: None, seed: 0 }
    }

    /// Keep at most `limit` images, chosen at random with `seed`
    pub fn with_limit(mut self, limit: Option<usize>, seed: u64) -> Self {
        self.limit = limit;
        self.seed  = seed;
        self
    }
}

impl ImageSource for MnistLoader {
    fn load_all(&self) -> Result<Vec<DigitImage>> {
        let dataset = match self.split {
            Split::Train => MnistDataset::train(),
            Split::Test  => MnistDataset::test(),
        };
        let total = dataset.len();

        let indices = subset_indices(total, self.limit, self.seed);
        let images: Vec<DigitImage> = indices
            .into_iter()
            .filter_map(|i| dataset.get(i))
            .map(|item| to_digit_image(&item))
            .collect();

        tracing::info!(
            "Loaded {} of {} MNIST {} images",
            images.len(),
            total,
            self.split.name(),
        );
        Ok(images)
    }
}

/// Indices to read from a split of `total` items.
/// Without a limit (or with one at least as large as the split)
/// every index is returned in order; otherwise a seeded sample.
pub fn subset_indices(total: usize, limit: Option<usize>, seed: u64) -> Vec<usize> {
    match limit {
        Some(n) if n < total => {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut picked = rand::seq::index::sample(&mut rng, total, n).into_vec();
            // Keep dataset order so the same seed reads the file sequentially
            picked.sort_unstable();
            picked
        }
        _ => (0..total).collect(),
    }
}

fn to_digit_image(item: &MnistItem) -> DigitImage {
    DigitImage::from_rows(&item.image, item.label)
}
