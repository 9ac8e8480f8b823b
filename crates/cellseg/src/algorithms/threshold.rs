use image::GrayImage;
use crate::{error::Result, traits::Thresholder, types::BinaryMask};

/// 256-bin intensity histogram.
pub fn histogram(image: &GrayImage) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for p in image.pixels() {
        hist[p[0] as usize] += 1;
    }
    hist
}

/// Otsu's level: the split `[0, t] | (t, 255]` with the smallest weighted
/// within-class variance.
///
/// Minimizing `w0 * var0 + w1 * var1` is the same as maximizing the
/// between-class term `w0 * w1 * (mu0 - mu1)^2`, which is what gets evaluated
/// here. Splits leaving a class empty are skipped, and the first optimum wins.
/// With fewer than two occupied bins there is no valid split and the level is 0.
pub fn otsu_level(hist: &[u64; 256]) -> u8 {
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0;
    }
    let total = total as f64;
    let weighted_sum: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut best_level = 0u8;
    let mut best_score = 0.0f64;
    let mut w0 = 0.0f64;
    let mut sum0 = 0.0f64;

    for t in 0..255usize {
        w0 += hist[t] as f64;
        sum0 += t as f64 * hist[t] as f64;
        let w1 = total - w0;
        if w0 == 0.0 || w1 == 0.0 {
            continue;
        }
        let mu0 = sum0 / w0;
        let mu1 = (weighted_sum - sum0) / w1;
        let diff = mu0 - mu1;
        let score = w0 * w1 * diff * diff;
        if score > best_score {
            best_score = score;
            best_level = t as u8;
        }
    }

    best_level
}

/// Otsu global thresholding
#[derive(Debug, Clone, Default)]
pub struct OtsuThresholder;

impl Thresholder for OtsuThresholder {
    fn level(&self, image: &GrayImage) -> Result<u8> {
        Ok(otsu_level(&histogram(image)))
    }

    fn name(&self) -> &'static str {
        "otsu"
    }
}

/// Simple fixed-level thresholding
#[derive(Debug, Clone)]
pub struct FixedThresholder {
    pub threshold: u8,
}

impl Default for FixedThresholder {
    fn default() -> Self {
        Self { threshold: 128 }
    }
}

impl Thresholder for FixedThresholder {
    fn level(&self, _image: &GrayImage) -> Result<u8> {
        Ok(self.threshold)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Threshold then invert: pixels at or below `level` (the darker class) become foreground.
pub fn binarize_inverted(image: &GrayImage, level: u8) -> BinaryMask {
    BinaryMask::from_fn(image.width(), image.height(), |x, y| {
        image.get_pixel(x, y)[0] <= level
    })
}
