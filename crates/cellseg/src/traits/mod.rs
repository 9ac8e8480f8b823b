use image::GrayImage;
use crate::{error::Result, types::BinaryMask};

/// Trait for grayscale preprocessing applied before thresholding
pub trait GrayPreprocessor: Send + Sync {
    /// Transform the grayscale image (e.g., contrast equalization)
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;

    fn name(&self) -> &'static str;
}

/// Trait for global threshold selection
pub trait Thresholder: Send + Sync {
    /// Pick the level; pixels strictly above it are set before inversion
    fn level(&self, image: &GrayImage) -> Result<u8>;

    fn name(&self) -> &'static str;
}

/// Trait for clean-up passes over the binary mask
pub trait MaskPostProcessor: Send + Sync {
    fn process(&self, mask: BinaryMask) -> Result<BinaryMask>;

    fn name(&self) -> &'static str;
}
