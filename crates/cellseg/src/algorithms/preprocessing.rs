use image::{GrayImage, Luma, RgbImage};
use crate::{error::Result, traits::GrayPreprocessor};

// ITU-R BT.601 weights in 14-bit fixed point.
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const SHIFT: u32 = 14;

/// Convert to grayscale with `Y = 0.299 R + 0.587 G + 0.114 B`, rounded.
pub fn to_luminance(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let y = (r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT
            + (1 << (SHIFT - 1)))
            >> SHIFT;
        Luma([y.min(255) as u8])
    })
}

/// Histogram equalization preprocessor for contrast stretching
#[derive(Debug, Clone, Default)]
pub struct EqualizeHistogramPreprocessor;

impl GrayPreprocessor for EqualizeHistogramPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::contrast::equalize_histogram(image))
    }

    fn name(&self) -> &'static str {
        "equalize_histogram"
    }
}

/// Gaussian blur preprocessor for noise reduction
#[derive(Debug, Clone)]
pub struct GaussianBlurPreprocessor {
    pub sigma: f32,
}

impl Default for GaussianBlurPreprocessor {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

impl GrayPreprocessor for GaussianBlurPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::filter::gaussian_blur_f32(image, self.sigma))
    }

    fn name(&self) -> &'static str {
        "gaussian_blur"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_luminance_weights() {
        let mut img = RgbImage::new(4, 1);
        img.put_pixel(0, 0, Rgb([255, 255, 255]));
        img.put_pixel(1, 0, Rgb([255, 0, 0]));
        img.put_pixel(2, 0, Rgb([0, 255, 0]));
        img.put_pixel(3, 0, Rgb([0, 0, 255]));

        let gray = to_luminance(&img);
        assert_eq!(gray.get_pixel(0, 0)[0], 255);
        assert_eq!(gray.get_pixel(1, 0)[0], 76);
        assert_eq!(gray.get_pixel(2, 0)[0], 150);
        assert_eq!(gray.get_pixel(3, 0)[0], 29);
    }

    #[test]
    fn test_equalize_spreads_two_levels() {
        let mut img = GrayImage::from_pixel(10, 10, Luma([120u8]));
        for x in 0..10 {
            img.put_pixel(x, 0, Luma([100u8]));
        }
        let eq = EqualizeHistogramPreprocessor.preprocess(&img).unwrap();
        assert!(eq.get_pixel(0, 0)[0] < eq.get_pixel(0, 5)[0]);
        assert_eq!(eq.get_pixel(0, 5)[0], 255);
    }
}
