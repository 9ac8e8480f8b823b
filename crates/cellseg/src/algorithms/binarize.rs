use image::RgbImage;
use tracing::debug;

use crate::{
    algorithms::{preprocessing::to_luminance, threshold::binarize_inverted},
    algorithms::{EqualizeHistogramPreprocessor, HoleFiller, OtsuThresholder},
    error::{Result, SegmentError},
    traits::{GrayPreprocessor, MaskPostProcessor, Thresholder},
    types::BinaryMask,
};

/// Output of the binarization stage
#[derive(Debug, Clone)]
pub struct Binarized {
    pub mask: BinaryMask,
    pub threshold: u8,
}

/// Grayscale → preprocess → global threshold → invert → mask clean-up
pub struct Binarizer {
    preprocessors: Vec<Box<dyn GrayPreprocessor>>,
    thresholder: Box<dyn Thresholder>,
    postprocessors: Vec<Box<dyn MaskPostProcessor>>,
}

impl Binarizer {
    pub fn new(
        preprocessors: Vec<Box<dyn GrayPreprocessor>>,
        thresholder: Box<dyn Thresholder>,
        postprocessors: Vec<Box<dyn MaskPostProcessor>>,
    ) -> Self {
        Self {
            preprocessors,
            thresholder,
            postprocessors,
        }
    }

    pub fn binarize(&self, image: &RgbImage) -> Result<Binarized> {
        if image.width() == 0 || image.height() == 0 {
            return Err(SegmentError::EmptyImage);
        }

        let mut gray = to_luminance(image);
        for preprocessor in &self.preprocessors {
            gray = preprocessor.preprocess(&gray)?;
            debug!(step = preprocessor.name(), "preprocessed grayscale");
        }

        let threshold = self.thresholder.level(&gray)?;
        debug!(method = self.thresholder.name(), threshold, "selected threshold");

        let mut mask = binarize_inverted(&gray, threshold);
        for postprocessor in &self.postprocessors {
            mask = postprocessor.process(mask)?;
            debug!(step = postprocessor.name(), foreground = mask.foreground_count(), "post-processed mask");
        }

        Ok(Binarized { mask, threshold })
    }

    /// Short human readable summary of the configured steps
    pub fn info(&self) -> String {
        let pre: Vec<&str> = self.preprocessors.iter().map(|p| p.name()).collect();
        let post: Vec<&str> = self.postprocessors.iter().map(|p| p.name()).collect();
        format!(
            "gray -> [{}] -> {} -> invert -> [{}]",
            pre.join(", "),
            self.thresholder.name(),
            post.join(", ")
        )
    }
}

impl Default for Binarizer {
    /// Equalize, Otsu, invert, fill holes.
    fn default() -> Self {
        Self::new(
            vec![Box::new(EqualizeHistogramPreprocessor)],
            Box::new(OtsuThresholder),
            vec![Box::new(HoleFiller)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_dark_disc_becomes_foreground() {
        let mut img = RgbImage::from_pixel(60, 60, Rgb([230, 220, 225]));
        for y in 0..60u32 {
            for x in 0..60u32 {
                let (dx, dy) = (x as i32 - 30, y as i32 - 30);
                if dx * dx + dy * dy <= 15 * 15 {
                    img.put_pixel(x, y, Rgb([120, 40, 60]));
                }
            }
        }
        // A bright fleck inside the cell gets filled back in.
        img.put_pixel(30, 30, Rgb([250, 250, 250]));

        let out = Binarizer::default().binarize(&img).unwrap();
        assert!(out.mask.get(30, 30));
        assert!(out.mask.get(20, 30));
        assert!(!out.mask.get(2, 2));
        assert!(!out.mask.get(50, 30));
    }

    #[test]
    fn test_blank_image_has_no_foreground() {
        let img = RgbImage::from_pixel(32, 24, Rgb([90, 90, 90]));
        let out = Binarizer::default().binarize(&img).unwrap();
        assert!(!out.mask.has_foreground());
    }

    #[test]
    fn test_empty_image_rejected() {
        let img = RgbImage::new(0, 0);
        assert!(matches!(
            Binarizer::default().binarize(&img),
            Err(SegmentError::EmptyImage)
        ));
    }

    #[test]
    fn test_info_lists_steps() {
        let info = Binarizer::default().info();
        assert!(info.contains("equalize_histogram"));
        assert!(info.contains("otsu"));
        assert!(info.contains("fill_holes"));
    }
}
