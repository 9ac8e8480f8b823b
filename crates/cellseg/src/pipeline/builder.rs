use crate::{
    algorithms::{
        Binarizer, EqualizeHistogramPreprocessor, FixedThresholder, GaussianBlurPreprocessor, HoleFiller,
        OtsuThresholder, SeedExtractor, DEFAULT_MIN_DISTANCE,
    },
    config::ThresholdMethod,
    pipeline::Pipeline,
    traits::{GrayPreprocessor, MaskPostProcessor, Thresholder},
};

/// Builder for creating segmentation pipelines with a fluent API
pub struct PipelineBuilder {
    preprocessors: Vec<Box<dyn GrayPreprocessor>>,
    thresholder: Option<Box<dyn Thresholder>>,
    postprocessors: Vec<Box<dyn MaskPostProcessor>>,
    min_distance: f32,
    seed_all_components: bool,
}

impl PipelineBuilder {
    /// Create a new pipeline builder with no grayscale or mask steps
    pub fn new() -> Self {
        Self {
            preprocessors: Vec::new(),
            thresholder: None,
            postprocessors: Vec::new(),
            min_distance: DEFAULT_MIN_DISTANCE,
            seed_all_components: false,
        }
    }

    /// Add a grayscale preprocessor, run in insertion order
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: GrayPreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Set the thresholder (replaces any existing one)
    pub fn set_thresholder<T>(mut self, thresholder: T) -> Self
    where
        T: Thresholder + 'static,
    {
        self.thresholder = Some(Box::new(thresholder));
        self
    }

    /// Add a mask post-processor, run in insertion order after inversion
    pub fn add_postprocessor<P>(mut self, postprocessor: P) -> Self
    where
        P: MaskPostProcessor + 'static,
    {
        self.postprocessors.push(Box::new(postprocessor));
        self
    }

    pub fn with_threshold_method(mut self, method: ThresholdMethod) -> Self {
        self.thresholder = Some(method.thresholder());
        self
    }

    pub fn with_fixed_threshold(self, threshold: u8) -> Self {
        self.set_thresholder(FixedThresholder { threshold })
    }

    pub fn with_blur(self, sigma: f32) -> Self {
        self.add_preprocessor(GaussianBlurPreprocessor { sigma })
    }

    pub fn with_equalization(self) -> Self {
        self.add_preprocessor(EqualizeHistogramPreprocessor)
    }

    pub fn with_hole_filling(self) -> Self {
        self.add_postprocessor(HoleFiller)
    }

    /// Minimum separation between seed peaks, in pixels
    pub fn with_min_distance(mut self, min_distance: f32) -> Self {
        self.min_distance = min_distance;
        self
    }

    /// Seed foreground components that have no distance peak of their own
    pub fn with_component_seeding(mut self) -> Self {
        self.seed_all_components = true;
        self
    }

    /// Build the pipeline, defaulting to Otsu if no thresholder was set.
    /// `min_distance` is checked when the pipeline runs.
    pub fn build(self) -> Pipeline {
        let thresholder = self.thresholder.unwrap_or_else(|| Box::new(OtsuThresholder));
        Pipeline::new(
            Binarizer::new(self.preprocessors, thresholder, self.postprocessors),
            SeedExtractor {
                min_distance: self.min_distance,
                ..SeedExtractor::default()
            }
            .with_component_seeding(self.seed_all_components),
        )
    }

    /// Equalize, Otsu, invert, fill holes, 20 px seed separation
    pub fn build_standard() -> Pipeline {
        Self::new()
            .with_equalization()
            .set_thresholder(OtsuThresholder)
            .with_hole_filling()
            .build()
    }

    /// Standard pipeline with a custom seed separation
    pub fn build_with_min_distance(min_distance: f32) -> Pipeline {
        Self::new()
            .with_equalization()
            .with_hole_filling()
            .with_min_distance(min_distance)
            .build()
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_info() {
        let info = PipelineBuilder::build_standard().info();
        assert!(info.contains("equalize_histogram"));
        assert!(info.contains("otsu"));
        assert!(info.contains("fill_holes"));
        assert!(info.contains("min_distance 20"));
    }

    #[test]
    fn test_builder_order_and_overrides() {
        let pipeline = PipelineBuilder::new()
            .with_blur(1.5)
            .with_equalization()
            .with_fixed_threshold(100)
            .with_min_distance(7.0)
            .build();
        let info = pipeline.info();
        assert!(info.contains("[gaussian_blur, equalize_histogram]"));
        assert!(info.contains("fixed"));
        assert!(!info.contains("fill_holes"));
        assert_eq!(pipeline.min_distance(), 7.0);
    }

    #[test]
    fn test_threshold_method() {
        let info = PipelineBuilder::new()
            .with_threshold_method(ThresholdMethod::Fixed { level: 30 })
            .build()
            .info();
        assert!(info.contains("fixed"));
    }
}
