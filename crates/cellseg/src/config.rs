use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    algorithms::{FixedThresholder, OtsuThresholder, DEFAULT_MIN_DISTANCE},
    error::{Result, SegmentError},
    traits::Thresholder,
};

/// How the global binarization level is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, Display, EnumString)]
#[serde(tag = "method", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ThresholdMethod {
    /// Otsu's method on the (equalized) histogram
    #[default]
    Otsu,
    /// A fixed level; pixels at or below it become foreground
    Fixed { level: u8 },
}

impl ThresholdMethod {
    pub fn thresholder(&self) -> Box<dyn Thresholder> {
        match *self {
            ThresholdMethod::Otsu => Box::new(OtsuThresholder),
            ThresholdMethod::Fixed { level } => Box::new(FixedThresholder { threshold: level }),
        }
    }
}

/// Tunable parameters of one segmentation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Minimum separation in pixels between two seed peaks
    pub min_distance: f32,
    /// Histogram-equalize the grayscale image before thresholding
    pub equalize: bool,
    /// Fill background pockets enclosed by cells
    pub fill_holes: bool,
    /// Optional Gaussian pre-blur, applied before equalization
    pub blur_sigma: Option<f32>,
    /// Give components without a distance peak a seed anyway
    pub seed_all_components: bool,
    pub threshold: ThresholdMethod,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_distance: DEFAULT_MIN_DISTANCE,
            equalize: true,
            fill_holes: true,
            blur_sigma: None,
            seed_all_components: false,
            threshold: ThresholdMethod::Otsu,
        }
    }
}

impl SegmentationConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return Err(SegmentError::InvalidParameter(format!(
                "min_distance must be a finite non-negative number, got {}",
                self.min_distance
            )));
        }
        if let Some(sigma) = self.blur_sigma {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(SegmentError::InvalidParameter(format!(
                    "blur_sigma must be a finite positive number, got {}",
                    sigma
                )));
            }
        }
        Ok(())
    }
}
