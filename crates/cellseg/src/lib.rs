//! # Blood Smear Cell Segmentation Library
//!
//! Splits a microscopy image of a blood smear into one crop per red blood
//! cell candidate, plus an overview with every detected cell boxed.
//!
//! ## Stages
//!
//! - **Binarization**: luminance, histogram equalization, Otsu, inversion, hole filling
//! - **Distance transform**: exact Euclidean distance to the background
//! - **Seeding**: distance peaks at least `min_distance` apart, grouped into blobs
//! - **Watershed**: marker-controlled flood with one-pixel boundaries between cells
//! - **Regions**: largest external contour and bounding box per label
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cellseg::{DirectorySink, FileImageSource, Pipeline};
//!
//! let pipeline = Pipeline::default();
//! let mut sink = DirectorySink::new("cells");
//! let report = pipeline.run(&FileImageSource::new("smear.png"), &mut sink)?;
//! println!("{} cells", report.cell_count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use cellseg::Pipeline;
//!
//! let pipeline = Pipeline::builder()
//!     .with_blur(1.0)
//!     .with_equalization()
//!     .with_fixed_threshold(110)
//!     .with_hole_filling()
//!     .with_min_distance(12.0)
//!     .build();
//! let image = image::open("smear.png")?.to_rgb8();
//! let segmentation = pipeline.process(&image)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod config;
pub mod pipeline;
pub mod io;
pub mod report;

// Re-exports for convenience
pub use error::{Result, SegmentError};
pub use types::{BinaryMask, BoundingBox, DistanceField, Grid, LabelMap, Region, SeedMap, Segmentation};
pub use traits::*;
pub use config::{SegmentationConfig, ThresholdMethod};
pub use pipeline::{builder::PipelineBuilder, Pipeline};
pub use io::*;
pub use report::{CellRecord, RunReport};

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn create_test_image() -> RgbImage {
        let mut img = RgbImage::from_pixel(120, 100, Rgb([240, 236, 238]));
        for y in 30..70 {
            for x in 40..80 {
                img.put_pixel(x, y, Rgb([130, 50, 70]));
            }
        }
        img
    }

    #[test]
    fn test_pipeline_basic() {
        let pipeline = Pipeline::builder()
            .with_equalization()
            .with_hole_filling()
            .build();
        let result = pipeline.process(&create_test_image()).expect("Should process successfully");
        assert_eq!(result.regions.len(), 1, "Square should be one cell");
        assert_eq!(result.image_width, 120);
        assert_eq!(result.image_height, 100);
        assert_eq!(result.regions[0].bbox, BoundingBox { x: 40, y: 30, width: 40, height: 40 });
    }

    #[test]
    fn test_pipeline_fixed_threshold() {
        let pipeline = Pipeline::builder().with_fixed_threshold(180).build();
        let result = pipeline.process(&create_test_image()).expect("Should process successfully");
        assert_eq!(result.regions.len(), 1);
    }

    #[test]
    fn test_empty_image_error() {
        let result = Pipeline::default().process(&RgbImage::new(0, 10));
        assert!(matches!(result, Err(SegmentError::EmptyImage)));
    }
}
