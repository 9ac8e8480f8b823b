pub mod builder;

use image::RgbImage;
use tracing::{debug, info};

use crate::{
    algorithms::{crop_cell, draw_overview, euclidean_distance_transform, extract_regions, watershed, Binarizer, SeedExtractor},
    config::SegmentationConfig,
    error::Result,
    io::{ImageSource, OutputSink},
    report::{CellRecord, RunReport},
    types::Segmentation,
};

/// Binarize, distance transform, seed, flood, extract regions
pub struct Pipeline {
    binarizer: Binarizer,
    seed_extractor: SeedExtractor,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(binarizer: Binarizer, seed_extractor: SeedExtractor) -> Self {
        Self {
            binarizer,
            seed_extractor,
        }
    }

    /// Build a pipeline from a validated configuration
    pub fn from_config(config: &SegmentationConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = Self::builder();
        if let Some(sigma) = config.blur_sigma {
            builder = builder.with_blur(sigma);
        }
        if config.equalize {
            builder = builder.with_equalization();
        }
        builder = builder.with_threshold_method(config.threshold);
        if config.fill_holes {
            builder = builder.with_hole_filling();
        }
        if config.seed_all_components {
            builder = builder.with_component_seeding();
        }
        Ok(builder.with_min_distance(config.min_distance).build())
    }

    pub fn min_distance(&self) -> f32 {
        self.seed_extractor.min_distance
    }

    pub fn seeds_all_components(&self) -> bool {
        self.seed_extractor.seed_all_components
    }

    /// Segment one image. Nothing is written anywhere.
    pub fn process(&self, image: &RgbImage) -> Result<Segmentation> {
        // Step 1: foreground mask
        let binarized = self.binarizer.binarize(image)?;
        let mask = binarized.mask;
        debug!(foreground = mask.foreground_count(), threshold = binarized.threshold, "binarized");

        // Step 2: distance to background
        let distance = euclidean_distance_transform(&mask);

        // Step 3: markers
        let seeds = self.seed_extractor.extract(&distance, &mask)?;

        // Step 4: flood
        let labels = watershed(&seeds.map, &distance, &mask)?;

        // Step 5: contours and boxes
        let regions = extract_regions(&labels);
        debug!(regions = regions.len(), "extracted regions");

        Ok(Segmentation {
            image_width: image.width(),
            image_height: image.height(),
            threshold: binarized.threshold,
            mask,
            distance,
            seeds: seeds.map,
            seed_count: seeds.count,
            labels,
            regions,
        })
    }

    /// Load from `source`, segment, write every crop and then the overview to `sink`.
    pub fn run(&self, source: &dyn ImageSource, sink: &mut dyn OutputSink) -> Result<RunReport> {
        self.run_detailed(source, sink).map(|(_, report)| report)
    }

    /// Same as [`Pipeline::run`], also handing back the intermediate grids.
    pub fn run_detailed(
        &self,
        source: &dyn ImageSource,
        sink: &mut dyn OutputSink,
    ) -> Result<(Segmentation, RunReport)> {
        source.validate()?;
        let image = source.load()?;
        info!(source = %source.description(), width = image.width(), height = image.height(), "loaded image");

        let segmentation = self.process(&image)?;

        let first_index = sink.prepare()?;
        let mut cells = Vec::with_capacity(segmentation.regions.len());
        for (index, region) in (first_index..).zip(&segmentation.regions) {
            let crop = crop_cell(&image, &region.bbox);
            let path = sink.write_cell(index, &crop)?;
            debug!(label = region.label, file = %path.display(), "wrote cell");
            cells.push(CellRecord {
                label: region.label,
                file: path.display().to_string(),
                bbox: region.bbox,
                area: region.pixel_count,
                contour_area: region.contour_area(),
            });
        }

        let overview = draw_overview(&image, &segmentation.bounding_boxes());
        let overview_path = sink.write_overview(&overview)?;

        info!(
            cells = cells.len(),
            seeds = segmentation.seed_count,
            threshold = segmentation.threshold,
            sink = %sink.description(),
            "segmentation complete"
        );

        let report = RunReport {
            input: source.description(),
            output: sink.description(),
            image_width: segmentation.image_width,
            image_height: segmentation.image_height,
            threshold: segmentation.threshold,
            seed_count: segmentation.seed_count,
            first_index,
            cells,
            overview: overview_path.display().to_string(),
        };
        Ok((segmentation, report))
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: {}, min_distance {}",
            self.binarizer.info(),
            self.seed_extractor.min_distance
        )
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        builder::PipelineBuilder::build_standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{MemoryImageSource, MemorySink};
    use image::Rgb;

    fn smear(width: u32, height: u32, centres: &[(i32, i32)], radius: i32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let inside = centres.iter().any(|&(cx, cy)| {
                let (dx, dy) = (x as i32 - cx, y as i32 - cy);
                dx * dx + dy * dy <= radius * radius
            });
            if inside {
                Rgb([150, 60, 80])
            } else {
                Rgb([235, 225, 230])
            }
        })
    }

    #[test]
    fn test_process_single_cell() {
        let image = smear(100, 80, &[(50, 40)], 20);
        let seg = Pipeline::default().process(&image).unwrap();
        assert_eq!(seg.regions.len(), 1);
        assert_eq!(seg.seed_count, 1);
        let bbox = seg.regions[0].bbox;
        assert!(bbox.x.abs_diff(30) <= 2 && bbox.y.abs_diff(20) <= 2);
        assert!(bbox.width.abs_diff(41) <= 2 && bbox.height.abs_diff(41) <= 2);
    }

    #[test]
    fn test_run_writes_cells_then_overview() {
        let image = smear(200, 80, &[(40, 40), (150, 40)], 20);
        let source = MemoryImageSource::new("two", image.clone());
        let mut sink = MemorySink::with_existing(5);

        let report = Pipeline::default().run(&source, &mut sink).unwrap();
        assert_eq!(report.first_index, 6);
        assert_eq!(report.cell_count(), 2);
        let indices: Vec<u32> = sink.cells.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![6, 7]);

        let overview = sink.overview.unwrap();
        assert_eq!(overview.dimensions(), image.dimensions());
        assert_ne!(overview, image);
    }

    #[test]
    fn test_from_config_rejects_bad_min_distance() {
        let config = SegmentationConfig {
            min_distance: f32::INFINITY,
            ..Default::default()
        };
        assert!(Pipeline::from_config(&config).is_err());
    }

    #[test]
    fn test_speck_near_cell_is_not_a_cell_by_default() {
        let mut image = smear(120, 80, &[(40, 40)], 25);
        image.put_pixel(68, 40, Rgb([150, 60, 80]));
        image.put_pixel(69, 40, Rgb([150, 60, 80]));

        let seg = Pipeline::default().process(&image).unwrap();
        assert_eq!(seg.regions.len(), 1);
        assert_eq!(seg.labels.get(68, 40), 0);

        let config = SegmentationConfig {
            seed_all_components: true,
            ..Default::default()
        };
        let pipeline = Pipeline::from_config(&config).unwrap();
        assert!(pipeline.seeds_all_components());
        assert_eq!(pipeline.process(&image).unwrap().regions.len(), 2);
    }

    #[test]
    fn test_from_config_matches_default() {
        let from_config = Pipeline::from_config(&SegmentationConfig::default()).unwrap();
        assert_eq!(from_config.info(), Pipeline::default().info());
    }
}
