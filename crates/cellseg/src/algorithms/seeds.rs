use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use tracing::debug;

use crate::{
    error::{Result, SegmentError},
    types::{BinaryMask, DistanceField, Grid, SeedMap},
};

/// Minimum separation between peaks used when none is configured.
pub const DEFAULT_MIN_DISTANCE: f32 = 20.0;

/// Finds cell centres as distance-field peaks and groups them into seed blobs
#[derive(Debug, Clone)]
pub struct SeedExtractor {
    pub min_distance: f32,
    /// Also seed foreground components that hold no peak of their own, using
    /// their top-valued pixels. Off by default: such components stay unlabeled.
    pub seed_all_components: bool,
}

impl Default for SeedExtractor {
    fn default() -> Self {
        Self {
            min_distance: DEFAULT_MIN_DISTANCE,
            seed_all_components: false,
        }
    }
}

/// Labeled seed blobs
#[derive(Debug, Clone)]
pub struct Seeds {
    pub map: SeedMap,
    pub count: u32,
}

impl SeedExtractor {
    pub fn new(min_distance: f32) -> Result<Self> {
        validate_min_distance(min_distance)?;
        Ok(Self {
            min_distance,
            ..Self::default()
        })
    }

    pub fn with_component_seeding(mut self, enabled: bool) -> Self {
        self.seed_all_components = enabled;
        self
    }

    pub fn extract(&self, distance: &DistanceField, mask: &BinaryMask) -> Result<Seeds> {
        validate_min_distance(self.min_distance)?;
        if distance.dimensions() != mask.dimensions() {
            return Err(SegmentError::DimensionMismatch {
                expected: mask.dimensions(),
                actual: distance.dimensions(),
            });
        }

        let mut maxima = local_maxima(distance, mask, self.min_distance);
        if self.seed_all_components {
            let rescued = seed_unclaimed_components(distance, mask, &mut maxima);
            if rescued > 0 {
                debug!(components = rescued, "seeded components without a local maximum");
            }
        }

        let (map, count) = label_blobs(&maxima);
        debug!(seeds = count, min_distance = self.min_distance, "extracted seeds");
        Ok(Seeds { map, count })
    }
}

fn validate_min_distance(min_distance: f32) -> Result<()> {
    if min_distance.is_finite() && min_distance >= 0.0 {
        Ok(())
    } else {
        Err(SegmentError::InvalidParameter(format!(
            "min_distance must be a finite non-negative number, got {}",
            min_distance
        )))
    }
}

/// Offsets inside the closed disc of the given radius, centre excluded.
/// Callers clamp `radius` to the image diagonal first.
fn disc_offsets(radius: f32) -> Vec<(i64, i64)> {
    let r = radius.floor() as i64;
    let r_sq = radius as f64 * radius as f64;
    let mut offsets = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if (dx != 0 || dy != 0) && ((dx * dx + dy * dy) as f64) <= r_sq {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

/// Foreground pixels with no strictly greater foreground value within `min_distance`.
///
/// Equal values do not suppress each other, so a flat-topped peak keeps every
/// pixel of its plateau.
pub fn local_maxima(distance: &DistanceField, mask: &BinaryMask, min_distance: f32) -> Grid<bool> {
    let (width, height) = mask.dimensions();
    let (w, h) = (width as i64, height as i64);
    // No two pixels are further apart than the diagonal, so a larger disc adds nothing.
    let diagonal = ((w * w + h * h) as f64).sqrt().ceil() as f32;
    let reach = min_distance.min(diagonal);
    let offsets = disc_offsets(reach);
    // Every 8-neighbour lies within the disc once the radius reaches sqrt(2).
    let neighbour_prefilter = (reach as f64) * (reach as f64) >= 2.0;

    let dominated = |x: i64, y: i64, value: f32, offsets: &[(i64, i64)]| {
        offsets.iter().any(|&(dx, dy)| {
            let (nx, ny) = (x + dx, y + dy);
            nx >= 0
                && ny >= 0
                && nx < w
                && ny < h
                && mask.get(nx as u32, ny as u32)
                && distance.get(nx as u32, ny as u32) > value
        })
    };

    const RING: [(i64, i64); 8] = [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

    Grid::from_fn(width, height, |x, y| {
        if !mask.get(x, y) {
            return false;
        }
        let value = distance.get(x, y);
        let (x, y) = (x as i64, y as i64);
        if neighbour_prefilter && dominated(x, y, value, &RING) {
            return false;
        }
        !dominated(x, y, value, &offsets)
    })
}

/// Give every 8-connected foreground component without a maximum its own
/// top-valued pixels as maxima. Returns how many components were seeded this way.
fn seed_unclaimed_components(distance: &DistanceField, mask: &BinaryMask, maxima: &mut Grid<bool>) -> usize {
    let components = connected_components(&mask.to_gray(), Connectivity::Eight, Luma([0u8]));
    let count = components.pixels().map(|p| p[0]).max().unwrap_or(0) as usize;
    if count == 0 {
        return 0;
    }

    let mut claimed = vec![false; count + 1];
    let mut peak = vec![f32::NEG_INFINITY; count + 1];
    for (x, y, p) in components.enumerate_pixels() {
        let c = p[0] as usize;
        if c == 0 {
            continue;
        }
        claimed[c] |= maxima.get(x, y);
        peak[c] = peak[c].max(distance.get(x, y));
    }

    let unclaimed = claimed.iter().skip(1).filter(|&&c| !c).count();
    if unclaimed == 0 {
        return 0;
    }
    for (x, y, p) in components.enumerate_pixels() {
        let c = p[0] as usize;
        if c != 0 && !claimed[c] && distance.get(x, y) == peak[c] {
            maxima.set(x, y, true);
        }
    }
    unclaimed
}

/// 8-connected component labeling of a boolean grid. Ids are dense, starting at 1.
pub fn label_blobs(points: &Grid<bool>) -> (SeedMap, u32) {
    let (width, height) = points.dimensions();
    let image = GrayImage::from_fn(width, height, |x, y| Luma([if points.get(x, y) { 255 } else { 0 }]));
    let labeled = connected_components(&image, Connectivity::Eight, Luma([0u8]));
    let map = SeedMap::from_fn(width, height, |x, y| labeled.get_pixel(x, y)[0]);
    let count = map.max_label();
    (map, count)
}
