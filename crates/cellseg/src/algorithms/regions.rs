use image::{GrayImage, Luma, RgbImage};
use imageproc::{
    contours::{find_contours, BorderType, Contour},
    point::Point,
};
use tracing::{debug, warn};

use crate::types::{contour_area, BoundingBox, LabelMap, Region};

/// Pixel extent and population of one label.
#[derive(Debug, Clone, Copy)]
struct Extent {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    count: u32,
}

fn label_extents(labels: &LabelMap) -> Vec<Option<Extent>> {
    let mut extents: Vec<Option<Extent>> = vec![None; labels.max_label() as usize + 1];
    for (i, &l) in labels.as_slice().iter().enumerate() {
        if l == 0 {
            continue;
        }
        let (x, y) = labels.coords(i);
        let e = extents[l as usize].get_or_insert(Extent {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            count: 0,
        });
        e.min_x = e.min_x.min(x);
        e.min_y = e.min_y.min(y);
        e.max_x = e.max_x.max(x);
        e.max_y = e.max_y.max(y);
        e.count += 1;
    }
    extents
}

/// External contours are outer borders that are not nested in any hole.
fn is_external(contour: &Contour<i32>) -> bool {
    contour.border_type == BorderType::Outer && contour.parent.is_none()
}

/// Pick the contour enclosing the largest area. The first one found wins ties.
pub fn largest_contour(contours: Vec<Contour<i32>>) -> Option<Contour<i32>> {
    let mut best: Option<(Contour<i32>, f64)> = None;
    for contour in contours {
        let area = contour_area(&contour.points);
        match &best {
            Some((_, best_area)) if area <= *best_area => {}
            _ => best = Some((contour, area)),
        }
    }
    best.map(|(contour, _)| contour)
}

/// Build one [`Region`] per non-zero label, in ascending label order.
///
/// Each label's mask is traced on a window around its pixels with a one pixel
/// background pad, which yields the same contours as tracing the full frame.
/// Labels without any external contour are skipped.
pub fn extract_regions(labels: &LabelMap) -> Vec<Region> {
    let (width, height) = labels.dimensions();
    let mut regions = Vec::new();

    for (label, extent) in label_extents(labels).into_iter().enumerate().skip(1) {
        let Some(extent) = extent else {
            continue;
        };
        let label = label as u32;

        // Window origin sits one pixel up-left of the extent.
        let win_w = extent.max_x - extent.min_x + 3;
        let win_h = extent.max_y - extent.min_y + 3;
        let window = GrayImage::from_fn(win_w, win_h, |wx, wy| {
            let inside = wx >= 1 && wy >= 1 && wx <= win_w - 2 && wy <= win_h - 2;
            let hit = inside
                && labels.get(extent.min_x + wx - 1, extent.min_y + wy - 1) == label;
            Luma([if hit { 255 } else { 0 }])
        });

        let external: Vec<Contour<i32>> = find_contours::<i32>(&window)
            .into_iter()
            .filter(is_external)
            .collect();
        if external.len() > 1 {
            debug!(label, contours = external.len(), "label has several external contours");
        }

        let Some(contour) = largest_contour(external) else {
            warn!(label, "no external contour, skipping label");
            continue;
        };

        let (ox, oy) = (extent.min_x as i32 - 1, extent.min_y as i32 - 1);
        let points: Vec<Point<i32>> = contour
            .points
            .iter()
            .map(|p| Point::new(p.x + ox, p.y + oy))
            .collect();

        let bbox = match BoundingBox::from_points(&points) {
            Some(bbox) if bbox.fits_within(width, height) => bbox,
            _ => {
                warn!(label, "degenerate bounding box, skipping label");
                continue;
            }
        };

        let mask = GrayImage::from_fn(bbox.width, bbox.height, |x, y| {
            Luma([if labels.get(bbox.x + x, bbox.y + y) == label { 255 } else { 0 }])
        });

        debug!(label, x = bbox.x, y = bbox.y, w = bbox.width, h = bbox.height, "extracted region");
        regions.push(Region {
            label,
            mask,
            contour: points,
            bbox,
            pixel_count: extent.count,
        });
    }

    regions
}

/// Copy the pixels of `image` under `bbox`.
pub fn crop_cell(image: &RgbImage, bbox: &BoundingBox) -> RgbImage {
    image::imageops::crop_imm(image, bbox.x, bbox.y, bbox.width, bbox.height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn labels_from_rows(rows: &[&[u32]]) -> LabelMap {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        LabelMap::from_fn(width, height, |x, y| rows[y as usize][x as usize])
    }

    #[test]
    fn test_regions_in_label_order_with_tight_boxes() {
        let labels = labels_from_rows(&[
            &[0, 0, 0, 0, 0, 0, 0, 0],
            &[0, 2, 2, 0, 0, 0, 0, 0],
            &[0, 2, 2, 0, 0, 1, 1, 1],
            &[0, 0, 0, 0, 0, 1, 1, 1],
            &[0, 0, 0, 0, 0, 0, 0, 0],
        ]);
        let regions = extract_regions(&labels);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].label, 1);
        assert_eq!(regions[0].bbox, BoundingBox { x: 5, y: 2, width: 3, height: 2 });
        assert_eq!(regions[0].pixel_count, 6);
        assert_eq!(regions[1].label, 2);
        assert_eq!(regions[1].bbox, BoundingBox { x: 1, y: 1, width: 2, height: 2 });
    }

    #[test]
    fn test_region_touching_image_edge() {
        let labels = labels_from_rows(&[&[3, 3, 0], &[3, 3, 0]]);
        let regions = extract_regions(&labels);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bbox, BoundingBox { x: 0, y: 0, width: 2, height: 2 });
        assert!(regions[0].bbox.fits_within(3, 2));
    }

    #[test]
    fn test_single_pixel_region_kept() {
        let labels = labels_from_rows(&[&[0, 0, 0], &[0, 5, 0], &[0, 0, 0]]);
        let regions = extract_regions(&labels);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bbox, BoundingBox { x: 1, y: 1, width: 1, height: 1 });
    }

    #[test]
    fn test_region_mask_excludes_other_labels() {
        let labels = labels_from_rows(&[&[1, 1, 1], &[1, 2, 1], &[1, 1, 1]]);
        let regions = extract_regions(&labels);
        let outer = &regions[0];
        assert_eq!(outer.bbox, BoundingBox { x: 0, y: 0, width: 3, height: 3 });
        assert_eq!(outer.mask.get_pixel(1, 1)[0], 0);
        assert_eq!(outer.mask.get_pixel(0, 0)[0], 255);
        assert_eq!(regions[1].bbox, BoundingBox { x: 1, y: 1, width: 1, height: 1 });
    }

    #[test]
    fn test_largest_contour_prefers_area_then_first() {
        let square = |x: i32, y: i32, s: i32| Contour {
            points: vec![
                Point::new(x, y),
                Point::new(x + s, y),
                Point::new(x + s, y + s),
                Point::new(x, y + s),
            ],
            border_type: BorderType::Outer,
            parent: None,
        };
        let best = largest_contour(vec![square(0, 0, 2), square(10, 10, 5), square(20, 20, 5)]).unwrap();
        assert_eq!(best.points[0], Point::new(10, 10));
        assert!(largest_contour(Vec::new()).is_none());
    }

    #[test]
    fn test_crop_cell_copies_pixels() {
        let image = RgbImage::from_fn(6, 4, |x, y| Rgb([x as u8, y as u8, 7]));
        let crop = crop_cell(&image, &BoundingBox { x: 2, y: 1, width: 3, height: 2 });
        assert_eq!(crop.dimensions(), (3, 2));
        assert_eq!(crop.get_pixel(0, 0), &Rgb([2, 1, 7]));
        assert_eq!(crop.get_pixel(2, 1), &Rgb([4, 2, 7]));
    }

    #[test]
    fn test_empty_label_map() {
        let labels = LabelMap::new(10, 10, 0);
        assert!(extract_regions(&labels).is_empty());
    }
}
