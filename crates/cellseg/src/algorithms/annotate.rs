use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;

use crate::types::BoundingBox;

/// Outline colour of the overview boxes.
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Outline thickness in pixels. The box edge itself plus `BOX_THICKNESS - 1`
/// rings grown outward, all clipped to the image.
pub const BOX_THICKNESS: u32 = 2;

/// Draw every box onto a copy of `image`.
pub fn draw_overview(image: &RgbImage, boxes: &[BoundingBox]) -> RgbImage {
    let mut overview = image.clone();
    for bbox in boxes {
        draw_box(&mut overview, bbox);
    }
    overview
}

/// Draw one thick hollow rectangle in place.
pub fn draw_box(image: &mut RgbImage, bbox: &BoundingBox) {
    for grow in 0..BOX_THICKNESS {
        draw_hollow_rect_mut(image, bbox.to_rect(grow), BOX_COLOR);
    }
}
