use std::collections::VecDeque;

use crate::{error::Result, traits::MaskPostProcessor, types::BinaryMask};

/// Fill background pockets enclosed by foreground.
///
/// Background reachable from the image border through 4-connected background
/// stays background; everything else becomes foreground. For an 8-connected
/// foreground this equals rasterizing the filled interior of every external
/// contour.
pub fn fill_holes(mask: &BinaryMask) -> BinaryMask {
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 {
        return mask.clone();
    }

    let mut outside = vec![false; mask.len()];
    let mut queue = VecDeque::new();

    let seed = |x: u32, y: u32, outside: &mut [bool], queue: &mut VecDeque<(u32, u32)>| {
        let i = mask.index(x, y);
        if !mask.as_slice()[i] && !outside[i] {
            outside[i] = true;
            queue.push_back((x, y));
        }
    };

    for x in 0..width {
        seed(x, 0, &mut outside, &mut queue);
        seed(x, height - 1, &mut outside, &mut queue);
    }
    for y in 0..height {
        seed(0, y, &mut outside, &mut queue);
        seed(width - 1, y, &mut outside, &mut queue);
    }

    while let Some((x, y)) = queue.pop_front() {
        let mut visit = |nx: u32, ny: u32| {
            let i = mask.index(nx, ny);
            if !mask.as_slice()[i] && !outside[i] {
                outside[i] = true;
                queue.push_back((nx, ny));
            }
        };
        if x > 0 {
            visit(x - 1, y);
        }
        if x + 1 < width {
            visit(x + 1, y);
        }
        if y > 0 {
            visit(x, y - 1);
        }
        if y + 1 < height {
            visit(x, y + 1);
        }
    }

    BinaryMask::from_fn(width, height, |x, y| !outside[mask.index(x, y)])
}

/// Hole filling post-processor
#[derive(Debug, Clone, Default)]
pub struct HoleFiller;

impl MaskPostProcessor for HoleFiller {
    fn process(&self, mask: BinaryMask) -> Result<BinaryMask> {
        Ok(fill_holes(&mask))
    }

    fn name(&self) -> &'static str {
        "fill_holes"
    }
}
