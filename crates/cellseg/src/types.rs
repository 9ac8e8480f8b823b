use image::{GrayImage, Luma};
use imageproc::{point::Point, rect::Rect};
use serde::{Deserialize, Serialize};
use geo_types::{Coord, LineString, Polygon};

/// Row-major grid of per-pixel values with the same geometry as the source image.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

/// Foreground/background mask; `true` marks foreground.
pub type BinaryMask = Grid<bool>;

/// Euclidean distance of each pixel to the nearest background pixel.
pub type DistanceField = Grid<f32>;

/// 0 = no seed, k > 0 = seed blob id.
pub type SeedMap = Grid<u32>;

/// 0 = background or watershed boundary, k > 0 = region grown from seed k.
pub type LabelMap = Grid<u32>;

impl<T: Copy> Grid<T> {
    pub fn new(width: u32, height: u32, fill: T) -> Self {
        Self {
            width,
            height,
            data: vec![fill; width as usize * height as usize],
        }
    }

    /// Build a grid by evaluating `f` at every pixel in row-major order.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> T) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Wrap an existing row-major buffer. Returns `None` if the length does not match.
    pub fn from_vec(width: u32, height: u32, data: Vec<T>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn coords(&self, index: usize) -> (u32, u32) {
        let w = self.width as usize;
        ((index % w) as u32, (index / w) as u32)
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> T {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: T) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Linear indices of the 8-connected neighbours of `index` that lie inside the grid.
    pub fn neighbors8(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let (x, y) = self.coords(index);
        let (w, h) = (self.width as i64, self.height as i64);
        const OFFSETS: [(i64, i64); 8] = [
            (-1, -1), (0, -1), (1, -1),
            (-1, 0),           (1, 0),
            (-1, 1),  (0, 1),  (1, 1),
        ];
        OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            (nx >= 0 && ny >= 0 && nx < w && ny < h).then(|| (ny * w + nx) as usize)
        })
    }
}

impl Grid<bool> {
    /// Any non-zero pixel is foreground.
    pub fn from_gray(image: &GrayImage) -> Self {
        let data = image.pixels().map(|p| p[0] != 0).collect();
        Self {
            width: image.width(),
            height: image.height(),
            data,
        }
    }

    /// Render as a 0/255 image, the layout `imageproc` contour and labelling routines expect.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.get(x, y) { 255 } else { 0 }])
        })
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn has_foreground(&self) -> bool {
        self.data.iter().any(|&v| v)
    }
}

impl Grid<u32> {
    pub fn max_label(&self) -> u32 {
        self.data.iter().copied().max().unwrap_or(0)
    }
}

/// Axis-aligned rectangle in pixel coordinates; `width` and `height` are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Smallest box holding every point, counting pixels inclusively on both ends.
    pub fn from_points(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if min_x < 0 || min_y < 0 {
            return None;
        }
        Some(Self {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0 && self.height > 0 && self.right() <= width && self.bottom() <= height
    }

    /// The box pushed out by `grow` pixels on every side. May extend past the image.
    pub fn to_rect(&self, grow: u32) -> Rect {
        let g = grow as i32;
        Rect::at(self.x as i32 - g, self.y as i32 - g).of_size(self.width + 2 * grow, self.height + 2 * grow)
    }
}

/// One segmented cell candidate.
#[derive(Debug, Clone)]
pub struct Region {
    pub label: u32,
    /// Pixels carrying `label`, cropped to `bbox`.
    pub mask: GrayImage,
    /// Largest external contour in image coordinates.
    pub contour: Vec<Point<i32>>,
    pub bbox: BoundingBox,
    /// Number of pixels carrying `label`.
    pub pixel_count: u32,
}

impl Region {
    /// Area enclosed by the contour polygon.
    pub fn contour_area(&self) -> f64 {
        contour_area(&self.contour)
    }
}

/// Shoelace area of a closed contour. Single points and straight runs enclose nothing.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    use geo::Area;
    if points.len() < 3 {
        return 0.0;
    }
    let coords: Vec<Coord<f64>> = points
        .iter()
        .map(|p| Coord { x: p.x as f64, y: p.y as f64 })
        .collect();
    Polygon::new(LineString::new(coords), vec![]).unsigned_area()
}

/// Everything one pipeline run produces, in stage order.
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub image_width: u32,
    pub image_height: u32,
    /// Global threshold the binarizer applied.
    pub threshold: u8,
    pub mask: BinaryMask,
    pub distance: DistanceField,
    pub seeds: SeedMap,
    pub seed_count: u32,
    pub labels: LabelMap,
    /// Kept regions in ascending label order.
    pub regions: Vec<Region>,
}

impl Segmentation {
    pub fn bounding_boxes(&self) -> Vec<BoundingBox> {
        self.regions.iter().map(|r| r.bbox).collect()
    }
}
