use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

use image::RgbImage;
use tracing::debug;

use crate::error::{Result, SegmentError};

/// File name of the annotated overview image.
pub const OVERVIEW_FILE_NAME: &str = "00.png";

/// Name of the `index`-th cell crop.
pub fn cell_file_name(index: u32) -> String {
    format!("cell{}.png", index)
}

/// Where the input image comes from
pub trait ImageSource: Debug {
    /// Check the source is readable before any processing happens
    fn validate(&self) -> Result<()>;

    /// Decode the image as 8-bit RGB
    fn load(&self) -> Result<RgbImage>;

    /// Get a human-readable description of this source
    fn description(&self) -> String;
}

/// Where crops and the overview go
pub trait OutputSink: Debug {
    /// Make the destination ready and return the first cell index to use
    fn prepare(&mut self) -> Result<u32>;

    fn write_cell(&mut self, index: u32, cell: &RgbImage) -> Result<PathBuf>;

    fn write_overview(&mut self, overview: &RgbImage) -> Result<PathBuf>;

    /// Get a human-readable description of this sink
    fn description(&self) -> String;
}

/// An image file on disk
#[derive(Debug, Clone)]
pub struct FileImageSource {
    pub path: PathBuf,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageSource for FileImageSource {
    fn validate(&self) -> Result<()> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(SegmentError::InputNotFound {
                path: self.path.display().to_string(),
            })
        }
    }

    fn load(&self) -> Result<RgbImage> {
        self.validate()?;
        Ok(image::open(&self.path)?.to_rgb8())
    }

    fn description(&self) -> String {
        format!("File: {}", self.path.display())
    }
}

/// An already decoded image
#[derive(Debug, Clone)]
pub struct MemoryImageSource {
    pub name: String,
    pub image: RgbImage,
}

impl MemoryImageSource {
    pub fn new(name: impl Into<String>, image: RgbImage) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }
}

impl ImageSource for MemoryImageSource {
    fn validate(&self) -> Result<()> {
        if self.image.width() == 0 || self.image.height() == 0 {
            return Err(SegmentError::EmptyImage);
        }
        Ok(())
    }

    fn load(&self) -> Result<RgbImage> {
        Ok(self.image.clone())
    }

    fn description(&self) -> String {
        format!("Memory: {} ({}x{})", self.name, self.image.width(), self.image.height())
    }
}

/// Output directory holding `cellN.png` crops and the `00.png` overview.
///
/// Numbering continues from the number of regular files already in the
/// directory, whatever their names. Files are overwritten if names collide.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    pub path: PathBuf,
}

impl DirectorySink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn cell_path(&self, index: u32) -> PathBuf {
        self.path.join(cell_file_name(index))
    }

    pub fn overview_path(&self) -> PathBuf {
        self.path.join(OVERVIEW_FILE_NAME)
    }
}

/// Regular files directly inside `dir`. Subdirectories are not counted.
pub fn count_files(dir: &Path) -> Result<u32> {
    let mut count = 0u32;
    for entry in fs::read_dir(dir)? {
        if entry?.file_type()?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

impl OutputSink for DirectorySink {
    fn prepare(&mut self) -> Result<u32> {
        fs::create_dir_all(&self.path)?;
        let existing = count_files(&self.path)?;
        debug!(dir = %self.path.display(), existing, "prepared output directory");
        Ok(existing + 1)
    }

    fn write_cell(&mut self, index: u32, cell: &RgbImage) -> Result<PathBuf> {
        let path = self.cell_path(index);
        cell.save(&path)?;
        Ok(path)
    }

    fn write_overview(&mut self, overview: &RgbImage) -> Result<PathBuf> {
        let path = self.overview_path();
        overview.save(&path)?;
        Ok(path)
    }

    fn description(&self) -> String {
        format!("Directory: {}", self.path.display())
    }
}

/// Keeps everything in memory. `existing` plays the role of files already present.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub existing: u32,
    pub cells: Vec<(u32, RgbImage)>,
    pub overview: Option<RgbImage>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(existing: u32) -> Self {
        Self {
            existing,
            ..Self::default()
        }
    }
}

impl OutputSink for MemorySink {
    fn prepare(&mut self) -> Result<u32> {
        Ok(self.existing + 1)
    }

    fn write_cell(&mut self, index: u32, cell: &RgbImage) -> Result<PathBuf> {
        self.cells.push((index, cell.clone()));
        Ok(PathBuf::from(cell_file_name(index)))
    }

    fn write_overview(&mut self, overview: &RgbImage) -> Result<PathBuf> {
        self.overview = Some(overview.clone());
        Ok(PathBuf::from(OVERVIEW_FILE_NAME))
    }

    fn description(&self) -> String {
        format!("Memory: {} cells", self.cells.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileImageSource::new(dir.path().join("nope.png"));
        match source.validate() {
            Err(SegmentError::InputNotFound { path }) => assert!(path.ends_with("nope.png")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(source.load().is_err());
    }

    #[test]
    fn test_directory_is_a_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileImageSource::new(dir.path()).validate().is_err());
    }

    #[test]
    fn test_file_source_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.png");
        RgbImage::from_pixel(5, 4, Rgb([1, 2, 3])).save(&path).unwrap();

        let image = FileImageSource::new(&path).load().unwrap();
        assert_eq!(image.dimensions(), (5, 4));
        assert_eq!(image.get_pixel(0, 0), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_sink_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a").join("b");
        let mut sink = DirectorySink::new(&out);
        assert_eq!(sink.prepare().unwrap(), 1);
        assert!(out.is_dir());
    }

    #[test]
    fn test_numbering_continues_after_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let cell = RgbImage::from_pixel(2, 2, Rgb([9, 9, 9]));
        for i in 1..=3 {
            cell.save(dir.path().join(cell_file_name(i))).unwrap();
        }
        fs::create_dir(dir.path().join("sub")).unwrap();

        let mut sink = DirectorySink::new(dir.path());
        let first = sink.prepare().unwrap();
        assert_eq!(first, 4);
        let path = sink.write_cell(first, &cell).unwrap();
        assert!(path.ends_with("cell4.png"));
        assert!(path.is_file());
    }

    #[test]
    fn test_overview_written_as_rgb_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        sink.prepare().unwrap();
        let overview = RgbImage::from_pixel(3, 3, Rgb([200, 100, 50]));
        let path = sink.write_overview(&overview).unwrap();
        assert!(path.ends_with(OVERVIEW_FILE_NAME));

        let back = image::open(&path).unwrap();
        assert_eq!(back.color(), image::ColorType::Rgb8);
        assert_eq!(back.to_rgb8(), overview);
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::with_existing(2);
        assert_eq!(sink.prepare().unwrap(), 3);
        sink.write_cell(3, &RgbImage::new(1, 1)).unwrap();
        assert_eq!(sink.cells.len(), 1);
        assert!(sink.overview.is_none());
    }
}
