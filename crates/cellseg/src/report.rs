use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{error::Result, types::BoundingBox};

/// One persisted crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub label: u32,
    pub file: String,
    pub bbox: BoundingBox,
    /// Pixels carrying the label
    pub area: u32,
    /// Area enclosed by the traced contour
    pub contour_area: f64,
}

/// Summary of one run, written as JSON on request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub input: String,
    pub output: String,
    pub image_width: u32,
    pub image_height: u32,
    pub threshold: u8,
    pub seed_count: u32,
    pub first_index: u32,
    pub cells: Vec<CellRecord>,
    pub overview: String,
}

impl RunReport {
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunReport {
        RunReport {
            input: "smear.png".into(),
            output: "out".into(),
            image_width: 64,
            image_height: 48,
            threshold: 117,
            seed_count: 1,
            first_index: 1,
            cells: vec![CellRecord {
                label: 1,
                file: "out/cell1.png".into(),
                bbox: BoundingBox { x: 3, y: 4, width: 10, height: 12 },
                area: 95,
                contour_area: 88.5,
            }],
            overview: "out/00.png".into(),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        let report = sample();
        report.save(&path).unwrap();
        assert_eq!(RunReport::load(&path).unwrap(), report);
    }

    #[test]
    fn test_json_field_names() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"seed_count\": 1"));
        assert!(json.contains("\"width\": 10"));
        assert_eq!(sample().cell_count(), 1);
    }
}
