use cellseg::{SegmentError, SegmentationConfig};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Segment(#[from] SegmentError),
    #[error("Missing input image: pass <INPUT> or set 'input' in the config file")]
    MissingInput,
    #[error("Missing output directory: pass <OUTPUT_DIR> or set 'output_dir' in the config file")]
    MissingOutputDir,
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Run configuration file. Every field is optional so command line flags can fill the gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RunConfig {
    /// Blood smear image to segment
    pub input: Option<PathBuf>,
    /// Directory receiving `cellN.png` crops and the `00.png` overview
    pub output_dir: Option<PathBuf>,
    /// Where to write the JSON run report
    pub report: Option<PathBuf>,
    /// Where to write the binary mask as a PNG
    pub save_mask: Option<PathBuf>,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
}

impl RunConfig {
    /// Load RunConfig from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load RunConfig from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.segmentation.validate()?;
        Ok(config)
    }

    /// Load RunConfig from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load RunConfig from JSON string
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = serde_json::from_str(content)?;
        config.segmentation.validate()?;
        Ok(config)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(ConfigError::UnsupportedFileFormat),
        }
    }

    /// Save RunConfig to a TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Save RunConfig to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self.to_json()?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    pub fn input_path(&self) -> Result<&Path, ConfigError> {
        self.input.as_deref().ok_or(ConfigError::MissingInput)
    }

    pub fn output_dir_path(&self) -> Result<&Path, ConfigError> {
        self.output_dir.as_deref().ok_or(ConfigError::MissingOutputDir)
    }

    /// JSON schema of the configuration file
    pub fn schema_json() -> Result<String, ConfigError> {
        let schema = schemars::schema_for!(RunConfig);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}
