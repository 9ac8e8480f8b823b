use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("Failed to read or write image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Input image not found: {path}")]
    InputNotFound { path: String },

    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Grid size mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SegmentError>;
