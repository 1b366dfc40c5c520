use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while locating, validating, or parsing a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model config not found for: {0}")]
    UnknownModel(String),

    #[error("Unsupported file type: {0} (expected one of {1})")]
    UnsupportedExtension(String, String),

    #[error("File {name} is {size} bytes, larger than the {limit_mb} MB limit")]
    FileTooLarge { name: String, size: u64, limit_mb: u64 },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse glTF: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("Model contains no renderable triangles")]
    Empty,

    #[error("Node {0} appears more than once in the scene hierarchy")]
    InvalidHierarchy(usize),

    #[error("Model loader stopped before delivering a result")]
    Disconnected,
}

/// Errors raised while rendering a frame.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    #[error("Non-finite transform on node {0}")]
    NonFiniteTransform(usize),

    #[error("Raster target of {0}x{1} is too large")]
    TargetTooLarge(usize, usize),
}

/// Errors raised while loading or validating the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}
