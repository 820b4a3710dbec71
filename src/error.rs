//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror. Every
//! failure raised while rendering is caught at the render boundary and turned
//! into a placeholder response, so these never reach an HTTP caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Source image not found: {0}")]
    SourceNotFound(String),

    #[error("Rejected path outside the source root: {0}")]
    PathTraversal(String),

    #[error("Permission denied: role '{0}' required")]
    PermissionDenied(String),

    #[error("Invalid operation parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported image format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Cache write failed: {0}")]
    CacheWrite(#[source] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
