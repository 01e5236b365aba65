//! Error types for the asset pipeline.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while loading an asset.
///
/// Apart from [`AssetError::EmptyPath`], which is rejected synchronously,
/// these surface on the worker thread long after the caller got its
/// handle; they are logged and the handle keeps its placeholder.
#[derive(Debug)]
pub enum AssetError {
    /// An empty path was passed to a load request.
    EmptyPath,

    /// Failed to read asset data from disk.
    Io {
        /// The path that failed to load.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The asset bytes could not be decoded/parsed.
    Decode {
        /// The path being loaded.
        path: String,
        /// Description of the error.
        message: String,
    },

    /// The render device refused to materialize the decoded data.
    ResourceCreation {
        /// The path being loaded.
        path: String,
        /// Description of the error.
        message: String,
    },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::EmptyPath => {
                write!(f, "empty asset path")
            }
            AssetError::Io { path, source } => {
                write!(f, "IO error loading '{}': {}", path.display(), source)
            }
            AssetError::Decode { path, message } => {
                write!(f, "failed to decode '{}': {}", path, message)
            }
            AssetError::ResourceCreation { path, message } => {
                write!(f, "failed to create device resource for '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;
