//! Error types for the transform pipeline
//!
//! Provides error handling for:
//! - Transforming one module (extraction, emission)
//! - Loading configuration
//! - File ingress through the transform service

use std::path::PathBuf;
use storytest_codegen::EmitError;
use storytest_csf::{ExtractError, LayoutError};

/// Errors transforming one story module
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    /// Module could not be analyzed
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Output could not be assembled
    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Errors loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the expected shape
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A story location rule is invalid
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Errors from file ingress
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the size limit
    #[error("{path} is too large: {size} bytes (max: {max})")]
    FileTooLarge { path: PathBuf, size: usize, max: usize },

    /// Transform of the file failed
    #[error("failed to transform {path}: {source}")]
    Transform {
        path: PathBuf,
        #[source]
        source: TransformError,
    },
}

impl ServiceError {
    /// Create IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_error_is_transparent() {
        let err = TransformError::from(ExtractError::malformed("module has no default export"));
        assert_eq!(err.to_string(), "malformed story module: module has no default export");
    }

    #[test]
    fn service_error_names_file() {
        let err = ServiceError::FileTooLarge {
            path: PathBuf::from("big.stories.tsx"),
            size: 20,
            max: 10,
        };
        assert_eq!(err.to_string(), "big.stories.tsx is too large: 20 bytes (max: 10)");
    }
}
