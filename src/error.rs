//! Structured error types for source loading and tree access.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Source errors
    MissingFile,
    UnknownFormat,
    SyntaxError,
    InvalidSpec,
    TransformFailed,

    // Tree errors
    InvalidNamespace,
    InvalidPath,
    MissingSegment,
    NotATree,

    // Internal errors
    IoError,
}

/// Errors raised while resolving, loading, or storing configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// A file source could not be resolved and the caller asked for a hard failure.
    #[error("configuration file not found: {name}")]
    MissingFile { name: String },

    #[error("no parser registered for '.{extension}' ({})", path.display())]
    UnknownFormat { path: PathBuf, extension: String },

    #[error("invalid syntax in {}: {message}", path.display())]
    Syntax { path: PathBuf, message: String },

    /// An environment spec is malformed. Always a caller mistake.
    #[error("invalid environment spec '{spec}': {reason}")]
    InvalidSpec { spec: String, reason: String },

    /// A caller-supplied transform rejected a value.
    #[error("transform failed for '{path}'")]
    Transform {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid namespace '{namespace}': namespace must not be blank")]
    InvalidNamespace { namespace: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("path '{path}' has no segment '{segment}'")]
    MissingSegment { path: String, segment: String },

    #[error("'{path}' holds a value, not a subtree")]
    NotATree { path: String },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::MissingFile { .. } => ErrorCode::MissingFile,
            Error::UnknownFormat { .. } => ErrorCode::UnknownFormat,
            Error::Syntax { .. } => ErrorCode::SyntaxError,
            Error::InvalidSpec { .. } => ErrorCode::InvalidSpec,
            Error::Transform { .. } => ErrorCode::TransformFailed,
            Error::InvalidNamespace { .. } => ErrorCode::InvalidNamespace,
            Error::InvalidPath { .. } => ErrorCode::InvalidPath,
            Error::MissingSegment { .. } => ErrorCode::MissingSegment,
            Error::NotATree { .. } => ErrorCode::NotATree,
            Error::Io { .. } => ErrorCode::IoError,
        }
    }

    /// Whether tolerant loading may swallow this error into an empty tree.
    pub fn is_format_error(&self) -> bool {
        matches!(self, Error::UnknownFormat { .. } | Error::Syntax { .. })
    }

    // Convenience constructors

    pub fn missing_file(name: &str) -> Self {
        Error::MissingFile {
            name: name.to_string(),
        }
    }

    pub fn syntax(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Syntax {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid_spec(spec: &str, reason: impl Into<String>) -> Self {
        Error::InvalidSpec {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn transform(path: &str, source: anyhow::Error) -> Self {
        Error::Transform {
            path: path.to_string(),
            source,
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for layerconf operations.
pub type Result<T> = std::result::Result<T, Error>;
