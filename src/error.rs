//! Error types for SDF export.

use crate::export::ExportMode;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ExportError.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Main error type for map loading and export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The map representation has no export handler.
    #[error("Unsupported map representation: {0}")]
    UnsupportedRepresentation(String),

    /// The requested export mode is not implemented.
    #[error("Unsupported export mode: {0:?}")]
    UnsupportedMode(ExportMode),

    /// The destination file could not be created.
    #[error("Failed to open {path:?}: {source}")]
    ResourceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the header, a vertex, or closing the sink failed.
    #[error("Write error: {0}")]
    Write(String),

    /// Enumeration disagreed with the map's declared allocation.
    #[error("Map integrity fault: {0}")]
    Integrity(String),

    /// Export configuration is out of range.
    #[error("Invalid export config: {0}")]
    InvalidConfig(String),

    /// Map data is structurally invalid.
    #[error("Invalid map: {0}")]
    InvalidMap(String),

    /// A PLY file could not be parsed.
    #[error("Malformed PLY: {0}")]
    MalformedPly(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of an [`ExportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedRepresentation,
    UnsupportedMode,
    ResourceOpenFailure,
    WriteFailure,
    IntegrityFault,
    InvalidInput,
}

impl ExportError {
    /// Get the taxonomy tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::UnsupportedRepresentation(_) => ErrorKind::UnsupportedRepresentation,
            ExportError::UnsupportedMode(_) => ErrorKind::UnsupportedMode,
            ExportError::ResourceOpen { .. } => ErrorKind::ResourceOpenFailure,
            ExportError::Write(_) | ExportError::Io(_) => ErrorKind::WriteFailure,
            ExportError::Integrity(_) => ErrorKind::IntegrityFault,
            ExportError::InvalidConfig(_)
            | ExportError::InvalidMap(_)
            | ExportError::MalformedPly(_)
            | ExportError::Json(_) => ErrorKind::InvalidInput,
        }
    }
}
