//! Error types for selection and transformation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a directory walk.
///
/// Only problems with the root itself are fatal; per-file problems become
/// [`ScanWarning`]s.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for the root.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Root path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Error reading a directory entry.
    ReadError,
    /// Error reading metadata.
    MetadataError,
    /// The platform reported no access time for the file.
    AccessTimeUnavailable,
}

/// Non-fatal warning encountered during a walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }
}

/// Coarse classification of a failed transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The source could not be read.
    Read,
    /// The destination could not be written, or the source could not be removed.
    Write,
    /// The compressed stream is invalid or truncated.
    CorruptData,
    /// The source vanished between selection and processing.
    NotFound,
    /// The destination already exists and the policy forbids replacing it.
    Collision,
    /// The file is not in the form the operation expects.
    WrongForm,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read error"),
            Self::Write => write!(f, "write error"),
            Self::CorruptData => write!(f, "corrupt data"),
            Self::NotFound => write!(f, "not found"),
            Self::Collision => write!(f, "destination exists"),
            Self::WrongForm => write!(f, "wrong form"),
        }
    }
}

/// Errors raised while compressing or decompressing a single file.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The source file no longer exists.
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// Reading the source failed.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the destination (or removing the source afterwards) failed.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compressed stream could not be inflated.
    #[error("Corrupt compressed data in {path}: {reason}")]
    CorruptData { path: PathBuf, reason: String },

    /// The destination already exists.
    #[error("Destination already exists: {path}")]
    Collision { path: PathBuf },

    /// Compress was asked to handle a file that is already compressed.
    #[error("Already compressed: {path}")]
    AlreadyCompressed { path: PathBuf },

    /// Decompress was asked to handle a file without the marker.
    #[error("Not a compressed file: {path}")]
    NotCompressed { path: PathBuf },
}

impl TransformError {
    /// Create a read error, mapping a missing file to [`TransformError::NotFound`].
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Read { path, source },
        }
    }

    /// Create a write error.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Read { .. } => ErrorKind::Read,
            Self::Write { .. } => ErrorKind::Write,
            Self::CorruptData { .. } => ErrorKind::CorruptData,
            Self::Collision { .. } => ErrorKind::Collision,
            Self::AlreadyCompressed { .. } | Self::NotCompressed { .. } => ErrorKind::WrongForm,
        }
    }

    /// The path the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound { path }
            | Self::Read { path, .. }
            | Self::Write { path, .. }
            | Self::CorruptData { path, .. }
            | Self::Collision { path }
            | Self::AlreadyCompressed { path }
            | Self::NotCompressed { path } => path,
        }
    }
}
