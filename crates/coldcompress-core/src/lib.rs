//! Core types for coldcompress.
//!
//! This crate provides the data structures shared by the selector and the
//! transformer: the compressed-name marker, candidates, per-file results,
//! batch totals, configuration and the error taxonomy.

mod candidate;
mod config;
mod error;
pub mod marker;
mod result;

pub use candidate::{FileCandidate, FolderStats, threshold_from_days};
pub use config::{
    CollisionPolicy, ScanConfig, ScanConfigBuilder, TransformConfig, TransformConfigBuilder,
    DEFAULT_COMPRESSION_LEVEL,
};
pub use error::{ErrorKind, ScanError, ScanWarning, TransformError, WarningKind};
pub use marker::{COMPRESSED_EXTENSION, compressed_path, is_compressed, original_path};
pub use result::{BatchSummary, OperationError, OperationKind, OperationResult};
