//! Per-file results and batch totals.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, TransformError};

/// The transformation a result describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Compress,
    Decompress,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compress => write!(f, "Compress"),
            Self::Decompress => write!(f, "Decompress"),
        }
    }
}

/// A failure attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// Error class.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: impl Into<PathBuf>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl From<&TransformError> for OperationError {
    fn from(err: &TransformError) -> Self {
        Self::new(err.path(), err.kind(), err.to_string())
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Outcome of a single compress or decompress call.
///
/// `original_path` is always the file the call was given; `transformed_path`
/// is the file it produced, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub kind: OperationKind,
    pub success: bool,
    /// Status line for display.
    pub message: String,
    /// Bytes reclaimed by compression. Negative if the output grew; always 0
    /// for decompression.
    pub space_saved: i64,
    pub original_size: u64,
    pub transformed_size: u64,
    /// `space_saved` as a percentage of `original_size` (0 for empty input).
    pub ratio: f64,
    pub original_path: PathBuf,
    pub transformed_path: Option<PathBuf>,
    pub error: Option<OperationError>,
}

impl OperationResult {
    /// Result of a successful compression.
    pub fn compressed(
        original: impl Into<PathBuf>,
        compressed: impl Into<PathBuf>,
        original_size: u64,
        compressed_size: u64,
    ) -> Self {
        let original = original.into();
        let space_saved = original_size as i64 - compressed_size as i64;
        let ratio = reduction_ratio(original_size, space_saved);

        Self {
            kind: OperationKind::Compress,
            success: true,
            message: format!(
                "Compressed: {} ({ratio:.1}% reduction)",
                display_name(&original)
            ),
            space_saved,
            original_size,
            transformed_size: compressed_size,
            ratio,
            original_path: original,
            transformed_path: Some(compressed.into()),
            error: None,
        }
    }

    /// Result of a successful decompression.
    pub fn decompressed(
        compressed: impl Into<PathBuf>,
        restored: impl Into<PathBuf>,
        compressed_size: u64,
        restored_size: u64,
    ) -> Self {
        let compressed = compressed.into();
        let restored = restored.into();

        Self {
            kind: OperationKind::Decompress,
            success: true,
            message: format!(
                "Decompressed: {} -> {}",
                display_name(&compressed),
                display_name(&restored)
            ),
            space_saved: 0,
            original_size: compressed_size,
            transformed_size: restored_size,
            ratio: 0.0,
            original_path: compressed,
            transformed_path: Some(restored),
            error: None,
        }
    }

    /// Result of a failed call. The source is untouched.
    pub fn failed(kind: OperationKind, path: impl Into<PathBuf>, err: &TransformError) -> Self {
        let path = path.into();
        let verb = match kind {
            OperationKind::Compress => "compressing",
            OperationKind::Decompress => "decompressing",
        };

        Self {
            kind,
            success: false,
            message: format!("Error {verb} {}: {err}", path.display()),
            space_saved: 0,
            original_size: 0,
            transformed_size: 0,
            ratio: 0.0,
            original_path: path,
            transformed_path: None,
            error: Some(OperationError::from(err)),
        }
    }

    /// Error class, if the call failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

fn reduction_ratio(original_size: u64, space_saved: i64) -> f64 {
    if original_size == 0 {
        0.0
    } else {
        space_saved as f64 / original_size as f64 * 100.0
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Running totals over a batch of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub kind: OperationKind,
    /// Files transformed successfully.
    pub files_processed: usize,
    pub files_failed: usize,
    /// Sum of `space_saved` over successful results.
    pub space_saved: i64,
    /// Sum of input sizes over successful results.
    pub bytes_before: u64,
    /// Sum of output sizes over successful results.
    pub bytes_after: u64,
    /// The batch stopped before every candidate was visited.
    pub cancelled: bool,
    pub errors: Vec<OperationError>,
}

impl BatchSummary {
    /// Empty totals for a batch of `kind`.
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            files_processed: 0,
            files_failed: 0,
            space_saved: 0,
            bytes_before: 0,
            bytes_after: 0,
            cancelled: false,
            errors: Vec::new(),
        }
    }

    /// Fold one result into the totals.
    pub fn record(&mut self, result: &OperationResult) {
        if result.success {
            self.files_processed += 1;
            self.space_saved += result.space_saved;
            self.bytes_before += result.original_size;
            self.bytes_after += result.transformed_size;
        } else {
            self.files_failed += 1;
            if let Some(ref error) = result.error {
                self.errors.push(error.clone());
            }
        }
    }

    /// Merge totals from another summary of the same kind.
    pub fn merge(&mut self, other: BatchSummary) {
        self.files_processed += other.files_processed;
        self.files_failed += other.files_failed;
        self.space_saved += other.space_saved;
        self.bytes_before += other.bytes_before;
        self.bytes_after += other.bytes_after;
        self.cancelled |= other.cancelled;
        self.errors.extend(other.errors);
    }

    /// Files visited, successful or not.
    pub fn files_seen(&self) -> usize {
        self.files_processed + self.files_failed
    }

    /// Check if every visited file succeeded.
    pub fn is_success(&self) -> bool {
        self.files_failed == 0
    }

    /// Get a human-readable summary of the batch.
    pub fn summary(&self) -> String {
        let action = match self.kind {
            OperationKind::Compress => "Compressed",
            OperationKind::Decompress => "Decompressed",
        };

        let mut line = if self.files_failed == 0 {
            format!("{} {} files", action, self.files_processed)
        } else {
            format!(
                "{} {} files, {} failed",
                action, self.files_processed, self.files_failed
            )
        };

        if self.cancelled {
            line.push_str(" (cancelled)");
        }
        line
    }
}
