//! Progress reporting for batches.

use std::path::PathBuf;

use coldcompress_core::{OperationKind, OperationResult};

/// Progress information for a running batch.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    /// The transformation being applied.
    pub kind: OperationKind,
    /// Files visited so far, successful or not.
    pub files_completed: usize,
    /// Total number of candidates in the batch.
    pub files_total: usize,
    /// Files that failed so far.
    pub files_failed: usize,
    /// Space reclaimed so far.
    pub space_saved: i64,
    /// The file currently being processed.
    pub current_file: Option<PathBuf>,
}

impl BatchProgress {
    /// Create a new progress tracker for a batch.
    pub fn new(kind: OperationKind, files_total: usize) -> Self {
        Self {
            kind,
            files_completed: 0,
            files_total,
            files_failed: 0,
            space_saved: 0,
            current_file: None,
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.files_total > 0 {
            (self.files_completed as f64 / self.files_total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Update the current file being processed.
    pub fn set_current_file(&mut self, path: Option<PathBuf>) {
        self.current_file = path;
    }

    /// Account for a finished file.
    pub fn complete_file(&mut self, result: &OperationResult) {
        self.files_completed += 1;
        if result.success {
            self.space_saved += result.space_saved;
        } else {
            self.files_failed += 1;
        }
    }
}
