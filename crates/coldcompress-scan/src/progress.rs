//! Walk progress reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Progress information during a walk.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Regular files examined so far.
    pub files_scanned: u64,
    /// Files accepted as candidates so far.
    pub candidates_found: u64,
    /// Path most recently examined.
    pub current_path: PathBuf,
    /// Number of warnings recorded.
    pub errors_count: u64,
    /// Time elapsed since the walk started.
    pub elapsed: Duration,
    /// Set on the last update of a walk.
    pub finished: bool,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            files_scanned: 0,
            candidates_found: 0,
            current_path: PathBuf::new(),
            errors_count: 0,
            elapsed: Duration::ZERO,
            finished: false,
        }
    }

    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_scanned as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}
