//! Selection output types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Convert a day count into an age threshold.
pub fn threshold_from_days(days: u32) -> Duration {
    Duration::from_secs(u64::from(days) * SECONDS_PER_DAY)
}

/// A file selected for transformation, with the attributes that justified it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCandidate {
    /// Path of the file.
    pub path: PathBuf,
    /// Size in bytes at selection time.
    pub size: u64,
    /// Time since last access, relative to the walk's reference instant.
    pub accessed_age: Duration,
}

impl FileCandidate {
    /// Create a new candidate.
    pub fn new(path: impl Into<PathBuf>, size: u64, accessed_age: Duration) -> Self {
        Self {
            path: path.into(),
            size,
            accessed_age,
        }
    }

    /// Last-access age in whole seconds.
    pub fn age_secs(&self) -> u64 {
        self.accessed_age.as_secs()
    }
}

/// File counts for a directory tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderStats {
    /// Every regular file seen.
    pub total_files: u64,
    /// Files carrying the compressed-form marker.
    pub compressed_files: u64,
}

impl FolderStats {
    /// Count one file.
    pub fn record(&mut self, compressed: bool) {
        self.total_files += 1;
        if compressed {
            self.compressed_files += 1;
        }
    }

    /// Files not in compressed form.
    pub fn plain_files(&self) -> u64 {
        self.total_files - self.compressed_files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_from_days() {
        assert_eq!(threshold_from_days(30), Duration::from_secs(2_592_000));
        assert_eq!(threshold_from_days(0), Duration::ZERO);
    }

    #[test]
    fn test_folder_stats_record() {
        let mut stats = FolderStats::default();
        stats.record(false);
        stats.record(true);
        stats.record(false);

        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.compressed_files, 1);
        assert_eq!(stats.plain_files(), 2);
    }
}
