//! JWalk-based candidate selection.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use jwalk::{Parallelism, WalkDir};
use serde::Serialize;
use tokio::sync::broadcast;

use coldcompress_core::marker::name_is_compressed;
use coldcompress_core::{FileCandidate, FolderStats, ScanConfig, ScanError, ScanWarning, WarningKind};

use crate::progress::ScanProgress;

type Entry = jwalk::DirEntry<((), ())>;

/// How often (in files) a progress update is broadcast.
const PROGRESS_INTERVAL: u64 = 1000;

/// Candidates produced by one walk, in traversal order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Selection {
    pub candidates: Vec<FileCandidate>,
    /// Entries that were skipped because they could not be inspected.
    pub warnings: Vec<ScanWarning>,
    pub scan_duration: Duration,
}

impl Selection {
    /// Candidate paths, in traversal order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.candidates.iter().map(|c| c.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Combined size of all candidates at selection time.
    pub fn total_size(&self) -> u64 {
        self.candidates.iter().map(|c| c.size).sum()
    }
}

impl IntoIterator for Selection {
    type Item = FileCandidate;
    type IntoIter = std::vec::IntoIter<FileCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_iter()
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = &'a FileCandidate;
    type IntoIter = std::slice::Iter<'a, FileCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Walks directory trees and picks files to compress or decompress.
///
/// Holds no state between walks apart from its configuration.
pub struct Selector {
    config: Arc<ScanConfig>,
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl Selector {
    /// Create a selector with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ScanConfig::default())
    }

    /// Create a selector with a custom configuration.
    pub fn with_config(config: ScanConfig) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            config: Arc::new(config),
            progress_tx,
        }
    }

    /// The walk configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Subscribe to walk progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Find plain files whose last access is older than `threshold`.
    ///
    /// A file qualifies iff `reference_time - atime > threshold`. Files whose
    /// metadata or access time cannot be read are skipped with a warning.
    pub fn find_candidates_for_compression(
        &self,
        root: &Path,
        threshold: Duration,
    ) -> Result<Selection, ScanError> {
        let now = self.config.now();
        let mut candidates = Vec::new();

        let (warnings, scan_duration) = self.walk(root, |entry, compressed, warnings| {
            if compressed {
                return false;
            }

            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    tracing::debug!(path = %path.display(), error = %err, "skipping unreadable entry");
                    warnings.push(ScanWarning::new(&path, err.to_string(), WarningKind::MetadataError));
                    return false;
                }
            };

            let accessed = match metadata.accessed() {
                Ok(t) => t,
                Err(err) => {
                    warnings.push(ScanWarning::new(
                        &path,
                        err.to_string(),
                        WarningKind::AccessTimeUnavailable,
                    ));
                    return false;
                }
            };

            let age = access_age(now, accessed);
            if age > threshold {
                candidates.push(FileCandidate::new(path, metadata.len(), age));
                true
            } else {
                false
            }
        })?;

        tracing::debug!(
            root = %root.display(),
            candidates = candidates.len(),
            threshold_secs = threshold.as_secs(),
            "compression selection finished"
        );

        Ok(Selection {
            candidates,
            warnings,
            scan_duration,
        })
    }

    /// Find every file carrying the compressed-form marker.
    pub fn find_candidates_for_decompression(&self, root: &Path) -> Result<Selection, ScanError> {
        let now = self.config.now();
        let mut candidates = Vec::new();

        let (warnings, scan_duration) = self.walk(root, |entry, compressed, warnings| {
            if !compressed {
                return false;
            }

            // Size and age are informational here; an unreadable stat does not exclude the file
            let (size, age) = match entry.metadata() {
                Ok(m) => (
                    m.len(),
                    m.accessed().map(|t| access_age(now, t)).unwrap_or_default(),
                ),
                Err(err) => {
                    warnings.push(ScanWarning::new(
                        entry.path(),
                        err.to_string(),
                        WarningKind::MetadataError,
                    ));
                    (0, Duration::ZERO)
                }
            };

            candidates.push(FileCandidate::new(entry.path(), size, age));
            true
        })?;

        Ok(Selection {
            candidates,
            warnings,
            scan_duration,
        })
    }

    /// Count all regular files under `root` and how many are compressed.
    pub fn folder_stats(&self, root: &Path) -> Result<FolderStats, ScanError> {
        let mut stats = FolderStats::default();

        self.walk(root, |_entry, compressed, _warnings| {
            stats.record(compressed);
            compressed
        })?;

        Ok(stats)
    }

    /// Visit every regular file under `root` in sorted traversal order.
    ///
    /// `visit` receives the entry and whether its name carries the marker,
    /// and returns whether the entry was accepted.
    fn walk<F>(&self, root: &Path, mut visit: F) -> Result<(Vec<ScanWarning>, Duration), ScanError>
    where
        F: FnMut(&Entry, bool, &mut Vec<ScanWarning>) -> bool,
    {
        let start = Instant::now();
        let root_metadata = std::fs::metadata(root).map_err(|e| ScanError::io(root, e))?;
        if !root_metadata.is_dir() {
            return Err(ScanError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let parallelism = match self.config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let ignore = Arc::clone(&self.config);
        let walker = WalkDir::new(root)
            .parallelism(parallelism)
            .sort(true)
            .skip_hidden(!self.config.include_hidden)
            .follow_links(self.config.follow_symlinks)
            .max_depth(
                self.config
                    .max_depth
                    .map(|d| d as usize)
                    .unwrap_or(usize::MAX),
            )
            .process_read_dir(move |_depth, _path, _state, children| {
                // Pruning here keeps ignored directories from being descended into
                children.retain(|child| match child {
                    Ok(entry) => !ignore.should_ignore(&entry.file_name.to_string_lossy()),
                    Err(_) => true,
                });
            });

        let mut warnings = Vec::new();
        let mut progress = ScanProgress::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    tracing::warn!(path = %path.display(), error = %err, "failed to read directory entry");
                    warnings.push(ScanWarning::new(path, err.to_string(), WarningKind::ReadError));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let compressed = name_is_compressed(entry.file_name());
            if visit(&entry, compressed, &mut warnings) {
                progress.candidates_found += 1;
            }

            progress.files_scanned += 1;
            if progress.files_scanned % PROGRESS_INTERVAL == 0 {
                progress.current_path = entry.path();
                progress.errors_count = warnings.len() as u64;
                progress.elapsed = start.elapsed();
                let _ = self.progress_tx.send(progress.clone());
            }
        }

        let elapsed = start.elapsed();
        progress.errors_count = warnings.len() as u64;
        progress.elapsed = elapsed;
        progress.finished = true;
        let _ = self.progress_tx.send(progress);

        Ok((warnings, elapsed))
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

/// Age of an access time relative to `now`; access times in the future count as zero.
fn access_age(now: SystemTime, accessed: SystemTime) -> Duration {
    now.duration_since(accessed).unwrap_or(Duration::ZERO)
}
