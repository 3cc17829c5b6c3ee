//! Stale-file selection for coldcompress.
//!
//! This crate walks a directory tree with jwalk and classifies regular
//! files by the compressed-form marker and by last-access age.
//!
//! # Overview
//!
//! - **Compression candidates**: plain files not accessed for longer than a
//!   threshold
//! - **Decompression candidates**: every file carrying the `.zz` marker
//! - **Folder stats**: total and compressed file counts
//!
//! Unreadable entries are recorded as warnings and skipped; only a missing or
//! non-directory root fails the walk. Symbolic links are not followed unless
//! [`ScanConfig::follow_symlinks`] is set.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use coldcompress_scan::{Selector, threshold_from_days};
//!
//! let selector = Selector::new();
//! let selection = selector
//!     .find_candidates_for_compression(Path::new("/srv/archive"), threshold_from_days(30))
//!     .unwrap();
//!
//! for candidate in &selection {
//!     println!("{} ({} bytes)", candidate.path.display(), candidate.size);
//! }
//! ```

mod progress;
mod selector;

pub use progress::ScanProgress;
pub use selector::{Selection, Selector};

// Re-export core types for convenience
pub use coldcompress_core::{
    FileCandidate, FolderStats, ScanConfig, ScanError, ScanWarning, WarningKind,
    threshold_from_days,
};
