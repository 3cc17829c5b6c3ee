//! The compressed-form naming convention.
//!
//! A file is in compressed form iff its name ends with [`COMPRESSED_EXTENSION`]
//! and has at least one byte in front of it. The marker is appended after the
//! full original name, so `report.txt` becomes `report.txt.zz` and stripping
//! the marker recovers the original name exactly.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Suffix appended to a file name to mark its compressed form.
pub const COMPRESSED_EXTENSION: &str = ".zz";

/// Check whether a file name carries the compressed-form marker.
pub fn name_is_compressed(name: &OsStr) -> bool {
    let bytes = name.as_encoded_bytes();
    bytes.len() > COMPRESSED_EXTENSION.len() && bytes.ends_with(COMPRESSED_EXTENSION.as_bytes())
}

/// Check whether the last component of `path` carries the marker.
pub fn is_compressed(path: &Path) -> bool {
    path.file_name().is_some_and(name_is_compressed)
}

/// Path of the compressed sibling for a plain file.
///
/// Returns `None` when the path has no file name or is already compressed.
pub fn compressed_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    if name_is_compressed(name) {
        return None;
    }

    let mut compressed = OsString::from(name);
    compressed.push(COMPRESSED_EXTENSION);
    Some(path.with_file_name(compressed))
}

/// Path of the plain file a compressed file decompresses to.
///
/// Returns `None` when the path does not carry the marker.
pub fn original_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    if !name_is_compressed(name) {
        return None;
    }

    let stripped = strip_marker(name)?;
    Some(path.with_file_name(stripped))
}

#[cfg(unix)]
fn strip_marker(name: &OsStr) -> Option<OsString> {
    use std::os::unix::ffi::OsStrExt;

    let bytes = name.as_bytes();
    let stem = &bytes[..bytes.len() - COMPRESSED_EXTENSION.len()];
    Some(OsStr::from_bytes(stem).to_os_string())
}

#[cfg(not(unix))]
fn strip_marker(name: &OsStr) -> Option<OsString> {
    // Non-UTF-8 names cannot be sliced safely here
    name.to_str()
        .and_then(|s| s.strip_suffix(COMPRESSED_EXTENSION))
        .map(OsString::from)
}
