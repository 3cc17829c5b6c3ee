//! Single-file compress and decompress.

use std::fs::{self, File, Permissions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use coldcompress_core::{
    CollisionPolicy, OperationKind, OperationResult, TransformConfig, TransformError,
    compressed_path, is_compressed, original_path,
};

use crate::codec;

/// Compresses plain files into `.zz` siblings and restores them.
///
/// The only state is the configuration fixed at construction, so one
/// transformer can be shared freely across threads. Calls on distinct paths
/// may run in parallel; calls on the same path must be serialized by the
/// caller.
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    config: TransformConfig,
}

impl Transformer {
    /// Create a transformer with maximum compression and the `Fail` collision policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transformer with a custom configuration.
    pub fn with_config(config: TransformConfig) -> Self {
        Self { config }
    }

    /// The fixed configuration.
    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Run `kind` on `path`.
    pub fn process(&self, kind: OperationKind, path: &Path) -> OperationResult {
        match kind {
            OperationKind::Compress => self.compress(path),
            OperationKind::Decompress => self.decompress(path),
        }
    }

    /// Replace a plain file with its compressed sibling.
    ///
    /// On failure the original is left exactly as it was and no `.zz` file is
    /// left behind.
    pub fn compress(&self, path: &Path) -> OperationResult {
        match self.try_compress(path) {
            Ok(result) => {
                tracing::info!(
                    path = %path.display(),
                    saved = result.space_saved,
                    ratio = result.ratio,
                    "compressed"
                );
                result
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "compression failed");
                OperationResult::failed(OperationKind::Compress, path, &err)
            }
        }
    }

    /// Replace a compressed file with the plain file it encodes.
    ///
    /// On failure the compressed file is left exactly as it was.
    pub fn decompress(&self, path: &Path) -> OperationResult {
        match self.try_decompress(path) {
            Ok(result) => {
                tracing::info!(path = %path.display(), "decompressed");
                result
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "decompression failed");
                OperationResult::failed(OperationKind::Decompress, path, &err)
            }
        }
    }

    /// Compress `path`, returning the error instead of folding it into a result.
    pub fn try_compress(&self, path: &Path) -> Result<OperationResult, TransformError> {
        if is_compressed(path) {
            return Err(TransformError::AlreadyCompressed {
                path: path.to_path_buf(),
            });
        }
        let destination = compressed_path(path).ok_or_else(|| no_file_name(path))?;
        self.check_collision(&destination)?;

        let (data, permissions) = read_source(path)?;
        let compressed = codec::deflate(&data, self.config.compression_level)
            .map_err(|e| TransformError::write(&destination, e))?;

        write_atomically(&destination, &compressed, permissions, self.config.collision)?;
        remove_source(path, &destination)?;

        Ok(OperationResult::compressed(
            path,
            destination,
            data.len() as u64,
            compressed.len() as u64,
        ))
    }

    /// Decompress `path`, returning the error instead of folding it into a result.
    pub fn try_decompress(&self, path: &Path) -> Result<OperationResult, TransformError> {
        let destination = original_path(path).ok_or_else(|| TransformError::NotCompressed {
            path: path.to_path_buf(),
        })?;
        self.check_collision(&destination)?;

        let (data, permissions) = read_source(path)?;
        let restored = codec::inflate(&data).map_err(|reason| TransformError::CorruptData {
            path: path.to_path_buf(),
            reason,
        })?;

        write_atomically(&destination, &restored, permissions, self.config.collision)?;
        remove_source(path, &destination)?;

        Ok(OperationResult::decompressed(
            path,
            destination,
            data.len() as u64,
            restored.len() as u64,
        ))
    }

    fn check_collision(&self, destination: &Path) -> Result<(), TransformError> {
        // symlink_metadata so a dangling link still counts as occupied
        if self.config.collision == CollisionPolicy::Fail
            && fs::symlink_metadata(destination).is_ok()
        {
            return Err(TransformError::Collision {
                path: destination.to_path_buf(),
            });
        }
        Ok(())
    }
}

fn no_file_name(path: &Path) -> TransformError {
    TransformError::Read {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
    }
}

/// Read the whole source into memory along with its permissions.
fn read_source(path: &Path) -> Result<(Vec<u8>, Permissions), TransformError> {
    let mut file = File::open(path).map_err(|e| TransformError::read(path, e))?;
    let metadata = file.metadata().map_err(|e| TransformError::read(path, e))?;

    let mut data = Vec::with_capacity(metadata.len() as usize);
    file.read_to_end(&mut data)
        .map_err(|e| TransformError::read(path, e))?;

    Ok((data, metadata.permissions()))
}

/// Write `bytes` to `destination` so that it either appears complete or not at all.
///
/// The data goes to a temporary file in the same directory, is synced, and
/// is then renamed over `destination`. Any failure drops the temporary file.
fn write_atomically(
    destination: &Path,
    bytes: &[u8],
    permissions: Permissions,
    policy: CollisionPolicy,
) -> Result<(), TransformError> {
    let dir = parent_dir(destination);
    let write_err = |e| TransformError::write(destination, e);

    let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().set_permissions(permissions).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    let persisted = match policy {
        CollisionPolicy::Fail => tmp.persist_noclobber(destination),
        CollisionPolicy::Overwrite => tmp.persist(destination),
    };

    persisted.map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::AlreadyExists {
            TransformError::Collision {
                path: destination.to_path_buf(),
            }
        } else {
            TransformError::write(destination, e.error)
        }
    })?;

    sync_dir(&dir);
    Ok(())
}

/// Remove the source once its replacement is durable.
///
/// If the source cannot be removed, the replacement is deleted again so the
/// source stays the single copy. Under `Overwrite` this means a destination
/// that existed before the call is not restored.
fn remove_source(source: &Path, replacement: &Path) -> Result<(), TransformError> {
    match fs::remove_file(source) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            // Someone else removed it; the replacement now holds the only copy
            tracing::warn!(path = %source.display(), "source vanished before removal");
            Ok(())
        }
        Err(err) => {
            if let Err(cleanup) = fs::remove_file(replacement) {
                tracing::error!(
                    path = %replacement.display(),
                    error = %cleanup,
                    "failed to roll back replacement; both files remain"
                );
            }
            Err(TransformError::write(source, err))
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(err) = File::open(dir).and_then(|d| d.sync_all()) {
        tracing::debug!(dir = %dir.display(), error = %err, "directory sync failed");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
