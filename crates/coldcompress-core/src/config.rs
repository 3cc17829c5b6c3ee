//! Selector and transformer configuration.

use std::time::SystemTime;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default zlib level: slowest, smallest output.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 9;

/// Configuration for directory walks.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Follow symbolic links. Off by default so link cycles cannot recurse.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Names to skip: exact names, `prefix*` or `*suffix`.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Number of threads for the walk (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Instant ages are measured against (None = now, taken once per walk).
    #[builder(default)]
    #[serde(default)]
    pub reference_time: Option<SystemTime>,
}

fn default_true() -> bool {
    true
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref patterns) = self.ignore_patterns {
            if patterns.iter().any(|p| p.is_empty() || p == "*") {
                return Err("Ignore patterns cannot be empty or match everything".to_string());
            }
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Check if an entry name matches one of the ignore patterns.
    pub fn should_ignore(&self, name: &str) -> bool {
        self.ignore_patterns.iter().any(|pattern| {
            if let Some(prefix) = pattern.strip_suffix('*') {
                name.starts_with(prefix)
            } else if let Some(suffix) = pattern.strip_prefix('*') {
                name.ends_with(suffix)
            } else {
                name == pattern
            }
        })
    }

    /// The reference instant for this walk.
    pub fn now(&self) -> SystemTime {
        self.reference_time.unwrap_or_else(SystemTime::now)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
            ignore_patterns: Vec::new(),
            threads: 0,
            reference_time: None,
        }
    }
}

/// What to do when the destination of a transformation already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CollisionPolicy {
    /// Leave both files alone and report a collision.
    #[default]
    Fail,
    /// Atomically replace the existing destination.
    ///
    /// The old destination is gone once the rename lands. If the source then
    /// cannot be removed, the new file is deleted too and the call fails, so
    /// only the source remains.
    Overwrite,
}

/// Configuration for the transformer, fixed for its whole lifetime.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct TransformConfig {
    /// zlib compression level, 0 to 9.
    #[builder(default = "DEFAULT_COMPRESSION_LEVEL")]
    #[serde(default = "default_level")]
    pub compression_level: u32,

    /// Behaviour when the destination exists.
    #[builder(default)]
    #[serde(default)]
    pub collision: CollisionPolicy,
}

fn default_level() -> u32 {
    DEFAULT_COMPRESSION_LEVEL
}

impl TransformConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.compression_level {
            Some(level) if level > 9 => Err(format!(
                "Compression level must be between 0 and 9, got {level}"
            )),
            _ => Ok(()),
        }
    }
}

impl TransformConfig {
    /// Create a new transform config builder.
    pub fn builder() -> TransformConfigBuilder {
        TransformConfigBuilder::default()
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            collision: CollisionPolicy::Fail,
        }
    }
}
