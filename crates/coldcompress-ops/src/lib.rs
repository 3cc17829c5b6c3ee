//! Compression engine for coldcompress.
//!
//! [`Transformer`] turns one plain file into its `.zz` sibling and back. Each
//! call is synchronous, self-contained and either fully succeeds or leaves the
//! source untouched: output goes to a temporary file in the destination
//! directory, is synced and atomically renamed into place, and only then is
//! the source removed.
//!
//! The [`batch`] module holds caller-side runners that drive the transformer
//! over a list of candidates sequentially, in parallel, or on a tokio task
//! with cancellation between files.

pub mod batch;
mod codec;
mod progress;
mod transformer;

pub use batch::{BatchEvent, run_batch, run_batch_parallel, start_batch};
pub use codec::{deflate, inflate};
pub use progress::BatchProgress;
pub use transformer::Transformer;

pub use coldcompress_core::{
    BatchSummary, CollisionPolicy, ErrorKind, OperationError, OperationKind, OperationResult,
    TransformConfig, TransformError,
};

/// Default channel buffer size for batch events.
pub const BATCH_CHANNEL_SIZE: usize = 100;
