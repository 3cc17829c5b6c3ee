//! Caller-side batch runners.
//!
//! The transformer itself is synchronous and holds no shared state. These
//! helpers drive it over a list of candidates and aggregate the results:
//!
//! - [`run_batch`] processes paths one after another on the calling thread.
//! - [`run_batch_parallel`] spreads distinct paths over a rayon pool.
//! - [`start_batch`] runs on a tokio task, streams [`BatchEvent`]s, and can be
//!   cancelled between files.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use coldcompress_core::{BatchSummary, OperationKind, OperationResult, TransformError};

use crate::progress::BatchProgress;
use crate::transformer::Transformer;
use crate::BATCH_CHANNEL_SIZE;

/// Event sent through the channel while a batch runs.
#[derive(Debug)]
pub enum BatchEvent {
    /// A file is about to be processed.
    Progress(BatchProgress),
    /// A file finished, successfully or not.
    Processed(OperationResult),
    /// The batch finished or was cancelled.
    Complete(BatchSummary),
}

/// Process `paths` sequentially, calling `on_result` after each file.
pub fn run_batch<F>(
    transformer: &Transformer,
    kind: OperationKind,
    paths: &[PathBuf],
    mut on_result: F,
) -> BatchSummary
where
    F: FnMut(&OperationResult),
{
    let mut summary = BatchSummary::new(kind);

    for path in paths {
        let result = transformer.process(kind, path);
        summary.record(&result);
        on_result(&result);
    }

    tracing::debug!(summary = %summary.summary(), "batch finished");
    summary
}

/// Process `paths` on a rayon pool of `threads` workers (0 = global pool).
///
/// Duplicate paths are dropped so no two workers touch the same file.
/// `on_result` is called from worker threads in completion order.
pub fn run_batch_parallel<F>(
    transformer: &Transformer,
    kind: OperationKind,
    paths: &[PathBuf],
    threads: usize,
    on_result: F,
) -> BatchSummary
where
    F: Fn(&OperationResult) + Sync,
{
    let mut seen = HashSet::with_capacity(paths.len());
    let unique: Vec<&PathBuf> = paths.iter().filter(|p| seen.insert(*p)).collect();

    let run = || {
        unique
            .par_iter()
            .map(|path| {
                let result = transformer.process(kind, path);
                on_result(&result);
                result
            })
            .fold(
                || BatchSummary::new(kind),
                |mut summary, result| {
                    summary.record(&result);
                    summary
                },
            )
            .reduce(
                || BatchSummary::new(kind),
                |mut left, right| {
                    left.merge(right);
                    left
                },
            )
    };

    if threads == 0 {
        return run();
    }

    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(run),
        Err(err) => {
            tracing::warn!(error = %err, "failed to build worker pool, using the global pool");
            run()
        }
    }
}

/// Start a batch on a tokio task.
///
/// Each file runs on the blocking pool. `cancel` is checked before every
/// file; a file already started always runs to completion. The last event is
/// always [`BatchEvent::Complete`].
pub fn start_batch(
    transformer: Arc<Transformer>,
    kind: OperationKind,
    paths: Vec<PathBuf>,
    cancel: CancellationToken,
) -> mpsc::Receiver<BatchEvent> {
    let (tx, rx) = mpsc::channel(BATCH_CHANNEL_SIZE);

    tokio::spawn(async move {
        batch_impl(transformer, kind, paths, cancel, tx).await;
    });

    rx
}

/// Internal implementation of the async batch.
async fn batch_impl(
    transformer: Arc<Transformer>,
    kind: OperationKind,
    paths: Vec<PathBuf>,
    cancel: CancellationToken,
    tx: mpsc::Sender<BatchEvent>,
) {
    let mut progress = BatchProgress::new(kind, paths.len());
    let mut summary = BatchSummary::new(kind);

    for path in paths {
        if cancel.is_cancelled() || tx.is_closed() {
            summary.cancelled = true;
            tracing::info!(
                remaining = progress.files_total - progress.files_completed,
                "batch cancelled"
            );
            break;
        }

        progress.set_current_file(Some(path.clone()));
        let _ = tx.send(BatchEvent::Progress(progress.clone())).await;

        let worker = Arc::clone(&transformer);
        let target = path.clone();
        let result = match tokio::task::spawn_blocking(move || worker.process(kind, &target)).await
        {
            Ok(result) => result,
            Err(e) => {
                let err = TransformError::write(
                    &path,
                    std::io::Error::other(format!("worker task failed: {e}")),
                );
                OperationResult::failed(kind, &path, &err)
            }
        };

        progress.complete_file(&result);
        summary.record(&result);
        let _ = tx.send(BatchEvent::Processed(result)).await;
    }

    let _ = tx.send(BatchEvent::Complete(summary)).await;
}
