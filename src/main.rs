//! coldcompress - compress files nobody has touched in a while.
//!
//! Usage:
//!   coldcompress compress [PATH]     Compress files not accessed for N days
//!   coldcompress decompress [PATH]   Restore every .zz file under PATH
//!   coldcompress scan [PATH]         List candidates without touching files
//!   coldcompress stats [PATH]        Count plain and compressed files
//!   coldcompress --help              Show help

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use coldcompress_core::{BatchSummary, OperationResult, TransformConfig};
use coldcompress_ops::{
    BatchEvent, CollisionPolicy, OperationKind, Transformer, run_batch_parallel, start_batch,
};
use coldcompress_scan::{Selection, Selector, threshold_from_days};

#[derive(Parser)]
#[command(
    name = "coldcompress",
    version,
    about = "Compress files nobody has touched in a while",
    long_about = "coldcompress finds files whose last access is older than a threshold \
                  and replaces each one with a zlib-compressed `<name>.zz` sibling.\n\n\
                  `decompress` restores them. Every file is rewritten atomically, so an \
                  interrupted run never loses data."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress files not accessed within the threshold
    Compress {
        /// Directory to process
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Minimum days since last access
        #[arg(short, long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=365))]
        days: u32,

        /// Replace an existing `.zz` file instead of skipping the source
        #[arg(long)]
        overwrite: bool,

        /// Worker threads (1 = sequential and cancellable with Ctrl-C)
        #[arg(short, long, default_value = "1")]
        jobs: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Restore every compressed file
    Decompress {
        /// Directory to process
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Replace an existing plain file of the same name
        #[arg(long)]
        overwrite: bool,

        /// Worker threads (1 = sequential and cancellable with Ctrl-C)
        #[arg(short, long, default_value = "1")]
        jobs: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List candidates without modifying anything
    Scan {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Minimum days since last access
        #[arg(short, long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=365))]
        days: u32,

        /// List compressed files instead of compression candidates
        #[arg(long)]
        compressed: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Count plain and compressed files
    Stats {
        /// Directory to inspect
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Compress {
            path,
            days,
            overwrite,
            jobs,
            format,
        } => run_transform(OperationKind::Compress, &path, days, overwrite, jobs, format),
        Command::Decompress {
            path,
            overwrite,
            jobs,
            format,
        } => run_transform(OperationKind::Decompress, &path, 0, overwrite, jobs, format),
        Command::Scan {
            path,
            days,
            compressed,
            format,
        } => run_scan(&path, days, compressed, format),
        Command::Stats { path, format } => run_stats(&path, format),
    }
}

/// Install the stderr log subscriber.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Select candidates under `path` and transform them.
fn run_transform(
    kind: OperationKind,
    path: &Path,
    days: u32,
    overwrite: bool,
    jobs: usize,
    format: OutputFormat,
) -> Result<()> {
    let path = path.canonicalize().context("Invalid path")?;

    eprintln!("Scanning {}...", path.display());
    let selection = select(&Selector::new(), kind, &path, days)?;
    report_warnings(&selection);

    let policy = if overwrite {
        CollisionPolicy::Overwrite
    } else {
        CollisionPolicy::Fail
    };
    let config = TransformConfig::builder()
        .collision(policy)
        .build()
        .context("Invalid transformer configuration")?;
    let transformer = Transformer::with_config(config);

    eprintln!(
        "{} {} file(s), {}...",
        verb(kind),
        selection.len(),
        format_size(selection.total_size())
    );

    let paths = selection.paths();
    let (results, summary) = if jobs > 1 {
        transform_parallel(&transformer, kind, &paths, jobs, format)
    } else {
        transform_cancellable(transformer, kind, paths, format)?
    };

    match format {
        OutputFormat::Text => print_summary(&summary),
        OutputFormat::Json => {
            let report = serde_json::json!({ "results": results, "summary": summary });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if summary.is_success() {
        Ok(())
    } else {
        Err(eyre!("{} file(s) could not be processed", summary.files_failed))
    }
}

fn select(selector: &Selector, kind: OperationKind, path: &Path, days: u32) -> Result<Selection> {
    let selection = match kind {
        OperationKind::Compress => {
            selector.find_candidates_for_compression(path, threshold_from_days(days))
        }
        OperationKind::Decompress => selector.find_candidates_for_decompression(path),
    };
    selection.context("Scan failed")
}

/// Run the batch on a rayon pool. Not interruptible between files.
fn transform_parallel(
    transformer: &Transformer,
    kind: OperationKind,
    paths: &[PathBuf],
    jobs: usize,
    format: OutputFormat,
) -> (Vec<OperationResult>, BatchSummary) {
    let results = Mutex::new(Vec::with_capacity(paths.len()));

    let summary = run_batch_parallel(transformer, kind, paths, jobs, |result| {
        if let OutputFormat::Text = format {
            print_result(result);
        }
        if let Ok(mut results) = results.lock() {
            results.push(result.clone());
        }
    });

    let results = results.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    (results, summary)
}

/// Run the batch on a tokio task, cancelling between files on Ctrl-C.
fn transform_cancellable(
    transformer: Transformer,
    kind: OperationKind,
    paths: Vec<PathBuf>,
    format: OutputFormat,
) -> Result<(Vec<OperationResult>, BatchSummary)> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    runtime.block_on(async move {
        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Interrupted, stopping after the current file...");
                interrupt.cancel();
            }
        });

        let mut rx = start_batch(Arc::new(transformer), kind, paths, cancel);
        let mut results = Vec::new();
        let mut summary = BatchSummary::new(kind);

        while let Some(event) = rx.recv().await {
            match event {
                BatchEvent::Progress(progress) => {
                    tracing::debug!(
                        done = progress.files_completed,
                        total = progress.files_total,
                        percent = progress.percentage(),
                        "batch progress"
                    );
                }
                BatchEvent::Processed(result) => {
                    if let OutputFormat::Text = format {
                        print_result(&result);
                    }
                    results.push(result);
                }
                BatchEvent::Complete(complete) => summary = complete,
            }
        }

        Ok((results, summary))
    })
}

/// List candidates without modifying anything.
fn run_scan(path: &Path, days: u32, compressed: bool, format: OutputFormat) -> Result<()> {
    let path = path.canonicalize().context("Invalid path")?;
    let kind = if compressed {
        OperationKind::Decompress
    } else {
        OperationKind::Compress
    };

    eprintln!("Scanning {}...", path.display());
    let selection = select(&Selector::new(), kind, &path, days)?;

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            if compressed {
                println!(" Compressed files under {}", path.display());
            } else {
                println!(
                    " Files under {} not accessed for more than {} days",
                    path.display(),
                    days
                );
            }
            println!("{}", "─".repeat(70));
            println!();

            if selection.is_empty() {
                println!(" Nothing found.");
            } else {
                for candidate in &selection {
                    let display = candidate
                        .path
                        .strip_prefix(&path)
                        .unwrap_or(&candidate.path)
                        .display();
                    if compressed {
                        println!(" {:>10}  {}", format_size(candidate.size), display);
                    } else {
                        println!(
                            " {:>10}  {:>5}d  {}",
                            format_size(candidate.size),
                            candidate.age_secs() / (24 * 60 * 60),
                            display
                        );
                    }
                }
                println!();
                println!(
                    " {} file(s), {} total, scanned in {:.2}s",
                    selection.len(),
                    format_size(selection.total_size()),
                    selection.scan_duration.as_secs_f64()
                );
            }
            report_warnings(&selection);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&selection)?);
        }
    }

    Ok(())
}

/// Show plain and compressed file counts.
fn run_stats(path: &Path, format: OutputFormat) -> Result<()> {
    let path = path.canonicalize().context("Invalid path")?;
    let stats = Selector::new().folder_stats(&path).context("Scan failed")?;

    match format {
        OutputFormat::Text => {
            println!("{}", path.display());
            println!("  Total files:      {}", stats.total_files);
            println!("  Compressed files: {}", stats.compressed_files);
            println!("  Plain files:      {}", stats.plain_files());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn print_result(result: &OperationResult) {
    if result.success {
        println!(" {}", result.message);
    } else {
        eprintln!(" {}", result.message);
    }
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("{}", "─".repeat(60));
    println!(" {}", summary.summary());
    if summary.kind == OperationKind::Compress {
        println!(
            " Space saved: {} ({} -> {})",
            format_signed_size(summary.space_saved),
            format_size(summary.bytes_before),
            format_size(summary.bytes_after)
        );
    }
    println!("{}", "─".repeat(60));

    for error in &summary.errors {
        eprintln!(" [{}] {}", error.kind, error.path.display());
    }
}

fn report_warnings(selection: &Selection) {
    if !selection.warnings.is_empty() {
        eprintln!("{} file(s) skipped during scan", selection.warnings.len());
    }
}

fn verb(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Compress => "Compressing",
        OperationKind::Decompress => "Decompressing",
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Format a size that may be negative (compression that grew the file).
fn format_signed_size(bytes: i64) -> String {
    if bytes < 0 {
        format!("-{}", format_size(bytes.unsigned_abs()))
    } else {
        format_size(bytes.unsigned_abs())
    }
}
