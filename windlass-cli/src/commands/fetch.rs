//! Fetch command - download, verify and extract an artifact.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use windlass::logging::{init_logging, LogOptions};
use windlass::progress::{ExtractProgressCallback, ProgressCallback};
use windlass::{FetchConfig, Pipeline, PipelineHooks, Stage};

use crate::commands::install_interrupt_handler;
use crate::error::CliError;

/// Arguments for the fetch command.
#[derive(Args)]
pub struct FetchArgs {
    /// URL of the file to download.
    pub url: String,

    /// Destination path for the downloaded file.
    pub destination: PathBuf,

    /// Size of each download chunk in bytes.
    #[arg(long, default_value_t = 1024)]
    pub chunk_size: usize,

    /// Retries allowed after the initial attempt.
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    /// Delay between retry attempts in seconds.
    #[arg(long, default_value_t = 60)]
    pub retry_delay: u64,

    /// Timeout per HTTP request in seconds.
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// Skip checksum verification against the pointer descriptor.
    #[arg(long)]
    pub no_verify: bool,

    /// Skip extraction after download.
    #[arg(long)]
    pub no_extract: bool,

    /// Directory to extract into (default: the destination's parent).
    #[arg(long)]
    pub extract_to: Option<PathBuf>,

    /// Maximum nesting depth for recursive extraction.
    #[arg(long, default_value_t = 1)]
    pub max_depth: u32,

    /// Maximum concurrent nested-archive extractions.
    #[arg(long, default_value_t = 4)]
    pub parallel: usize,

    /// Do not write a log file.
    #[arg(long)]
    pub no_log_file: bool,

    /// Do not log to the console.
    #[arg(long)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// Run the fetch command.
pub fn run(args: FetchArgs) -> Result<(), CliError> {
    let log_options = LogOptions {
        console: !args.quiet,
        file: !args.no_log_file,
        debug: args.debug,
        ..LogOptions::default()
    };
    let _log_guard = init_logging(&args.destination, &log_options)
        .map_err(|e| CliError::Config(format!("failed to initialize logging: {}", e)))?;

    let cancel = install_interrupt_handler()?;

    let mut config = FetchConfig::new()
        .with_chunk_size(args.chunk_size)
        .with_max_retries(args.max_retries)
        .with_retry_delay(Duration::from_secs(args.retry_delay))
        .with_timeout(Duration::from_secs(args.timeout))
        .with_verify(!args.no_verify)
        .with_extract(!args.no_extract)
        .with_max_depth(args.max_depth)
        .with_parallel_extractions(args.parallel);
    if let Some(dir) = args.extract_to.clone() {
        config = config.with_extract_to(dir);
    }

    let pipeline = Pipeline::new(config);
    let hooks = build_hooks(&args);

    info!(url = %args.url, destination = %args.destination.display(), "starting fetch");
    let report = pipeline.run(&args.url, &args.destination, hooks, &cancel)?;

    println!("Downloaded {} bytes to {}", report.bytes_downloaded, args.destination.display());
    if let Some(verification) = &report.verification {
        println!("Integrity verified (sha256 {})", verification.computed);
    }
    if let Some(extraction) = &report.extraction {
        println!(
            "Extracted {} entries ({} nested archives)",
            extraction.entries_extracted, extraction.nested_archives
        );
    }

    Ok(())
}

/// Wire progress bars and stage banners into pipeline hooks.
fn build_hooks(args: &FetchArgs) -> PipelineHooks {
    let download_bar = ProgressBar::new(0);
    download_bar.set_style(byte_style());
    download_bar.set_message(
        args.destination
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    );

    let extract_bar = ProgressBar::hidden();
    extract_bar.set_style(entry_style());

    let stage_download_bar = download_bar.clone();
    let stage_extract_bar = extract_bar.clone();
    let on_stage = Box::new(move |stage: Stage| match stage {
        Stage::Verifying => {
            stage_download_bar.finish_and_clear();
            println!("Verifying checksum...");
        }
        Stage::Extracting => {
            stage_download_bar.finish_and_clear();
            println!("Extracting...");
            stage_extract_bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        }
        Stage::Done => {
            stage_extract_bar.finish_and_clear();
        }
        _ => {}
    });

    let bytes_bar = download_bar.clone();
    let on_download: ProgressCallback = Box::new(move |bytes, total| {
        if total > 0 && bytes_bar.length() != Some(total) {
            bytes_bar.set_length(total);
        }
        bytes_bar.set_position(bytes);
    });

    let entries_bar = extract_bar.clone();
    let on_extract: ExtractProgressCallback = Arc::new(move |done, total| {
        entries_bar.set_length(total as u64);
        entries_bar.set_position(done as u64);
    });

    PipelineHooks {
        on_stage: Some(on_stage),
        on_download: Some(on_download),
        on_extract: Some(on_extract),
    }
}

fn byte_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg} [{bar:40}] {bytes}/{total_bytes} ({bytes_per_sec})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn entry_style() -> ProgressStyle {
    ProgressStyle::with_template("[{bar:40}] {pos}/{len} entries")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}
