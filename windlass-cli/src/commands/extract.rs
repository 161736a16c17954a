//! Extract command - standalone recursive extraction.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use windlass::progress::ExtractProgressCallback;
use windlass::ZipExtractor;

use crate::commands::install_interrupt_handler;
use crate::error::CliError;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Path to the ZIP archive to extract.
    pub archive: PathBuf,

    /// Directory to extract into.
    pub extract_to: PathBuf,

    /// Maximum nesting depth for recursive extraction.
    #[arg(long, default_value_t = 1)]
    pub max_depth: u32,

    /// Maximum concurrent nested-archive extractions.
    #[arg(long, default_value_t = 4)]
    pub parallel: usize,

    /// Do not display an extraction progress bar.
    #[arg(long)]
    pub no_progress: bool,
}

/// Run the extract command.
pub fn run(args: ExtractArgs) -> Result<(), CliError> {
    let cancel = install_interrupt_handler()?;
    let extractor = ZipExtractor::with_settings(args.max_depth, args.parallel);

    let progress = if args.no_progress {
        None
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("[{bar:40}] {pos}/{len} entries")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        let callback: ExtractProgressCallback = Arc::new(move |done, total| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        });
        Some(callback)
    };

    let summary = extractor.extract(&args.archive, &args.extract_to, progress, &cancel)?;

    println!(
        "Extracted {} entries ({} nested archives) to {}",
        summary.entries_extracted,
        summary.nested_archives,
        args.extract_to.display()
    );

    Ok(())
}
