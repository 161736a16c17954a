//! Windlass CLI - command-line interface
//!
//! Downloads a remote artifact with resumable retries, verifies it against
//! its hosted pointer descriptor, and recursively extracts it.

mod commands;
mod error;

use clap::{Parser, Subcommand};

use commands::{extract, fetch, verify};

#[derive(Parser)]
#[command(
    name = "windlass",
    version,
    about = "Resumable artifact downloads with integrity checking and recursive extraction"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download an artifact, verify it, and extract it.
    Fetch(fetch::FetchArgs),
    /// Verify a local file against its pointer descriptor.
    Verify(verify::VerifyArgs),
    /// Recursively extract a ZIP archive.
    Extract(extract::ExtractArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fetch(args) => fetch::run(args),
        Commands::Verify(args) => verify::run(args),
        Commands::Extract(args) => extract::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
