//! Verify command - standalone checksum verification.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use windlass::{checksum, pointer, FetchError};

use crate::error::CliError;

/// Arguments for the verify command.
#[derive(Args)]
pub struct VerifyArgs {
    /// Path to the downloaded file.
    pub file: PathBuf,

    /// URL of the pointer file (a `resolve` content URL is accepted and
    /// rewritten to its `raw` pointer form).
    pub pointer_url: String,

    /// Timeout for the pointer fetch in seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,
}

/// Run the verify command.
pub fn run(args: VerifyArgs) -> Result<(), CliError> {
    let pointer_url = pointer::pointer_url_for(&args.pointer_url);

    let verification = checksum::verify(
        &args.file,
        &pointer_url,
        Duration::from_secs(args.timeout),
    )?;

    println!("{}  {}", verification.computed, args.file.display());

    if verification.matches() {
        println!("OK: checksum matches pointer file");
        Ok(())
    } else {
        match &verification.expected {
            Some(expected) => println!("MISMATCH: pointer file declares {}", expected),
            None => println!("MISMATCH: pointer file declares no sha256"),
        }
        Err(CliError::Fetch(FetchError::IntegrityMismatch {
            path: args.file,
            expected: verification.expected,
            actual: verification.computed,
        }))
    }
}
