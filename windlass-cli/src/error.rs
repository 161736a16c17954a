//! CLI error type and exit-code mapping.

use thiserror::Error;
use windlass::{FetchError, PipelineError};

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// A pipeline stage failed.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// A standalone operation (verify, extract) failed.
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// Configuration or environment problem.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Exit code when retries were exhausted during download.
pub const EXIT_DOWNLOAD_FAILED: i32 = 2;
/// Exit code when the integrity check failed.
pub const EXIT_INTEGRITY_FAILED: i32 = 3;
/// Exit code when extraction failed.
pub const EXIT_EXTRACTION_FAILED: i32 = 4;

impl CliError {
    /// Map the failure to a process exit code, so automation can react
    /// differently to each of the three core failure classes.
    pub fn exit_code(&self) -> i32 {
        let error = match self {
            Self::Pipeline(e) => &e.error,
            Self::Fetch(e) => e,
            Self::Config(_) => return 1,
        };
        match error {
            FetchError::RetriesExhausted { .. } => EXIT_DOWNLOAD_FAILED,
            FetchError::IntegrityMismatch { .. } => EXIT_INTEGRITY_FAILED,
            FetchError::ArchiveCorrupt { .. } | FetchError::RecursionLimitExceeded { .. } => {
                EXIT_EXTRACTION_FAILED
            }
            _ => 1,
        }
    }
}
