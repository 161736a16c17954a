//! Error types for the fetch pipeline.

use std::io;
use std::path::PathBuf;

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can occur while downloading, verifying or extracting an
/// artifact.
///
/// Transport-class errors (`Transport`, `Timeout`) are absorbed by the
/// downloader's retry loop and only escape as `RetriesExhausted`. Every
/// other variant propagates immediately to the pipeline.
#[derive(Debug)]
pub enum FetchError {
    /// Failed to read a file or directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Retryable network-level failure (connection error, 5xx, short body).
    Transport { url: String, reason: String },

    /// A single request exceeded its timeout.
    Timeout { url: String, timeout_secs: u64 },

    /// The downloader used up its whole retry budget.
    RetriesExhausted {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// The pointer descriptor could not be fetched. Fatal for the run; the
    /// verifier never retries.
    PointerFetch { url: String, reason: String },

    /// Computed digest does not match the pointer's declared digest, or the
    /// pointer declared none.
    IntegrityMismatch {
        path: PathBuf,
        expected: Option<String>,
        actual: String,
    },

    /// The archive is not a valid ZIP or an entry is malformed.
    ArchiveCorrupt { path: PathBuf, reason: String },

    /// Nested extraction would pass the configured depth bound. Signals
    /// misconfiguration or maliciously deep nesting, never retried.
    RecursionLimitExceeded { path: PathBuf, max_depth: u32 },

    /// The operation was cancelled by an external interrupt. Partial state
    /// on disk stays consistent and resumable.
    Cancelled,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::Transport { url, reason } => {
                write!(f, "transport error for {}: {}", url, reason)
            }
            Self::Timeout { url, timeout_secs } => {
                write!(f, "request to {} timed out after {}s", url, timeout_secs)
            }
            Self::RetriesExhausted {
                url,
                attempts,
                reason,
            } => {
                write!(
                    f,
                    "download of {} failed after {} attempts: {}",
                    url, attempts, reason
                )
            }
            Self::PointerFetch { url, reason } => {
                write!(f, "failed to fetch pointer file from {}: {}", url, reason)
            }
            Self::IntegrityMismatch {
                path,
                expected,
                actual,
            } => match expected {
                Some(expected) => write!(
                    f,
                    "checksum mismatch for {}: expected {}, got {}",
                    path.display(),
                    expected,
                    actual
                ),
                None => write!(
                    f,
                    "checksum mismatch for {}: pointer file declares no sha256 (computed {})",
                    path.display(),
                    actual
                ),
            },
            Self::ArchiveCorrupt { path, reason } => {
                write!(f, "invalid archive {}: {}", path.display(), reason)
            }
            Self::RecursionLimitExceeded { path, max_depth } => {
                write!(
                    f,
                    "nested extraction of {} exceeds maximum recursion depth {}",
                    path.display(),
                    max_depth
                )
            }
            Self::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFailed { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source),
            Self::CreateDirFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl FetchError {
    /// Whether the downloader's retry loop may absorb this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_integrity_mismatch_display() {
        let err = FetchError::IntegrityMismatch {
            path: Path::new("data.zip").to_path_buf(),
            expected: Some("abc123".to_string()),
            actual: "def456".to_string(),
        };
        assert!(err.to_string().contains("checksum mismatch"));
        assert!(err.to_string().contains("abc123"));
        assert!(err.to_string().contains("def456"));
    }

    #[test]
    fn test_integrity_mismatch_without_expected() {
        let err = FetchError::IntegrityMismatch {
            path: Path::new("data.zip").to_path_buf(),
            expected: None,
            actual: "def456".to_string(),
        };
        assert!(err.to_string().contains("declares no sha256"));
    }

    #[test]
    fn test_recursion_limit_display() {
        let err = FetchError::RecursionLimitExceeded {
            path: Path::new("inner.zip").to_path_buf(),
            max_depth: 2,
        };
        assert!(err.to_string().contains("maximum recursion depth 2"));
    }

    #[test]
    fn test_retryable_classification() {
        let transport = FetchError::Transport {
            url: "http://example".to_string(),
            reason: "connection reset".to_string(),
        };
        let timeout = FetchError::Timeout {
            url: "http://example".to_string(),
            timeout_secs: 60,
        };
        let corrupt = FetchError::ArchiveCorrupt {
            path: PathBuf::from("a.zip"),
            reason: "bad header".to_string(),
        };
        assert!(transport.is_retryable());
        assert!(timeout.is_retryable());
        assert!(!corrupt.is_retryable());
        assert!(!FetchError::Cancelled.is_retryable());
    }
}
