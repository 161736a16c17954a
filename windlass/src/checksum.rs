//! SHA-256 verification against a remote pointer descriptor.
//!
//! The verifier computes a streaming digest of the local file, fetches the
//! pointer descriptor hosted alongside the artifact, and compares the two.
//! It performs no retries of its own: a failed pointer fetch propagates to
//! the caller, which owns the retry policy.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{FetchError, FetchResult};
use crate::pointer;

/// Buffer size for reading files during digest calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of a verification: the computed digest and whatever the pointer
/// declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Lowercase hex SHA-256 of the local file.
    pub computed: String,
    /// Digest declared by the pointer descriptor, if it declared one.
    pub expected: Option<String>,
}

impl Verification {
    /// Whether the computed digest matches the declared one.
    ///
    /// Both sides are normalized lowercase hex; an absent declared digest
    /// never matches.
    pub fn matches(&self) -> bool {
        self.expected.as_deref() == Some(self.computed.as_str())
    }
}

/// Calculate the SHA-256 digest of a file.
///
/// The file is read once, in full, in fixed-size chunks; memory use is
/// independent of file size.
///
/// # Errors
///
/// Returns `ReadFailed` if the file cannot be opened or read.
pub fn file_sha256(path: &Path) -> FetchResult<String> {
    let mut file = File::open(path).map_err(|e| FetchError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| FetchError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Fetch the raw bytes of a pointer descriptor.
///
/// Any failure — connect error, timeout, non-success status — is a
/// `PointerFetch` error: fatal for this run, never retried here.
pub fn fetch_pointer(pointer_url: &str, timeout: Duration) -> FetchResult<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FetchError::PointerFetch {
            url: pointer_url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client
        .get(pointer_url)
        .send()
        .map_err(|e| FetchError::PointerFetch {
            url: pointer_url.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::PointerFetch {
            url: pointer_url.to_string(),
            reason: format!("GET request failed with status {}", status),
        });
    }

    let bytes = response.bytes().map_err(|e| FetchError::PointerFetch {
        url: pointer_url.to_string(),
        reason: e.to_string(),
    })?;

    Ok(bytes.to_vec())
}

/// Verify a local file against the digest declared by a pointer descriptor.
///
/// # Errors
///
/// Returns `ReadFailed` if the file is unreadable and `PointerFetch` if the
/// pointer URL is unreachable. A digest mismatch is not an error here; the
/// caller inspects [`Verification::matches`].
pub fn verify(path: &Path, pointer_url: &str, timeout: Duration) -> FetchResult<Verification> {
    debug!(path = %path.display(), "calculating file digest");
    let computed = file_sha256(path)?;
    info!(path = %path.display(), digest = %computed, "file digest calculated");

    info!(url = %pointer_url, "fetching pointer file");
    let pointer_bytes = fetch_pointer(pointer_url, timeout)?;

    let expected = pointer::expected_sha256(&pointer_bytes);
    match &expected {
        Some(expected) => debug!(digest = %expected, "pointer file declares digest"),
        None => debug!("pointer file declares no digest"),
    }

    Ok(Verification { computed, expected })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    // SHA-256 of "hello world"
    const HELLO_DIGEST: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_file_sha256() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("test.txt");

        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"hello world").unwrap();

        assert_eq!(file_sha256(&file_path).unwrap(), HELLO_DIGEST);
    }

    #[test]
    fn test_file_sha256_empty_file() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("empty.txt");

        File::create(&file_path).unwrap();

        // SHA-256 of empty input
        assert_eq!(
            file_sha256(&file_path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_file_sha256_nonexistent() {
        let result = file_sha256(Path::new("/nonexistent/file.txt"));
        assert!(matches!(result, Err(FetchError::ReadFailed { .. })));
    }

    #[test]
    fn test_file_sha256_larger_than_buffer() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("large.bin");

        let mut file = File::create(&file_path).unwrap();
        file.write_all(&vec![0xABu8; 100_000]).unwrap();

        let first = file_sha256(&file_path).unwrap();
        let second = file_sha256(&file_path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_verification_matches() {
        let verification = Verification {
            computed: HELLO_DIGEST.to_string(),
            expected: Some(HELLO_DIGEST.to_string()),
        };
        assert!(verification.matches());
    }

    #[test]
    fn test_verification_mismatch() {
        let verification = Verification {
            computed: HELLO_DIGEST.to_string(),
            expected: Some("0".repeat(64)),
        };
        assert!(!verification.matches());
    }

    #[test]
    fn test_verification_absent_expected_never_matches() {
        let verification = Verification {
            computed: HELLO_DIGEST.to_string(),
            expected: None,
        };
        assert!(!verification.matches());
    }
}
