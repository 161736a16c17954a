//! Configuration for the fetch pipeline.

use std::path::PathBuf;
use std::time::Duration;

/// Default download chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default retry budget: retries attempted after the initial attempt.
///
/// The budget is a finite, explicit `u32`; a downloader configured with the
/// default makes at most four attempts in total.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay between retry attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default maximum nesting depth for recursive extraction. Depth 0 is the
/// outermost archive, so the default permits one level of nested archives.
pub const DEFAULT_MAX_DEPTH: u32 = 1;

/// Default number of concurrent nested-archive extractions.
pub const DEFAULT_PARALLEL_EXTRACTIONS: usize = 4;

/// Configuration for the fetch pipeline.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Size of each download chunk in bytes.
    pub chunk_size: usize,

    /// Retries attempted after the initial attempt before giving up.
    pub max_retries: u32,

    /// Delay between retry attempts.
    pub retry_delay: Duration,

    /// Timeout applied to each network request (download GET, pointer GET).
    pub timeout: Duration,

    /// Whether to verify the downloaded file against its pointer descriptor.
    pub verify: bool,

    /// Whether to extract the downloaded file after verification.
    pub extract: bool,

    /// Directory to extract into. Defaults to the destination's parent.
    pub extract_to: Option<PathBuf>,

    /// Maximum nesting depth for recursive extraction.
    pub max_depth: u32,

    /// Maximum concurrent nested-archive extractions.
    pub parallel_extractions: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: DEFAULT_TIMEOUT,
            verify: true,
            extract: true,
            extract_to: None,
            max_depth: DEFAULT_MAX_DEPTH,
            parallel_extractions: DEFAULT_PARALLEL_EXTRACTIONS,
        }
    }
}

impl FetchConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the download chunk size (minimum 1 byte).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay between retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable checksum verification.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Enable or disable extraction.
    pub fn with_extract(mut self, extract: bool) -> Self {
        self.extract = extract;
        self
    }

    /// Override the extraction target directory.
    pub fn with_extract_to(mut self, path: PathBuf) -> Self {
        self.extract_to = Some(path);
        self
    }

    /// Set the maximum nesting depth for recursive extraction.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the number of concurrent nested-archive extractions (minimum 1).
    pub fn with_parallel_extractions(mut self, parallel: usize) -> Self {
        self.parallel_extractions = parallel.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(60));
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.verify);
        assert!(config.extract);
        assert!(config.extract_to.is_none());
        assert_eq!(config.max_depth, 1);
        assert_eq!(config.parallel_extractions, 4);
    }

    #[test]
    fn test_builder_pattern() {
        let config = FetchConfig::new()
            .with_chunk_size(64 * 1024)
            .with_max_retries(5)
            .with_retry_delay(Duration::from_millis(10))
            .with_timeout(Duration::from_secs(30))
            .with_verify(false)
            .with_max_depth(3)
            .with_parallel_extractions(8);

        assert_eq!(config.chunk_size, 64 * 1024);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay, Duration::from_millis(10));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.verify);
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.parallel_extractions, 8);
    }

    #[test]
    fn test_builder_clamps_minimums() {
        let config = FetchConfig::new()
            .with_chunk_size(0)
            .with_parallel_extractions(0);
        assert_eq!(config.chunk_size, 1);
        assert_eq!(config.parallel_extractions, 1);
    }
}
