//! Resumable HTTP download with bounded retry.
//!
//! The downloader streams a URL to a local file in chunks. If the
//! destination already holds a partial download, the next attempt issues a
//! `Range` request starting at the on-disk size and appends, so retries
//! resume instead of restarting. Transport-class failures are retried with a
//! fixed delay up to an explicit, finite budget; everything else propagates
//! immediately.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::RANGE;
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::config::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT,
};
use crate::error::{FetchError, FetchResult};
use crate::fsops;
use crate::progress::ProgressCallback;

/// A single download request.
///
/// The destination is append-only across retries: bytes already on disk are
/// never discarded, only extended (the one exception being a server that
/// answers a ranged request with 200, see [`HttpDownloader::download`]).
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// URL of the file to download.
    pub url: String,
    /// Path where the downloaded file is written.
    pub destination: PathBuf,
    /// Size of each read chunk in bytes.
    pub chunk_size: usize,
    /// Retries allowed after the initial attempt.
    pub max_retries: u32,
    /// Delay between retry attempts.
    pub retry_delay: Duration,
    /// Timeout for each HTTP request.
    pub timeout: Duration,
}

impl DownloadTask {
    /// Create a task with default tuning.
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the chunk size (minimum 1 byte).
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
}

/// Byte accounting for one download attempt.
///
/// Invariant: bytes on disk are monotonically non-decreasing across
/// attempts; a resumed attempt's `resume_offset` equals the pre-existing
/// file size.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferState {
    /// Bytes already on disk when the attempt started.
    pub resume_offset: u64,
    /// Bytes written during this attempt.
    pub session_bytes: u64,
    /// Expected final size; 0 when the server reported none.
    pub expected_total: u64,
}

impl TransferState {
    /// Total bytes on disk after this attempt.
    pub fn bytes_on_disk(&self) -> u64 {
        self.resume_offset + self.session_bytes
    }
}

/// Resumable HTTP downloader.
#[derive(Debug, Default)]
pub struct HttpDownloader;

impl HttpDownloader {
    /// Create a new downloader.
    pub fn new() -> Self {
        Self
    }

    /// Download `task.url` to `task.destination`, resuming a partial file
    /// and retrying transport failures up to the task's budget.
    ///
    /// Returns the final number of bytes on disk. The progress callback is
    /// invoked with (bytes on disk, expected total or 0) after every chunk
    /// and never influences control flow.
    ///
    /// # Errors
    ///
    /// `RetriesExhausted` once the budget is spent, `Cancelled` when the
    /// token fires between chunks, `WriteFailed`/`CreateDirFailed` for
    /// filesystem problems. Transport errors never escape individually.
    pub fn download(
        &self,
        task: &DownloadTask,
        progress: Option<ProgressCallback>,
        cancel: &CancelToken,
    ) -> FetchResult<u64> {
        let client = Client::builder()
            .timeout(task.timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                url: task.url.clone(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            debug!(url = %task.url, attempt = attempts, "starting download attempt");

            match self.attempt(&client, task, progress.as_ref(), cancel) {
                Ok(state) => {
                    info!(
                        url = %task.url,
                        bytes = state.bytes_on_disk(),
                        resumed_from = state.resume_offset,
                        "download complete"
                    );
                    return Ok(state.bytes_on_disk());
                }
                Err(e) if e.is_retryable() => {
                    let retries_used = attempts - 1;
                    if retries_used >= task.max_retries {
                        warn!(
                            url = %task.url,
                            attempts,
                            "retry budget exhausted, download terminated"
                        );
                        return Err(FetchError::RetriesExhausted {
                            url: task.url.clone(),
                            attempts,
                            reason: e.to_string(),
                        });
                    }
                    warn!(
                        url = %task.url,
                        error = %e,
                        attempt = attempts,
                        retry_in_secs = task.retry_delay.as_secs(),
                        "download attempt failed, retrying"
                    );
                    thread::sleep(task.retry_delay);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run one attempt: resume from the current on-disk size and stream
    /// until the body ends.
    fn attempt(
        &self,
        client: &Client,
        task: &DownloadTask,
        progress: Option<&ProgressCallback>,
        cancel: &CancelToken,
    ) -> FetchResult<TransferState> {
        // Recomputed every attempt: a partial write before the previous
        // error moves the resume point forward.
        let resume_offset = fs::metadata(&task.destination).map(|m| m.len()).unwrap_or(0);

        let mut request = client.get(&task.url);
        if resume_offset > 0 {
            request = request.header(RANGE, format!("bytes={}-", resume_offset));
        }

        let mut response = request
            .send()
            .map_err(|e| classify_request_error(e, &task.url, task.timeout))?;

        let status = response.status();
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            // The requested range starts at or past the end: the file is
            // already complete. Success, not an error.
            info!(
                url = %task.url,
                bytes = resume_offset,
                "requested range not satisfiable, file already complete"
            );
            if let Some(cb) = progress {
                cb(resume_offset, resume_offset);
            }
            return Ok(TransferState {
                resume_offset,
                session_bytes: 0,
                expected_total: resume_offset,
            });
        }
        if !status.is_success() {
            return Err(FetchError::Transport {
                url: task.url.clone(),
                reason: format!("GET request failed with status {}", status),
            });
        }

        let content_length = response.content_length().unwrap_or(0);
        if content_length == 0 {
            debug!(url = %task.url, "no content-length, progress degrades to count-only");
        }

        let (file, start_byte, expected_total) = if status == StatusCode::PARTIAL_CONTENT
            && resume_offset > 0
        {
            let file = open_for_append(&task.destination)?;
            let expected_total = if content_length > 0 {
                resume_offset + content_length
            } else {
                0
            };
            (file, resume_offset, expected_total)
        } else {
            if resume_offset > 0 {
                // Server ignored the range request. Rewrite from zero
                // instead of appending a second copy of the body.
                warn!(url = %task.url, "server ignored range request, restarting from zero");
            }
            fsops::ensure_directory(&task.destination, false).map_err(|e| {
                FetchError::CreateDirFailed {
                    path: task.destination.clone(),
                    source: e,
                }
            })?;
            let file = File::create(&task.destination).map_err(|e| FetchError::WriteFailed {
                path: task.destination.clone(),
                source: e,
            })?;
            (file, 0, content_length)
        };

        let session_bytes = self.stream_body(
            &mut response,
            file,
            task,
            start_byte,
            expected_total,
            progress,
            cancel,
        )?;

        let state = TransferState {
            resume_offset: start_byte,
            session_bytes,
            expected_total,
        };

        if expected_total > 0 && state.bytes_on_disk() < expected_total {
            // The stream ended early without an error; classify as a
            // retryable transport failure so the next attempt resumes.
            warn!(
                url = %task.url,
                received = state.bytes_on_disk(),
                expected = expected_total,
                "transfer ended before the expected total"
            );
            return Err(FetchError::Transport {
                url: task.url.clone(),
                reason: format!(
                    "connection closed after {} of {} bytes",
                    state.bytes_on_disk(),
                    expected_total
                ),
            });
        }

        Ok(state)
    }

    /// Stream the response body to disk in `chunk_size` reads.
    #[allow(clippy::too_many_arguments)]
    fn stream_body(
        &self,
        response: &mut reqwest::blocking::Response,
        file: File,
        task: &DownloadTask,
        start_byte: u64,
        expected_total: u64,
        progress: Option<&ProgressCallback>,
        cancel: &CancelToken,
    ) -> FetchResult<u64> {
        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; task.chunk_size];
        let mut session_bytes = 0u64;

        loop {
            if cancel.is_cancelled() {
                // Keep everything written so far; the next run resumes.
                writer.flush().ok();
                info!(url = %task.url, "download cancelled, partial file kept for resume");
                return Err(FetchError::Cancelled);
            }

            let bytes_read = response.read(&mut buffer).map_err(|e| {
                classify_read_error(e, &task.url, task.timeout)
            })?;

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| FetchError::WriteFailed {
                    path: task.destination.clone(),
                    source: e,
                })?;

            session_bytes += bytes_read as u64;

            if let Some(cb) = progress {
                cb(start_byte + session_bytes, expected_total);
            }
        }

        writer.flush().map_err(|e| FetchError::WriteFailed {
            path: task.destination.clone(),
            source: e,
        })?;

        Ok(session_bytes)
    }
}

/// Map a reqwest send error to the retry taxonomy.
fn classify_request_error(e: reqwest::Error, url: &str, timeout: Duration) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout_secs: timeout.as_secs(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

/// Map a mid-body read error to the retry taxonomy.
fn classify_read_error(e: std::io::Error, url: &str, timeout: Duration) -> FetchError {
    if e.kind() == std::io::ErrorKind::TimedOut {
        FetchError::Timeout {
            url: url.to_string(),
            timeout_secs: timeout.as_secs(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            reason: format!("read error: {}", e),
        }
    }
}

/// Open the destination for appending at its current end.
fn open_for_append(path: &Path) -> FetchResult<File> {
    OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| FetchError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}
