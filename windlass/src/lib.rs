//! Windlass - resumable artifact fetching with integrity checking
//!
//! This library downloads a large remote artifact over HTTP with byte-range
//! resumption and bounded retry, verifies it against the SHA-256 declared by
//! its hosted pointer descriptor, and recursively extracts it when it is a
//! ZIP archive, with a hard gate between verification and extraction.

pub mod cancel;
pub mod checksum;
pub mod config;
pub mod download;
pub mod error;
pub mod extract;
pub mod fsops;
pub mod logging;
pub mod pipeline;
pub mod pointer;
pub mod progress;

pub use cancel::CancelToken;
pub use checksum::Verification;
pub use config::FetchConfig;
pub use download::{DownloadTask, HttpDownloader, TransferState};
pub use error::{FetchError, FetchResult};
pub use extract::{ExtractSummary, ZipExtractor};
pub use pipeline::{Pipeline, PipelineError, PipelineHooks, PipelineReport, Stage};
pub use progress::{ExtractProgressCallback, ProgressCallback};

/// Library version, from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
