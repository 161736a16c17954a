//! Pipeline orchestration: download, verify, extract.
//!
//! The pipeline sequences the three stages with a hard gate after
//! verification: extraction never runs on unverified content. Any stage
//! failure halts the pipeline; in particular a checksum mismatch is fatal
//! and is never answered with an automatic re-download.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::checksum::{self, Verification};
use crate::config::FetchConfig;
use crate::download::{DownloadTask, HttpDownloader};
use crate::error::FetchError;
use crate::extract::{ExtractSummary, ZipExtractor};
use crate::pointer;
use crate::progress::{ExtractProgressCallback, ProgressCallback};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing started yet.
    Idle,
    /// Streaming the artifact to disk.
    Downloading,
    /// Checking the digest against the pointer descriptor.
    Verifying,
    /// Expanding the archive.
    Extracting,
    /// All requested stages finished.
    Done,
    /// A stage failed; terminal.
    Failed,
}

impl Stage {
    /// Human-readable stage name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Downloading => "Downloading",
            Self::Verifying => "Verifying",
            Self::Extracting => "Extracting",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Stage-entry callback: invoked when the pipeline enters each stage.
pub type StageCallback = Box<dyn Fn(Stage) + Send + Sync>;

/// Optional observers threaded through a pipeline run. All of them are
/// side-effect hooks; none influence control flow.
#[derive(Default)]
pub struct PipelineHooks {
    /// Invoked when a stage begins.
    pub on_stage: Option<StageCallback>,
    /// Byte-level download progress.
    pub on_download: Option<ProgressCallback>,
    /// Entry-level extraction progress.
    pub on_extract: Option<ExtractProgressCallback>,
}

/// Outcome of a successful pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    /// Final size of the downloaded file in bytes.
    pub bytes_downloaded: u64,
    /// Verification outcome, when verification ran.
    pub verification: Option<Verification>,
    /// Extraction summary, when extraction ran.
    pub extraction: Option<ExtractSummary>,
}

/// A pipeline failure, carrying the stage it happened in.
#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct PipelineError {
    /// Stage the pipeline failed in.
    pub stage: Stage,
    /// Underlying cause.
    #[source]
    pub error: FetchError,
}

/// Fetch pipeline: download, verify, extract.
pub struct Pipeline {
    config: FetchConfig,
    downloader: HttpDownloader,
    extractor: ZipExtractor,
}

impl Pipeline {
    /// Create a pipeline from a configuration.
    pub fn new(config: FetchConfig) -> Self {
        let extractor =
            ZipExtractor::with_settings(config.max_depth, config.parallel_extractions);
        Self {
            config,
            downloader: HttpDownloader::new(),
            extractor,
        }
    }

    /// Get the pipeline configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Run the pipeline for one artifact.
    ///
    /// Stages run in order: download, then (when enabled) verification
    /// against the pointer descriptor derived from `url`, then (when
    /// enabled) extraction. The first failure halts the run and is
    /// reported with its stage.
    pub fn run(
        &self,
        url: &str,
        destination: &Path,
        hooks: PipelineHooks,
        cancel: &CancelToken,
    ) -> Result<PipelineReport, PipelineError> {
        let enter = |stage: Stage| {
            if let Some(ref cb) = hooks.on_stage {
                cb(stage);
            }
        };
        // The only exits from the state machine besides Done.
        let fail = |stage: Stage, error: FetchError| {
            if let Some(ref cb) = hooks.on_stage {
                cb(Stage::Failed);
            }
            PipelineError { stage, error }
        };

        // Stage 1: download.
        enter(Stage::Downloading);
        let task = DownloadTask::new(url, destination)
            .with_chunk_size(self.config.chunk_size)
            .with_max_retries(self.config.max_retries)
            .with_retry_delay(self.config.retry_delay)
            .with_timeout(self.config.timeout);

        let bytes_downloaded = self
            .downloader
            .download(&task, hooks.on_download, cancel)
            .map_err(|error| fail(Stage::Downloading, error))?;

        // Stage 2: verify. The gate: extraction only runs past this point.
        let verification = if self.config.verify {
            enter(Stage::Verifying);
            let pointer_url = pointer::pointer_url_for(url);
            let verification = checksum::verify(destination, &pointer_url, self.config.timeout)
                .map_err(|error| fail(Stage::Verifying, error))?;

            if !verification.matches() {
                warn!(
                    path = %destination.display(),
                    computed = %verification.computed,
                    expected = verification.expected.as_deref().unwrap_or("<absent>"),
                    "integrity check failed"
                );
                return Err(fail(
                    Stage::Verifying,
                    FetchError::IntegrityMismatch {
                        path: destination.to_path_buf(),
                        expected: verification.expected,
                        actual: verification.computed,
                    },
                ));
            }
            info!(path = %destination.display(), "integrity check passed");
            Some(verification)
        } else {
            None
        };

        // Stage 3: extract.
        let extraction = if self.config.extract {
            enter(Stage::Extracting);
            let extract_to = self.extract_target(destination);
            let summary = self
                .extractor
                .extract(destination, &extract_to, hooks.on_extract, cancel)
                .map_err(|error| fail(Stage::Extracting, error))?;
            Some(summary)
        } else {
            None
        };

        enter(Stage::Done);
        Ok(PipelineReport {
            bytes_downloaded,
            verification,
            extraction,
        })
    }

    /// Directory the archive is expanded into: the configured override, or
    /// the destination's parent.
    fn extract_target(&self, destination: &Path) -> PathBuf {
        match &self.config.extract_to {
            Some(dir) => dir.clone(),
            None => destination
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Idle.name(), "Idle");
        assert_eq!(Stage::Downloading.name(), "Downloading");
        assert_eq!(Stage::Verifying.name(), "Verifying");
        assert_eq!(Stage::Extracting.name(), "Extracting");
        assert_eq!(Stage::Done.name(), "Done");
        assert_eq!(Stage::Failed.name(), "Failed");
    }

    #[test]
    fn test_pipeline_error_display_carries_stage() {
        let err = PipelineError {
            stage: Stage::Verifying,
            error: FetchError::IntegrityMismatch {
                path: PathBuf::from("data.zip"),
                expected: Some("aa".repeat(32)),
                actual: "bb".repeat(32),
            },
        };
        let rendered = err.to_string();
        assert!(rendered.starts_with("Verifying failed"));
        assert!(rendered.contains("checksum mismatch"));
    }

    #[test]
    fn test_extract_target_defaults_to_parent() {
        let pipeline = Pipeline::new(FetchConfig::default());
        assert_eq!(
            pipeline.extract_target(Path::new("/data/artifact.zip")),
            PathBuf::from("/data")
        );
        assert_eq!(
            pipeline.extract_target(Path::new("artifact.zip")),
            PathBuf::from(".")
        );
    }

    #[test]
    fn test_extract_target_override() {
        let config = FetchConfig::default().with_extract_to(PathBuf::from("/elsewhere"));
        let pipeline = Pipeline::new(config);
        assert_eq!(
            pipeline.extract_target(Path::new("/data/artifact.zip")),
            PathBuf::from("/elsewhere")
        );
    }
}
