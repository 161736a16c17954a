//! Recursive, depth-bounded ZIP extraction.
//!
//! Extracts an archive to a target directory, preserving relative paths.
//! Entries that are themselves valid ZIP archives are extracted recursively
//! into a sibling directory named after the entry minus its extension, up
//! to a configured nesting depth. Nested archives at the same level are
//! extracted concurrently by a bounded pool of workers, each owning a
//! disjoint subtree of the target, and are deleted once fully extracted;
//! only the top-level archive is left on disk.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::cancel::CancelToken;
use crate::config::{DEFAULT_MAX_DEPTH, DEFAULT_PARALLEL_EXTRACTIONS};
use crate::error::{FetchError, FetchResult};
use crate::fsops;
use crate::progress::{ExtractCounters, ExtractProgressCallback};

/// File extension that marks a nested archive candidate. A validity probe
/// still decides whether the entry is actually extracted recursively.
const ARCHIVE_EXTENSION: &str = "zip";

/// Summary of a completed extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Entries extracted across all nesting levels.
    pub entries_extracted: usize,
    /// Nested archives that were recursively extracted (and deleted).
    pub nested_archives: usize,
}

/// Recursive ZIP extractor.
#[derive(Debug)]
pub struct ZipExtractor {
    /// Maximum nesting depth; depth 0 is the outermost extraction.
    max_depth: u32,
    /// Maximum concurrent nested-archive extractions per level.
    parallel_jobs: usize,
}

impl Default for ZipExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipExtractor {
    /// Create an extractor with default settings.
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            parallel_jobs: DEFAULT_PARALLEL_EXTRACTIONS,
        }
    }

    /// Create an extractor with custom depth bound and parallelism.
    pub fn with_settings(max_depth: u32, parallel_jobs: usize) -> Self {
        Self {
            max_depth,
            parallel_jobs: parallel_jobs.max(1),
        }
    }

    /// Get the configured depth bound.
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Extract `archive` into `extract_to`, recursing into nested archives.
    ///
    /// The progress callback observes (entries processed, entries
    /// discovered) and never affects extraction order or outcome.
    ///
    /// # Errors
    ///
    /// `ReadFailed` (not-found) if the archive does not exist,
    /// `ArchiveCorrupt` if it is not a valid ZIP, `RecursionLimitExceeded`
    /// if nesting would pass the depth bound, `Cancelled` when interrupted
    /// between entries.
    pub fn extract(
        &self,
        archive: &Path,
        extract_to: &Path,
        progress: Option<ExtractProgressCallback>,
        cancel: &CancelToken,
    ) -> FetchResult<ExtractSummary> {
        let counters = Arc::new(ExtractCounters::new());
        self.extract_at_depth(archive, extract_to, 0, &counters, progress.as_ref(), cancel)?;

        Ok(ExtractSummary {
            entries_extracted: counters.done(),
            nested_archives: counters.nested(),
        })
    }

    /// Extract one archive at the given nesting depth.
    fn extract_at_depth(
        &self,
        archive: &Path,
        extract_to: &Path,
        depth: u32,
        counters: &Arc<ExtractCounters>,
        progress: Option<&ExtractProgressCallback>,
        cancel: &CancelToken,
    ) -> FetchResult<()> {
        info!(
            archive = %archive.display(),
            target = %extract_to.display(),
            depth,
            max_depth = self.max_depth,
            "extracting archive"
        );

        if !archive.exists() {
            return Err(FetchError::ReadFailed {
                path: archive.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "archive not found"),
            });
        }

        fsops::ensure_directory(extract_to, true).map_err(|e| FetchError::CreateDirFailed {
            path: extract_to.to_path_buf(),
            source: e,
        })?;

        let nested = self.extract_entries(archive, extract_to, counters, progress, cancel)?;
        if nested.is_empty() {
            return Ok(());
        }

        let next_depth = depth + 1;
        if next_depth > self.max_depth {
            return Err(FetchError::RecursionLimitExceeded {
                path: nested[0].clone(),
                max_depth: self.max_depth,
            });
        }

        self.extract_nested(&nested, next_depth, counters, progress, cancel)
    }

    /// Extract every entry of one archive; returns the nested archives
    /// discovered among the extracted files.
    fn extract_entries(
        &self,
        archive: &Path,
        extract_to: &Path,
        counters: &Arc<ExtractCounters>,
        progress: Option<&ExtractProgressCallback>,
        cancel: &CancelToken,
    ) -> FetchResult<Vec<PathBuf>> {
        let file = File::open(archive).map_err(|e| FetchError::ReadFailed {
            path: archive.to_path_buf(),
            source: e,
        })?;
        let mut zip = ZipArchive::new(file).map_err(|e| FetchError::ArchiveCorrupt {
            path: archive.to_path_buf(),
            reason: e.to_string(),
        })?;

        let total = zip.len();
        counters.add_discovered(total);
        debug!(archive = %archive.display(), entries = total, "archive opened");

        let mut candidates = Vec::new();

        for i in 0..total {
            if cancel.is_cancelled() {
                info!(archive = %archive.display(), "extraction cancelled");
                return Err(FetchError::Cancelled);
            }

            let mut entry = zip.by_index(i).map_err(|e| FetchError::ArchiveCorrupt {
                path: archive.to_path_buf(),
                reason: e.to_string(),
            })?;

            // Reject entries whose path would escape the target directory.
            let relative = entry.enclosed_name().ok_or_else(|| FetchError::ArchiveCorrupt {
                path: archive.to_path_buf(),
                reason: format!("entry {} escapes the target directory", entry.name()),
            })?;
            let out_path = extract_to.join(relative);

            if entry.is_dir() {
                fsops::ensure_directory(&out_path, true).map_err(|e| {
                    FetchError::CreateDirFailed {
                        path: out_path.clone(),
                        source: e,
                    }
                })?;
            } else {
                fsops::ensure_directory(&out_path, false).map_err(|e| {
                    FetchError::CreateDirFailed {
                        path: out_path.clone(),
                        source: e,
                    }
                })?;
                let mut out = File::create(&out_path).map_err(|e| FetchError::WriteFailed {
                    path: out_path.clone(),
                    source: e,
                })?;
                io::copy(&mut entry, &mut out).map_err(|e| FetchError::WriteFailed {
                    path: out_path.clone(),
                    source: e,
                })?;

                if has_archive_extension(&out_path) {
                    candidates.push(out_path);
                }
            }

            counters.mark_done();
            if let Some(cb) = progress {
                cb(counters.done(), counters.total());
            }
        }

        // Extension alone is not enough; only entries that open as a ZIP
        // are scheduled for recursive extraction.
        Ok(candidates
            .into_iter()
            .filter(|path| is_zip_archive(path))
            .collect())
    }

    /// Extract nested archives concurrently in bounded batches, deleting
    /// each once fully extracted. All failures are collected and the first
    /// is surfaced after every sibling has finished.
    fn extract_nested(
        &self,
        nested: &[PathBuf],
        depth: u32,
        counters: &Arc<ExtractCounters>,
        progress: Option<&ExtractProgressCallback>,
        cancel: &CancelToken,
    ) -> FetchResult<()> {
        info!(count = nested.len(), depth, "extracting nested archives");
        for _ in nested {
            counters.mark_nested();
        }

        let errors: Mutex<Vec<FetchError>> = Mutex::new(Vec::new());

        for batch in nested.chunks(self.parallel_jobs) {
            thread::scope(|scope| {
                for nested_path in batch {
                    let errors = &errors;
                    scope.spawn(move || {
                        let target = nested_path.with_extension("");
                        let result = self.extract_at_depth(
                            nested_path,
                            &target,
                            depth,
                            counters,
                            progress,
                            cancel,
                        );
                        match result {
                            Ok(()) => {
                                // Nested archives are consumed by extraction.
                                if let Err(e) = fs::remove_file(nested_path) {
                                    errors.lock().unwrap().push(FetchError::WriteFailed {
                                        path: nested_path.clone(),
                                        source: e,
                                    });
                                }
                            }
                            Err(e) => errors.lock().unwrap().push(e),
                        }
                    });
                }
            });
        }

        let mut errors = errors.into_inner().unwrap();
        if !errors.is_empty() {
            warn!(
                failed = errors.len(),
                total = nested.len(),
                "nested extraction finished with failures"
            );
            return Err(errors.remove(0));
        }

        Ok(())
    }
}

/// Whether the file name carries the nested-archive extension.
fn has_archive_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
        .unwrap_or(false)
}

/// Probe whether a file on disk opens as a valid ZIP archive.
fn is_zip_archive(path: &Path) -> bool {
    File::open(path)
        .ok()
        .and_then(|f| ZipArchive::new(f).ok())
        .is_some()
}
