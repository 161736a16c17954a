//! Filesystem helpers shared by the download and extraction stages.

use std::fs;
use std::io;
use std::path::Path;

/// Ensure that the directory for `path` exists.
///
/// With `is_directory` set, `path` itself is treated as the directory to
/// create; otherwise the parent of `path` is created. All missing
/// intermediate segments are created.
///
/// Returns `true` if anything was actually created, `false` if the
/// directory was already present. The flag is for observability only.
pub fn ensure_directory(path: &Path, is_directory: bool) -> io::Result<bool> {
    let dir = if is_directory {
        path
    } else {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            // A bare filename lives in the current directory; nothing to do.
            _ => return Ok(false),
        }
    };

    if dir.is_dir() {
        return Ok(false);
    }

    match fs::create_dir_all(dir) {
        Ok(()) => Ok(true),
        // Lost a race with a concurrent creator; the directory is there.
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}
