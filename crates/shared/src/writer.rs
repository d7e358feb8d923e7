use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum WriteError {
    /// The digest for this date is already on disk and force was not set.
    #[error("digest already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Canonical location of a date's digest: `<output_dir>/YYYY-MM-DD.md`.
pub fn digest_path(output_dir: &Path, date: NaiveDate) -> PathBuf {
    output_dir.join(format!("{}.md", date.format("%Y-%m-%d")))
}

/// Persist the rendered digest for `date`.
///
/// The content is written to a temporary file in the same directory and
/// renamed into place, so an interrupted run never leaves a truncated
/// document at the canonical path.
pub fn write_digest(
    content: &str,
    output_dir: &Path,
    date: NaiveDate,
    force: bool,
) -> Result<PathBuf, WriteError> {
    fs::create_dir_all(output_dir).map_err(|e| WriteError::Io {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let path = digest_path(output_dir, date);
    if path.exists() && !force {
        return Err(WriteError::AlreadyExists(path));
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, content).map_err(|e| WriteError::Io {
        path: tmp_path.clone(),
        source: e,
    })?;

    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(&path).map_err(|e| WriteError::Io {
            path: path.clone(),
            source: e,
        })?;
    }

    fs::rename(&tmp_path, &path).map_err(|e| WriteError::Io {
        path: path.clone(),
        source: e,
    })?;

    debug!(path = %path.display(), bytes = content.len(), "digest committed");

    Ok(path)
}
