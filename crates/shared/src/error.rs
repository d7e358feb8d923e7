use std::path::PathBuf;

use thiserror::Error;

use crate::source::SourceError;
use crate::writer::WriteError;

/// Everything that can stop a digest run.
///
/// Summarization failures never appear here: they are absorbed at the
/// summarizer boundary and only degrade the output.
#[derive(Debug, Error)]
pub enum DigestError {
    /// The story source could not be reached or returned unparseable data.
    #[error("story source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// The story source succeeded but yielded zero usable stories.
    #[error("story source returned no usable stories")]
    EmptySource,

    /// The digest for this date already exists and force was not set.
    /// The orchestrator treats this as a successful no-op.
    #[error("digest already exists at {0}")]
    AlreadyExists(PathBuf),

    /// Filesystem failure while writing the digest.
    #[error("failed to write digest: {0}")]
    Write(WriteError),

    /// Malformed input supplied at the boundary, before any pipeline work.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<WriteError> for DigestError {
    fn from(err: WriteError) -> Self {
        // A lost race on the existence check is still an idempotent no-op,
        // not a write failure.
        match err {
            WriteError::AlreadyExists(path) => DigestError::AlreadyExists(path),
            other => DigestError::Write(other),
        }
    }
}
