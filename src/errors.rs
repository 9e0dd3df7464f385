use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for file-level IO, configuration, and empty-input failures.
///
/// Record-level problems are reported as [`crate::validation::ValidationError`]
/// and never surface here.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("could not read '{}': {source}", .path.display())]
    UnreadableFile { path: PathBuf, source: io::Error },
    #[error("could not write '{}': {source}", .path.display())]
    UnwritableFile { path: PathBuf, source: io::Error },
    #[error("file '{}' changed since it was scanned: {details}", .path.display())]
    StaleFile { path: PathBuf, details: String },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("nothing to do: {0}")]
    NothingToDo(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl CorpusError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::UnreadableFile {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unwritable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::UnwritableFile {
            path: path.into(),
            source,
        }
    }
}
