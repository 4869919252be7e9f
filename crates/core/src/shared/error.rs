use std::path::PathBuf;

use thiserror::Error;

use crate::composition::domain::trim_policy::TrimError;

/// Errors surfaced by export jobs to their caller.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("source unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },
    #[error("sink unavailable: {path}: {reason}")]
    SinkUnavailable { path: PathBuf, reason: String },
    #[error("composition failed: {0}")]
    CompositionFailure(String),
    #[error("file operation failed on {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("overlay rendering failed: {0}")]
    OverlayFailure(String),
    #[error("failed to decode frame: {0}")]
    DecodeFailure(String),
    #[error("encoding failed: {0}")]
    EncodingFailure(String),
    #[error(transparent)]
    Trim(#[from] TrimError),
    #[error("output {0} is already being written by another job")]
    OutputBusy(PathBuf),
    #[error("job already executed")]
    AlreadyExecuted,
}

impl ExportError {
    pub fn source_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ExportError::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn sink_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ExportError::SinkUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::IoFailure {
            path: path.into(),
            source,
        }
    }
}
