use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures scoped to one item. They never abort a run.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Metadata request to {url} failed: {reason}")]
    Metadata { url: String, reason: String },

    #[error("Response from {url} has no usable content-length")]
    MissingContentLength { url: String },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Local file {path} is not accessible: {source}")]
    LocalFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Body request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("Transfer interrupted: {reason}")]
    Stream { reason: String },

    #[error("Connection timed out after {0:?} without data")]
    StreamTimeout(Duration),

    #[error("Gave up after {attempts} retries: {last}")]
    RetriesExhausted {
        attempts: usize,
        last: Box<TransferError>,
    },
}

impl TransferError {
    /// Whether the failure happened while the body was streaming.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            TransferError::Stream { .. } | TransferError::StreamTimeout(_)
        )
    }
}
