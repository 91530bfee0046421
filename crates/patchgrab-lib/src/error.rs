use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatchGrabError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to save configuration to {path}: {reason}")]
    ConfigSave { path: PathBuf, reason: String },

    #[error("Failed to fetch patch list from {endpoint}: {reason}")]
    CatalogFetch { endpoint: String, reason: String },

    #[error("Patch list server reported an error: {message}")]
    Upstream { message: String },

    #[error("Invalid patch list entry {uri}: {reason}")]
    CatalogEntry { uri: String, reason: String },

    #[error("Failed to save catalog snapshot to {path}: {reason}")]
    SnapshotSave { path: PathBuf, reason: String },

    #[error("Invalid command line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
