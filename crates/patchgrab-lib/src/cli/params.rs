use crate::config::{Config, DirectorySetting};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DownloadParams {
    /// Settings as stored on disk, before command line overrides
    pub app_config: Config,
    pub config_path: PathBuf,
    pub distrib_override: Option<DirectorySetting>,
    pub patch_override: Option<DirectorySetting>,
    pub silent: bool,
    pub versions: Vec<String>,
    pub endpoint: String,
    pub snapshot_path: PathBuf,
    pub pacing: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_requeues: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ListParams {
    pub endpoint: String,
    pub snapshot_path: PathBuf,
}
