use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str =
    "https://launcher.escapefromtarkov.com/launcher/GetPatchList?launcherVersion=0&branch=live";
pub const DEFAULT_SNAPSHOT_PATH: &str = "list.json";
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

/// Where files of one item type go. `false` disables that type entirely.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DirectorySetting {
    Disabled(bool),
    Path(PathBuf),
}

impl DirectorySetting {
    pub fn root(&self) -> Option<&Path> {
        match self {
            DirectorySetting::Path(path) => Some(path),
            DirectorySetting::Disabled(_) => None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distrib: Option<DirectorySetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<DirectorySetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pacing_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_requeues: Option<usize>,
}

impl Config {
    pub fn is_silent(&self) -> bool {
        self.silent.unwrap_or(false)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH))
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms.unwrap_or(0))
    }

    /// A value of zero disables the idle timeout.
    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.idle_timeout_secs.unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
