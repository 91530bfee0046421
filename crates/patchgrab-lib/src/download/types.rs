use super::error::TransferError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Full client distribution archive
    Distrib,
    /// Incremental update between two versions
    Patch,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Distrib => f.pad("distrib"),
            ItemKind::Patch => f.pad("patch"),
        }
    }
}

/// A single downloadable catalog entry. Requeued verbatim on retriable failures.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadItem {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub version: String,
    /// File name inside the local root
    pub file: String,
    /// Upstream directory the file lives in
    pub path: String,
    pub url: String,
}

/// Local destination directories per item kind. `None` disables the kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadRoots {
    pub distrib: Option<PathBuf>,
    pub patch: Option<PathBuf>,
}

impl DownloadRoots {
    pub fn for_kind(&self, kind: ItemKind) -> Option<&Path> {
        match kind {
            ItemKind::Distrib => self.distrib.as_deref(),
            ItemKind::Patch => self.patch.as_deref(),
        }
    }
}

/// Cosmetic delay between status updates so a human can read them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pacing {
    #[default]
    None,
    Fixed(Duration),
}

impl Pacing {
    pub fn from_duration(delay: Duration) -> Self {
        if delay.is_zero() {
            Pacing::None
        } else {
            Pacing::Fixed(delay)
        }
    }

    pub async fn pause(&self) {
        if let Pacing::Fixed(delay) = self {
            tokio::time::sleep(*delay).await;
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub roots: DownloadRoots,
    pub pacing: Pacing,
    /// Longest wait for the next body chunk before the transfer is retried
    pub idle_timeout: Option<Duration>,
    /// Requeues allowed per item before it is dropped. `None` retries forever.
    pub max_requeues: Option<usize>,
}

/// Per-item bookkeeping, alive only while one item is being processed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferState {
    pub local_path: PathBuf,
    pub known_local_bytes: u64,
    pub total_remote_bytes: u64,
}

impl TransferState {
    pub fn remaining(&self) -> u64 {
        self.total_remote_bytes.saturating_sub(self.known_local_bytes)
    }

    pub fn range_header(&self) -> String {
        format!("bytes={}-", self.known_local_bytes)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// No local root is configured for the item's kind
    Disabled,
    /// The remote resource reports a size of zero
    EmptyRemote,
}

#[derive(Debug)]
pub enum Outcome {
    Completed { transferred: u64 },
    Skipped(SkipReason),
    Requeued(TransferError),
    Failed(TransferError),
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }
}

/// Tally of item outcomes over one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub skipped: usize,
    pub requeued: usize,
    pub failed: usize,
    /// Bytes written by the attempts that completed
    pub bytes_transferred: u64,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Completed { transferred } => {
                self.completed += 1;
                self.bytes_transferred += transferred;
            }
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::Requeued(_) => self.requeued += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}
