mod engine;
mod error;
mod queue;
mod source;
#[cfg(test)]
mod testing;
mod types;

pub use engine::TransferEngine;
pub use error::TransferError;
pub use queue::WorkQueue;
pub use source::{BodyStream, HttpSource, RangedBody, RemoteSource};
pub use types::{
    DownloadItem, DownloadRoots, EngineOptions, ItemKind, Outcome, Pacing, RunSummary,
    SkipReason, TransferState,
};
