use super::error::TransferError;
use super::queue::WorkQueue;
use super::source::RemoteSource;
use super::types::{DownloadItem, EngineOptions, Outcome, RunSummary, SkipReason, TransferState};
use crate::progress::{ProgressReporter, TransferEvent};
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};

async fn local_file_size(path: &Path) -> Result<u64, TransferError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.len()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(0),
        Err(source) => Err(TransferError::LocalFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Downloads queued items one at a time, resuming partial files.
pub struct TransferEngine<S, R> {
    source: S,
    reporter: R,
    options: EngineOptions,
}

impl<S: RemoteSource, R: ProgressReporter> TransferEngine<S, R> {
    pub fn new(source: S, reporter: R, options: EngineOptions) -> Self {
        Self {
            source,
            reporter,
            options,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Processes items until the queue is empty. Item failures never stop the run.
    pub async fn run(&self, mut queue: WorkQueue) -> RunSummary {
        let mut summary = RunSummary::default();
        tracing::info!(items = queue.len(), "Processing download queue");

        while let Some(outcome) = self.process_next(&mut queue).await {
            summary.record(&outcome);
        }

        tracing::info!(
            completed = summary.completed,
            skipped = summary.skipped,
            requeued = summary.requeued,
            failed = summary.failed,
            bytes = summary.bytes_transferred,
            "Download queue finished"
        );
        summary
    }

    /// Takes the front item, processes it and requeues it on a retriable failure.
    pub async fn process_next(&self, queue: &mut WorkQueue) -> Option<Outcome> {
        let item = queue.pop_front()?;
        let local_root = self.options.roots.for_kind(item.kind);

        let outcome = match self.process_item(&item, local_root).await {
            Outcome::Requeued(err) => {
                let attempts = queue.requeue_count(&item);
                match self.options.max_requeues {
                    Some(limit) if attempts >= limit => {
                        let err = TransferError::RetriesExhausted {
                            attempts,
                            last: Box::new(err),
                        };
                        tracing::warn!(version = %item.version, "Dropping item: {}", err);
                        self.reporter
                            .report(&item, &TransferEvent::Error(err.to_string()));
                        Outcome::Failed(err)
                    }
                    _ => {
                        let attempts = queue.requeue(item.clone());
                        tracing::debug!(version = %item.version, attempts, "Requeued");
                        Outcome::Requeued(err)
                    }
                }
            }
            other => other,
        };

        Some(outcome)
    }

    /// Brings the local copy of `item` under `local_root` up to the remote size.
    ///
    /// `None` for the root means the item's kind is disabled.
    pub async fn process_item(&self, item: &DownloadItem, local_root: Option<&Path>) -> Outcome {
        let Some(local_root) = local_root else {
            tracing::debug!(version = %item.version, kind = %item.kind, "No directory configured, skipping");
            return Outcome::Skipped(SkipReason::Disabled);
        };

        match self.transfer(item, local_root).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(version = %item.version, url = %item.url, "Download failed: {}", err);
                self.reporter
                    .report(item, &TransferEvent::Error(err.to_string()));
                Outcome::Failed(err)
            }
        }
    }

    async fn transfer(
        &self,
        item: &DownloadItem,
        local_root: &Path,
    ) -> Result<Outcome, TransferError> {
        tokio::fs::create_dir_all(local_root)
            .await
            .map_err(|source| TransferError::CreateDirectory {
                path: local_root.to_path_buf(),
                source,
            })?;

        let total_remote_bytes = self.source.content_length(&item.url).await?;
        let local_path = local_root.join(&item.file);
        let known_local_bytes = local_file_size(&local_path).await?;

        let mut state = TransferState {
            local_path,
            known_local_bytes,
            total_remote_bytes,
        };
        tracing::debug!(
            version = %item.version,
            path = %state.local_path.display(),
            local = state.known_local_bytes,
            total = state.total_remote_bytes,
            "Checking"
        );
        self.reporter.report(item, &TransferEvent::Checking);
        self.options.pacing.pause().await;

        if state.total_remote_bytes == 0 {
            self.reporter.report(item, &TransferEvent::Skipping);
            self.options.pacing.pause().await;
            return Ok(Outcome::Skipped(SkipReason::EmptyRemote));
        }

        if state.known_local_bytes > state.total_remote_bytes {
            tracing::info!(
                version = %item.version,
                path = %state.local_path.display(),
                "Local file is larger than the remote one, deleting"
            );
            self.reporter.report(item, &TransferEvent::Oversize);
            tokio::fs::remove_file(&state.local_path)
                .await
                .map_err(|source| TransferError::LocalFile {
                    path: state.local_path.clone(),
                    source,
                })?;
            state.known_local_bytes = 0;
            self.options.pacing.pause().await;
        }

        let outcome = if state.known_local_bytes < state.total_remote_bytes {
            self.stream_into(item, &mut state).await?
        } else {
            tracing::debug!(version = %item.version, "Already downloaded");
            self.reporter.report(item, &TransferEvent::Complete);
            Outcome::Completed { transferred: 0 }
        };

        if outcome.is_completed() {
            self.options.pacing.pause().await;
        }
        Ok(outcome)
    }

    async fn stream_into(
        &self,
        item: &DownloadItem,
        state: &mut TransferState,
    ) -> Result<Outcome, TransferError> {
        tracing::debug!(
            version = %item.version,
            url = %item.url,
            range = %state.range_header(),
            remaining = state.remaining(),
            "Requesting body"
        );
        let body = self
            .source
            .fetch_from(&item.url, state.known_local_bytes)
            .await?;

        let mut options = OpenOptions::new();
        options.create(true);
        if state.known_local_bytes > 0 && !body.resumed {
            tracing::warn!(
                version = %item.version,
                url = %item.url,
                "Server ignored the range request, restarting from the beginning"
            );
            state.known_local_bytes = 0;
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }

        let local_path = state.local_path.clone();
        let local_file_error = |source: std::io::Error| TransferError::LocalFile {
            path: local_path.clone(),
            source,
        };
        let file = options
            .open(&local_path)
            .await
            .map_err(local_file_error)?;
        let mut writer = BufWriter::new(file);
        let mut stream = body.stream;
        let mut transferred = 0u64;

        loop {
            let next = match self.options.idle_timeout {
                Some(limit) => tokio::time::timeout(limit, stream.next())
                    .await
                    .unwrap_or_else(|_| Some(Err(TransferError::StreamTimeout(limit)))),
                None => stream.next().await,
            };

            match next {
                Some(Ok(chunk)) => {
                    // Never grow the file past the size measured before the transfer.
                    let remaining = usize::try_from(state.remaining()).unwrap_or(usize::MAX);
                    let keep = chunk.len().min(remaining);
                    if keep < chunk.len() {
                        tracing::warn!(
                            version = %item.version,
                            url = %item.url,
                            extra = chunk.len() - keep,
                            "Server sent more data than advertised, discarding the excess"
                        );
                    }
                    writer
                        .write_all(&chunk[..keep])
                        .await
                        .map_err(local_file_error)?;
                    state.known_local_bytes += keep as u64;
                    transferred += keep as u64;
                    self.reporter.report(
                        item,
                        &TransferEvent::Download {
                            downloaded: state.known_local_bytes,
                            total: state.total_remote_bytes,
                        },
                    );
                    if state.remaining() == 0 {
                        break;
                    }
                }
                Some(Err(err)) => {
                    writer.flush().await.map_err(local_file_error)?;
                    tracing::warn!(
                        version = %item.version,
                        offset = state.known_local_bytes,
                        "Transfer interrupted, will retry: {}",
                        err
                    );
                    self.reporter.report(item, &TransferEvent::Retrying);
                    return Ok(Outcome::Requeued(err));
                }
                None => break,
            }
        }

        writer.flush().await.map_err(local_file_error)?;
        tracing::info!(
            version = %item.version,
            path = %local_path.display(),
            bytes = transferred,
            "Download complete"
        );
        self.reporter.report(item, &TransferEvent::Complete);
        Ok(Outcome::Completed { transferred })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::testing::{FakeSource, Interruption, RecordingReporter, patterned};
    use crate::download::{DownloadRoots, ItemKind};
    use std::path::PathBuf;
    use std::time::Duration;

    const URL: &str = "http://x/patch.zip";

    fn patch_item() -> DownloadItem {
        DownloadItem {
            kind: ItemKind::Patch,
            version: "1.2-1.3".to_string(),
            file: "patch.zip".to_string(),
            path: "1.2-1.3".to_string(),
            url: URL.to_string(),
        }
    }

    fn item_at(version: &str, url: &str) -> DownloadItem {
        DownloadItem {
            kind: ItemKind::Patch,
            version: version.to_string(),
            file: format!("{version}.update"),
            path: version.to_string(),
            url: url.to_string(),
        }
    }

    fn engine(
        source: FakeSource,
        patch_root: PathBuf,
    ) -> TransferEngine<FakeSource, RecordingReporter> {
        engine_with(source, patch_root, EngineOptions::default())
    }

    fn engine_with(
        source: FakeSource,
        patch_root: PathBuf,
        options: EngineOptions,
    ) -> TransferEngine<FakeSource, RecordingReporter> {
        TransferEngine::new(
            source,
            RecordingReporter::default(),
            EngineOptions {
                roots: DownloadRoots {
                    distrib: None,
                    patch: Some(patch_root),
                },
                ..options
            },
        )
    }

    #[tokio::test]
    async fn test_fresh_download_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("patches");
        let data = patterned(1000);
        let engine = engine(FakeSource::new().with_resource(URL, data.clone()), root.clone());

        let outcome = engine.process_item(&patch_item(), Some(&root)).await;

        assert!(matches!(outcome, Outcome::Completed { transferred: 1000 }));
        assert!(root.is_dir());
        assert_eq!(std::fs::read(root.join("patch.zip")).unwrap(), data);
        assert_eq!(engine.source().body_requests(), vec![(URL.to_string(), 0)]);
        assert_eq!(
            engine.reporter().phases(),
            vec!["CHECKING", "DOWNLOAD", "COMPLETE"]
        );
    }

    #[tokio::test]
    async fn test_complete_file_is_not_downloaded_again() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let data = patterned(1000);
        std::fs::write(root.join("patch.zip"), &data).unwrap();
        let engine = engine(FakeSource::new().with_resource(URL, data.clone()), root.clone());

        let outcome = engine.process_item(&patch_item(), Some(&root)).await;

        assert!(matches!(outcome, Outcome::Completed { transferred: 0 }));
        assert!(engine.source().body_requests().is_empty());
        assert_eq!(engine.reporter().tags(), vec!["CHECKING", "COMPLETE"]);
    }

    #[tokio::test]
    async fn test_second_run_transfers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let data = patterned(1000);
        let engine = engine(FakeSource::new().with_resource(URL, data.clone()), root.clone());

        let first = engine.process_item(&patch_item(), Some(&root)).await;
        let second = engine.process_item(&patch_item(), Some(&root)).await;

        assert!(matches!(first, Outcome::Completed { transferred: 1000 }));
        assert!(matches!(second, Outcome::Completed { transferred: 0 }));
        assert_eq!(engine.source().body_requests().len(), 1);
        assert_eq!(std::fs::read(root.join("patch.zip")).unwrap(), data);
    }

    #[tokio::test]
    async fn test_oversized_file_is_deleted_and_downloaded_from_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let data = patterned(1000);
        std::fs::write(root.join("patch.zip"), vec![0xAA; 1200]).unwrap();
        let engine = engine(FakeSource::new().with_resource(URL, data.clone()), root.clone());

        let outcome = engine.process_item(&patch_item(), Some(&root)).await;

        assert!(matches!(outcome, Outcome::Completed { transferred: 1000 }));
        assert_eq!(engine.source().body_requests(), vec![(URL.to_string(), 0)]);
        assert_eq!(std::fs::read(root.join("patch.zip")).unwrap(), data);
        assert_eq!(
            engine.reporter().phases(),
            vec!["CHECKING", "OVERSIZE", "DOWNLOAD", "COMPLETE"]
        );
    }

    #[tokio::test]
    async fn test_partial_file_resumes_without_touching_existing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let data = patterned(1000);
        // A marker prefix shows that the first 400 bytes are never rewritten.
        std::fs::write(root.join("patch.zip"), vec![0xEE; 400]).unwrap();
        let engine = engine(FakeSource::new().with_resource(URL, data.clone()), root.clone());

        let outcome = engine.process_item(&patch_item(), Some(&root)).await;

        assert!(matches!(outcome, Outcome::Completed { transferred: 600 }));
        assert_eq!(engine.source().body_requests(), vec![(URL.to_string(), 400)]);

        let written = std::fs::read(root.join("patch.zip")).unwrap();
        assert_eq!(written.len(), 1000);
        assert!(written[..400].iter().all(|b| *b == 0xEE));
        assert_eq!(&written[400..], &data[400..]);
    }

    #[tokio::test]
    async fn test_empty_remote_is_skipped_without_creating_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let engine = engine(FakeSource::new().with_resource(URL, Vec::new()), root.clone());

        let outcome = engine.process_item(&patch_item(), Some(&root)).await;

        assert!(matches!(outcome, Outcome::Skipped(SkipReason::EmptyRemote)));
        assert!(!root.join("patch.zip").exists());
        assert!(engine.source().body_requests().is_empty());
        assert_eq!(engine.reporter().tags(), vec!["CHECKING", "SKIPPING"]);
    }

    #[tokio::test]
    async fn test_empty_remote_leaves_existing_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std::fs::write(root.join("patch.zip"), b"keep me").unwrap();
        let engine = engine(FakeSource::new().with_resource(URL, Vec::new()), root.clone());

        let outcome = engine.process_item(&patch_item(), Some(&root)).await;

        assert!(matches!(outcome, Outcome::Skipped(SkipReason::EmptyRemote)));
        assert_eq!(std::fs::read(root.join("patch.zip")).unwrap(), b"keep me");
    }

    #[tokio::test]
    async fn test_disabled_root_skips_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(
            FakeSource::new().with_resource(URL, patterned(10)),
            dir.path().to_path_buf(),
        );

        let outcome = engine.process_item(&patch_item(), None).await;

        assert!(matches!(outcome, Outcome::Skipped(SkipReason::Disabled)));
        assert!(engine.source().head_requests().is_empty());
        assert!(engine.reporter().events().is_empty());
    }

    #[tokio::test]
    async fn test_stream_error_requeues_and_keeps_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let data = patterned(1000);
        let source = FakeSource::new()
            .with_resource(URL, data.clone())
            .with_interruption(URL, Interruption::FailAfter(300));
        let engine = engine(source, root.clone());

        let outcome = engine.process_item(&patch_item(), Some(&root)).await;

        match outcome {
            Outcome::Requeued(err) => assert!(err.is_retriable()),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(std::fs::read(root.join("patch.zip")).unwrap(), &data[..300]);
        assert_eq!(
            engine.reporter().phases(),
            vec!["CHECKING", "DOWNLOAD", "RETRYING"]
        );

        let retry = engine.process_item(&patch_item(), Some(&root)).await;

        assert!(matches!(retry, Outcome::Completed { transferred: 700 }));
        assert_eq!(
            engine.source().body_requests(),
            vec![(URL.to_string(), 0), (URL.to_string(), 300)]
        );
        assert_eq!(std::fs::read(root.join("patch.zip")).unwrap(), data);
    }

    #[tokio::test]
    async fn test_stalled_stream_times_out_and_requeues() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let source = FakeSource::new()
            .with_resource(URL, patterned(1000))
            .with_interruption(URL, Interruption::StallAfter(200));
        let engine = engine_with(
            source,
            root.clone(),
            EngineOptions {
                idle_timeout: Some(Duration::from_millis(50)),
                ..EngineOptions::default()
            },
        );

        let outcome = engine.process_item(&patch_item(), Some(&root)).await;

        assert!(matches!(
            outcome,
            Outcome::Requeued(TransferError::StreamTimeout(_))
        ));
        assert_eq!(std::fs::metadata(root.join("patch.zip")).unwrap().len(), 200);
    }

    #[tokio::test]
    async fn test_metadata_failure_is_not_retriable() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let engine = engine(
            FakeSource::new()
                .with_resource(URL, patterned(10))
                .with_broken_metadata(URL),
            root.clone(),
        );
        let mut queue: WorkQueue = [patch_item()].into_iter().collect();

        let outcome = engine.process_next(&mut queue).await.unwrap();

        assert!(matches!(outcome, Outcome::Failed(TransferError::Metadata { .. })));
        assert!(queue.is_empty());
        assert_eq!(engine.reporter().tags(), vec!["ERROR"]);
    }

    #[tokio::test]
    async fn test_body_request_failure_is_not_retriable() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let engine = engine(
            FakeSource::new()
                .with_resource(URL, patterned(10))
                .with_broken_requests(URL),
            root.clone(),
        );
        let mut queue: WorkQueue = [patch_item()].into_iter().collect();

        let outcome = engine.process_next(&mut queue).await.unwrap();

        assert!(matches!(outcome, Outcome::Failed(TransferError::Request { .. })));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_requeue_keeps_queue_size() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let first = item_at("a", "http://x/a");
        let second = item_at("b", "http://x/b");
        let source = FakeSource::new()
            .with_resource("http://x/a", patterned(500))
            .with_resource("http://x/b", patterned(500))
            .with_interruption("http://x/a", Interruption::FailAfter(100));
        let engine = engine(source, root);
        let mut queue: WorkQueue = [first.clone(), second.clone()].into_iter().collect();

        let outcome = engine.process_next(&mut queue).await.unwrap();

        assert!(matches!(outcome, Outcome::Requeued(_)));
        assert_eq!(queue.len(), 2);
        let order: Vec<&DownloadItem> = queue.iter().collect();
        assert_eq!(order, vec![&second, &first]);
    }

    #[tokio::test]
    async fn test_run_retries_until_complete() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let data = patterned(1000);
        let source = FakeSource::new()
            .with_resource("http://x/a", data.clone())
            .with_resource("http://x/b", patterned(200))
            .with_interruption("http://x/a", Interruption::FailAfter(100))
            .with_interruption("http://x/a", Interruption::FailAfter(100));
        let engine = engine(source, root.clone());
        let queue: WorkQueue = [item_at("a", "http://x/a"), item_at("b", "http://x/b")]
            .into_iter()
            .collect();

        let summary = engine.run(queue).await;

        assert_eq!(summary.completed, 2);
        assert_eq!(summary.requeued, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.bytes_transferred, 1000);
        assert_eq!(std::fs::read(root.join("a.update")).unwrap(), data);

        // The failing item goes behind the other one after its first failure.
        let offsets: Vec<(String, u64)> = engine.source().body_requests();
        assert_eq!(
            offsets,
            vec![
                ("http://x/a".to_string(), 0),
                ("http://x/b".to_string(), 0),
                ("http://x/a".to_string(), 100),
                ("http://x/a".to_string(), 200),
            ]
        );
    }

    #[tokio::test]
    async fn test_requeue_limit_drops_item() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let source = FakeSource::new()
            .with_resource(URL, patterned(1000))
            .with_interruption(URL, Interruption::FailAfter(100))
            .with_interruption(URL, Interruption::FailAfter(100))
            .with_interruption(URL, Interruption::FailAfter(100));
        let engine = engine_with(
            source,
            root.clone(),
            EngineOptions {
                max_requeues: Some(1),
                ..EngineOptions::default()
            },
        );
        let queue: WorkQueue = [patch_item()].into_iter().collect();

        let summary = engine.run(queue).await;

        assert_eq!(summary.requeued, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.completed, 0);
        assert_eq!(engine.source().body_requests().len(), 2);
        assert_eq!(engine.reporter().tags().last(), Some(&"ERROR"));
    }

    #[tokio::test]
    async fn test_disabled_kind_is_skipped_by_run() {
        let dir = tempfile::tempdir().unwrap();
        let distrib = DownloadItem {
            kind: ItemKind::Distrib,
            ..item_at("0.2", "http://x/0.2.zip")
        };
        let engine = engine(
            FakeSource::new().with_resource("http://x/0.2.zip", patterned(10)),
            dir.path().to_path_buf(),
        );

        let summary = engine.run([distrib].into_iter().collect()).await;

        assert_eq!(summary.skipped, 1);
        assert!(engine.source().head_requests().is_empty());
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_ends_at_100() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std::fs::write(root.join("patch.zip"), patterned(250)).unwrap();
        let engine = engine(FakeSource::new().with_resource(URL, patterned(1000)), root.clone());

        engine.process_item(&patch_item(), Some(&root)).await;

        let percentages = engine.reporter().percentages();
        assert_eq!(percentages.first(), Some(&35.0));
        assert!(percentages.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(percentages.last(), Some(&100.0));
    }

    #[tokio::test]
    async fn test_ignored_range_restarts_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let data = patterned(1000);
        std::fs::write(root.join("patch.zip"), vec![0xEE; 400]).unwrap();
        let engine = engine(
            FakeSource::new()
                .with_resource(URL, data.clone())
                .ignoring_ranges(),
            root.clone(),
        );

        let outcome = engine.process_item(&patch_item(), Some(&root)).await;

        assert!(matches!(outcome, Outcome::Completed { transferred: 1000 }));
        assert_eq!(std::fs::read(root.join("patch.zip")).unwrap(), data);
    }

    #[tokio::test]
    async fn test_longer_body_is_cut_at_measured_size() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let data = patterned(1000);
        let engine = engine(
            FakeSource::new()
                .with_resource(URL, data.clone())
                .with_reported_size(URL, 500),
            root.clone(),
        );

        let outcome = engine.process_item(&patch_item(), Some(&root)).await;

        assert!(matches!(outcome, Outcome::Completed { transferred: 500 }));
        assert_eq!(std::fs::read(root.join("patch.zip")).unwrap(), data[..500]);
        let percentages = engine.reporter().percentages();
        assert_eq!(percentages.len(), 5);
        assert_eq!(percentages.last(), Some(&100.0));
        assert_eq!(engine.reporter().phases(), vec!["CHECKING", "DOWNLOAD", "COMPLETE"]);
    }

    #[tokio::test]
    async fn test_over_delivering_resume_stops_at_measured_size() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let data = patterned(1000);
        std::fs::write(root.join("patch.zip"), &data[..250]).unwrap();
        let engine = engine(
            FakeSource::new()
                .with_resource(URL, data.clone())
                .with_reported_size(URL, 430),
            root.clone(),
        );

        let outcome = engine.process_item(&patch_item(), Some(&root)).await;

        assert!(matches!(outcome, Outcome::Completed { transferred: 180 }));
        assert_eq!(std::fs::read(root.join("patch.zip")).unwrap(), data[..430]);
        assert!(engine.reporter().percentages().iter().all(|p| *p <= 100.0));
    }

    #[tokio::test]
    async fn test_directory_creation_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-directory");
        std::fs::write(&blocker, b"file").unwrap();
        let root = blocker.join("patches");
        let engine = engine(FakeSource::new().with_resource(URL, patterned(10)), root.clone());

        let outcome = engine.process_item(&patch_item(), Some(&root)).await;

        assert!(matches!(
            outcome,
            Outcome::Failed(TransferError::CreateDirectory { .. })
        ));
        assert!(engine.source().head_requests().is_empty());
    }
}
