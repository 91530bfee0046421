use super::error::TransferError;
use super::source::{RangedBody, RemoteSource};
use super::types::DownloadItem;
use crate::progress::{ProgressReporter, TransferEvent};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// How the next body request for a URL misbehaves.
#[derive(Clone, Copy, Debug)]
pub enum Interruption {
    /// Deliver this many bytes, then fail.
    FailAfter(usize),
    /// Deliver this many bytes, then never produce another chunk.
    StallAfter(usize),
}

/// In-memory resources with scripted failures and request recording.
pub struct FakeSource {
    resources: HashMap<String, Vec<u8>>,
    reported_sizes: HashMap<String, u64>,
    chunk_size: usize,
    honour_ranges: bool,
    broken_metadata: HashSet<String>,
    broken_requests: HashSet<String>,
    interruptions: Mutex<HashMap<String, VecDeque<Interruption>>>,
    head_requests: Mutex<Vec<String>>,
    body_requests: Mutex<Vec<(String, u64)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
            reported_sizes: HashMap::new(),
            chunk_size: 100,
            honour_ranges: true,
            broken_metadata: HashSet::new(),
            broken_requests: HashSet::new(),
            interruptions: Mutex::new(HashMap::new()),
            head_requests: Mutex::new(Vec::new()),
            body_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_resource(mut self, url: &str, data: Vec<u8>) -> Self {
        self.resources.insert(url.to_string(), data);
        self
    }

    /// Makes metadata requests report `size` regardless of the body served.
    pub fn with_reported_size(mut self, url: &str, size: u64) -> Self {
        self.reported_sizes.insert(url.to_string(), size);
        self
    }

    pub fn ignoring_ranges(mut self) -> Self {
        self.honour_ranges = false;
        self
    }

    pub fn with_broken_metadata(mut self, url: &str) -> Self {
        self.broken_metadata.insert(url.to_string());
        self
    }

    pub fn with_broken_requests(mut self, url: &str) -> Self {
        self.broken_requests.insert(url.to_string());
        self
    }

    pub fn with_interruption(self, url: &str, interruption: Interruption) -> Self {
        self.interruptions
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(interruption);
        self
    }

    pub fn head_requests(&self) -> Vec<String> {
        self.head_requests.lock().unwrap().clone()
    }

    pub fn body_requests(&self) -> Vec<(String, u64)> {
        self.body_requests.lock().unwrap().clone()
    }

    fn chunked(&self, data: &[u8]) -> Vec<Result<Bytes, TransferError>> {
        data.chunks(self.chunk_size)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect()
    }
}

impl RemoteSource for FakeSource {
    async fn content_length(&self, url: &str) -> Result<u64, TransferError> {
        self.head_requests.lock().unwrap().push(url.to_string());
        if self.broken_metadata.contains(url) {
            return Err(TransferError::Metadata {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        if let Some(size) = self.reported_sizes.get(url) {
            return Ok(*size);
        }
        self.resources
            .get(url)
            .map(|data| data.len() as u64)
            .ok_or_else(|| TransferError::Metadata {
                url: url.to_string(),
                reason: "404 Not Found".to_string(),
            })
    }

    async fn fetch_from(&self, url: &str, offset: u64) -> Result<RangedBody, TransferError> {
        self.body_requests
            .lock()
            .unwrap()
            .push((url.to_string(), offset));

        let data = self
            .resources
            .get(url)
            .filter(|_| !self.broken_requests.contains(url))
            .ok_or_else(|| TransferError::Request {
                url: url.to_string(),
                reason: "503 Service Unavailable".to_string(),
            })?;

        let start = if self.honour_ranges {
            (offset as usize).min(data.len())
        } else {
            0
        };
        let body = &data[start..];

        let interruption = self
            .interruptions
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|pending| pending.pop_front());

        let stream = match interruption {
            None => stream::iter(self.chunked(body)).boxed(),
            Some(Interruption::FailAfter(bytes)) => {
                let mut chunks = self.chunked(&body[..bytes.min(body.len())]);
                chunks.push(Err(TransferError::Stream {
                    reason: "connection reset by peer".to_string(),
                }));
                stream::iter(chunks).boxed()
            }
            Some(Interruption::StallAfter(bytes)) => {
                let chunks = self.chunked(&body[..bytes.min(body.len())]);
                stream::iter(chunks).chain(stream::pending()).boxed()
            }
        };

        Ok(RangedBody {
            resumed: self.honour_ranges,
            stream,
        })
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<(String, TransferEvent)>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<(String, TransferEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, event)| event.tag())
            .collect()
    }

    /// Tags with consecutive DOWNLOAD events collapsed into one.
    pub fn phases(&self) -> Vec<&'static str> {
        let mut phases = self.tags();
        phases.dedup_by(|a, b| *a == "DOWNLOAD" && *b == "DOWNLOAD");
        phases
    }

    pub fn percentages(&self) -> Vec<f64> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, event)| match event {
                TransferEvent::Download { downloaded, total } => {
                    Some(crate::progress::percent(*downloaded, *total))
                }
                _ => None,
            })
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, item: &DownloadItem, event: &TransferEvent) {
        self.events
            .lock()
            .unwrap()
            .push((item.version.clone(), event.clone()));
    }
}

pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
