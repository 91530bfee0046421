use super::types::DownloadItem;
use std::collections::{HashMap, VecDeque};

/// Items waiting to be processed, consumed from the front.
///
/// Retries go to the back, so a failing item never blocks the ones behind it.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: VecDeque<DownloadItem>,
    requeues: HashMap<DownloadItem, usize>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop_front(&mut self) -> Option<DownloadItem> {
        self.items.pop_front()
    }

    pub fn push_back(&mut self, item: DownloadItem) {
        self.items.push_back(item);
    }

    /// Puts the item back at the end and returns how often it has been requeued.
    pub fn requeue(&mut self, item: DownloadItem) -> usize {
        let count = self.requeues.entry(item.clone()).or_insert(0);
        *count += 1;
        let count = *count;
        self.items.push_back(item);
        count
    }

    pub fn requeue_count(&self, item: &DownloadItem) -> usize {
        self.requeues.get(item).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DownloadItem> {
        self.items.iter()
    }
}

impl FromIterator<DownloadItem> for WorkQueue {
    fn from_iter<T: IntoIterator<Item = DownloadItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
            requeues: HashMap::new(),
        }
    }
}
