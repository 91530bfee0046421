use crate::download::DownloadItem;
use itertools::Itertools;

/// Distinct versions in catalog order, as offered to the user.
pub fn available_versions(items: &[DownloadItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.version.clone())
        .unique()
        .collect()
}

/// Keeps the items whose version was chosen, preserving catalog order.
pub fn select_versions(items: Vec<DownloadItem>, versions: &[String]) -> Vec<DownloadItem> {
    items
        .into_iter()
        .filter(|item| versions.contains(&item.version))
        .collect()
}
