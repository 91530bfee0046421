use super::types::PatchListEntry;
use crate::download::{DownloadItem, ItemKind};
use crate::error::PatchGrabError;
use itertools::Itertools;
use url::Url;

const UPDATES_SEGMENT: &str = "ClientUpdates";
const DISTRIBS_SEGMENT: &str = "ClientDistribs";
const UPDATE_EXTENSION: &str = ".update";
const DISTRIB_EXTENSION: &str = ".zip";

/// Splits a download URI into its directory and file segments.
///
/// Upstream URIs look like `https://host/ClientUpdates/<dir>/<file>`.
fn directory_and_file(uri: &str) -> Result<(String, String), PatchGrabError> {
    let url = Url::parse(uri).map_err(|e| PatchGrabError::CatalogEntry {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [_, directory, file, ..] if !file.is_empty() => {
            Ok((directory.to_string(), file.to_string()))
        }
        _ => Err(PatchGrabError::CatalogEntry {
            uri: uri.to_string(),
            reason: "expected at least three path segments".to_string(),
        }),
    }
}

fn patch_item(entry: &PatchListEntry) -> Result<DownloadItem, PatchGrabError> {
    let (directory, file) = directory_and_file(&entry.download_uri)?;
    Ok(DownloadItem {
        kind: ItemKind::Patch,
        version: format!("{}-{}", entry.from_version, entry.version),
        file,
        path: directory,
        url: entry.download_uri.clone(),
    })
}

fn distrib_item(entry: &PatchListEntry) -> Result<DownloadItem, PatchGrabError> {
    let (directory, file) = directory_and_file(&entry.download_uri)?;
    let prefix = format!("{}-", entry.from_version);

    Ok(DownloadItem {
        kind: ItemKind::Distrib,
        version: entry.version.clone(),
        file: file
            .replacen(&prefix, "", 2)
            .replacen(UPDATE_EXTENSION, DISTRIB_EXTENSION, 1),
        path: directory.replacen(&prefix, "", 1),
        url: entry
            .download_uri
            .replacen(UPDATES_SEGMENT, DISTRIBS_SEGMENT, 1)
            .replacen(&prefix, "", 2)
            .replacen(UPDATE_EXTENSION, DISTRIB_EXTENSION, 1),
    })
}

/// Derives the flat list of downloadable items from the upstream patch list.
///
/// Every entry yields one full distribution and one incremental patch. The
/// result is sorted by version string, newest first; items that would land in
/// the same local file are kept once.
pub fn build_catalog(entries: &[PatchListEntry]) -> Result<Vec<DownloadItem>, PatchGrabError> {
    let distribs = entries.iter().map(distrib_item);
    let patches = entries.iter().map(patch_item);

    let mut items: Vec<DownloadItem> = distribs
        .chain(patches)
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .unique_by(|item| (item.kind, item.file.clone()))
        .collect();

    items.sort_by(|a, b| b.version.cmp(&a.version));

    tracing::debug!(
        entries = entries.len(),
        items = items.len(),
        "Built download catalog"
    );
    Ok(items)
}
