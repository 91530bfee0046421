use super::types::{PatchList, PatchListEntry};
use crate::error::PatchGrabError;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

/// Checks for a valid zlib stream header (CMF/FLG pair).
fn has_zlib_header(body: &[u8]) -> bool {
    match body {
        [cmf, flg, ..] => cmf & 0x0f == 8 && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}

/// Inflates a patch list body, accepting both zlib-wrapped and raw deflate.
pub fn inflate_patch_list(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut payload = Vec::new();
    if has_zlib_header(body) {
        ZlibDecoder::new(body).read_to_end(&mut payload)?;
    } else {
        DeflateDecoder::new(body).read_to_end(&mut payload)?;
    }
    Ok(payload)
}

pub fn parse_patch_list(payload: &[u8]) -> Result<Vec<PatchListEntry>, PatchGrabError> {
    let patch_list: PatchList = serde_json::from_slice(payload)?;
    if patch_list.err {
        return Err(PatchGrabError::Upstream {
            message: patch_list
                .errmsg
                .unwrap_or_else(|| "no error message provided".to_string()),
        });
    }
    Ok(patch_list.data)
}

pub async fn fetch_patch_list(
    client: &reqwest::Client,
    endpoint: &str,
) -> Result<Vec<PatchListEntry>, PatchGrabError> {
    tracing::info!("Fetching patch list from {}", endpoint);

    let response = client
        .get(endpoint)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| PatchGrabError::CatalogFetch {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
    let body = response.bytes().await?;

    let payload = inflate_patch_list(&body).map_err(|e| PatchGrabError::CatalogFetch {
        endpoint: endpoint.to_string(),
        reason: format!("Couldn't decompress response: {}", e),
    })?;

    let entries = parse_patch_list(&payload)?;
    tracing::debug!(entries = entries.len(), "Patch list received");
    Ok(entries)
}
