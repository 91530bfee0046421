use crate::download::DownloadItem;
use crate::error::PatchGrabError;
use eyre::WrapErr;
use std::path::Path;

/// Dumps the derived catalog as JSON. The file is informational and never read back.
pub fn save_snapshot(items: &[DownloadItem], path: &Path) -> Result<(), PatchGrabError> {
    let json = serde_json::to_string_pretty(items).map_err(|e| PatchGrabError::SnapshotSave {
        path: path.to_path_buf(),
        reason: format!("JSON serialization failed: {}", e),
    })?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, json).map_err(|e| PatchGrabError::SnapshotSave {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    tracing::debug!(items = items.len(), path = %path.display(), "Catalog snapshot written");
    Ok(())
}
