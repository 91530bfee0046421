use crate::catalog::{build_catalog, fetch_patch_list, save_snapshot};
use crate::cli::ListParams;
use crate::download::DownloadItem;
use crate::error::PatchGrabError;

pub async fn run_list(params: ListParams) -> Result<Vec<DownloadItem>, PatchGrabError> {
    let ListParams {
        endpoint,
        snapshot_path,
    } = params;

    let client = reqwest::Client::new();
    let entries = fetch_patch_list(&client, &endpoint).await?;
    let catalog = build_catalog(&entries)?;

    tracing::info!("Saving catalog snapshot to {}", snapshot_path.display());
    save_snapshot(&catalog, &snapshot_path)?;

    for item in &catalog {
        println!("{:<8} {:<24} {}", item.kind, item.version, item.url);
    }

    Ok(catalog)
}
