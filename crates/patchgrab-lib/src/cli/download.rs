use crate::catalog::{
    available_versions, build_catalog, fetch_patch_list, save_snapshot, select_versions,
};
use crate::cli::DownloadParams;
use crate::cli::prompt::{ask_directory, ask_versions};
use crate::config::{DirectorySetting, save_config};
use crate::download::{
    DownloadItem, DownloadRoots, EngineOptions, HttpSource, Pacing, RunSummary, TransferEngine,
};
use crate::error::PatchGrabError;
use crate::progress::ConsoleReporter;
use eyre::WrapErr;
use std::path::PathBuf;

const DEFAULT_DISTRIB_DIR: &str = "distribs";
const DEFAULT_PATCH_DIR: &str = "patches";

/// Picks the directory for one item kind, asking for it once when it was never configured.
fn resolve_directory(
    override_setting: Option<DirectorySetting>,
    stored: &mut Option<DirectorySetting>,
    interactive: bool,
    message: &str,
    initial: &str,
) -> Result<(Option<PathBuf>, bool), PatchGrabError> {
    if let Some(setting) = override_setting {
        return Ok((setting.root().map(PathBuf::from), false));
    }
    if let Some(setting) = stored {
        return Ok((setting.root().map(PathBuf::from), false));
    }

    let answer = if interactive {
        ask_directory(message, initial)?
    } else {
        initial.to_string()
    };
    tracing::info!("Using {} for {}", answer, initial);

    let setting = DirectorySetting::Path(PathBuf::from(answer));
    let root = setting.root().map(PathBuf::from);
    *stored = Some(setting);
    Ok((root, true))
}

fn select_items(
    catalog: Vec<DownloadItem>,
    versions: &[String],
    silent: bool,
    interactive: bool,
) -> Result<Vec<DownloadItem>, PatchGrabError> {
    if !versions.is_empty() {
        let selected = select_versions(catalog, versions);
        if selected.is_empty() {
            tracing::warn!("None of the requested versions are in the patch list");
        }
        return Ok(selected);
    }
    if silent || !interactive {
        return Ok(catalog);
    }

    let picked = ask_versions(&available_versions(&catalog))?;
    Ok(select_versions(catalog, &picked))
}

pub async fn run_download(params: DownloadParams) -> Result<RunSummary, PatchGrabError> {
    let DownloadParams {
        mut app_config,
        config_path,
        distrib_override,
        patch_override,
        silent,
        versions,
        endpoint,
        snapshot_path,
        pacing,
        idle_timeout,
        max_requeues,
    } = params;

    let interactive = !silent && console::user_attended();

    let mut store_changed = false;
    if app_config.silent.is_none() {
        app_config.silent = Some(false);
        store_changed = true;
    }

    let (distrib, distrib_changed) = resolve_directory(
        distrib_override,
        &mut app_config.distrib,
        interactive,
        "Where do you want to download distrib files?",
        DEFAULT_DISTRIB_DIR,
    )?;
    let (patch, patch_changed) = resolve_directory(
        patch_override,
        &mut app_config.patch,
        interactive,
        "Where do you want to download patch files?",
        DEFAULT_PATCH_DIR,
    )?;

    if store_changed || distrib_changed || patch_changed {
        tracing::debug!("Saving settings to {}", config_path.display());
        save_config(&app_config, &config_path)?;
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("patchgrab/", env!("CARGO_PKG_VERSION")))
        .build()
        .wrap_err("Failed to build HTTP client")?;

    let entries = fetch_patch_list(&client, &endpoint).await?;
    let catalog = build_catalog(&entries)?;
    tracing::info!("Patch list contains {} items", catalog.len());

    tracing::info!("Saving catalog snapshot to {}", snapshot_path.display());
    save_snapshot(&catalog, &snapshot_path)?;

    let selected = select_items(catalog, &versions, silent, interactive)?;
    tracing::info!("Downloading {} items...", selected.len());

    let engine = TransferEngine::new(
        HttpSource::new(client),
        ConsoleReporter::stdout(),
        EngineOptions {
            roots: DownloadRoots { distrib, patch },
            pacing: Pacing::from_duration(pacing),
            idle_timeout,
            max_requeues,
        },
    );
    let summary = engine.run(selected.into_iter().collect()).await;

    if summary.failed > 0 {
        tracing::warn!("{} items could not be downloaded", summary.failed);
    } else {
        tracing::info!("Download completed successfully");
    }
    Ok(summary)
}
