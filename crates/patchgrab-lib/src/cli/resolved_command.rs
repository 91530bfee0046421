use crate::cli::args::{Command, DEFAULT_CONFIG_PATH};
use crate::cli::params::{DownloadParams, ListParams};
use crate::config::{Config, DirectorySetting, load_config};
use crate::error::PatchGrabError;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Download(DownloadParams),
    List(ListParams),
}

fn validate_endpoint(endpoint: &str) -> Result<(), PatchGrabError> {
    url::Url::parse(endpoint).map_err(|e| PatchGrabError::CliArgumentValidation {
        details: format!("Invalid patch list endpoint {}: {}", endpoint, e),
    })?;
    Ok(())
}

fn directory_override(dir: Option<String>, disabled: bool) -> Option<DirectorySetting> {
    if disabled {
        Some(DirectorySetting::Disabled(false))
    } else {
        dir.map(|dir| DirectorySetting::Path(PathBuf::from(dir)))
    }
}

fn resolve_config(config_path: Option<String>) -> Result<(PathBuf, Config), PatchGrabError> {
    let config_path = PathBuf::from(config_path.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()));
    let app_config = load_config(&config_path)?;
    Ok((config_path, app_config))
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, PatchGrabError> {
    match command {
        Command::Download {
            config_path,
            distrib_dir,
            patch_dir,
            no_distrib,
            no_patch,
            silent,
            versions,
            snapshot_path,
            endpoint,
            pacing_ms,
            idle_timeout_secs,
            max_requeues,
        } => {
            let (config_path, app_config) = resolve_config(config_path)?;

            let endpoint = endpoint.unwrap_or_else(|| app_config.endpoint().to_string());
            validate_endpoint(&endpoint)?;

            if versions.iter().any(|version| version.trim().is_empty()) {
                return Err(PatchGrabError::CliArgumentValidation {
                    details: "--only values must not be empty.".to_string(),
                });
            }

            let idle_timeout = match idle_timeout_secs {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => app_config.idle_timeout(),
            };

            Ok(ResolvedCommand::Download(DownloadParams {
                distrib_override: directory_override(distrib_dir, no_distrib),
                patch_override: directory_override(patch_dir, no_patch),
                silent: silent || app_config.is_silent(),
                versions,
                endpoint,
                snapshot_path: snapshot_path
                    .map(PathBuf::from)
                    .unwrap_or_else(|| app_config.snapshot_path()),
                pacing: pacing_ms
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| app_config.pacing()),
                idle_timeout,
                max_requeues: max_requeues.or(app_config.max_requeues),
                app_config,
                config_path,
            }))
        }
        Command::List {
            config_path,
            snapshot_path,
            endpoint,
        } => {
            let (_, app_config) = resolve_config(config_path)?;

            let endpoint = endpoint.unwrap_or_else(|| app_config.endpoint().to_string());
            validate_endpoint(&endpoint)?;

            Ok(ResolvedCommand::List(ListParams {
                endpoint,
                snapshot_path: snapshot_path
                    .map(PathBuf::from)
                    .unwrap_or_else(|| app_config.snapshot_path()),
            }))
        }
    }
}
