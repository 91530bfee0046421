use super::Config;
use crate::error::PatchGrabError;
use config::Config as ConfigBuilder;
use config::FileFormat;
use std::path::Path;

pub const ENV_PREFIX: &str = "PATCHGRAB";

pub fn load_config(config_path: &Path) -> Result<Config, PatchGrabError> {
    let config_builder = ConfigBuilder::builder()
        .add_source(
            config::File::from(config_path)
                .format(FileFormat::Json)
                .required(false),
        )
        .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?;

    config_builder.try_deserialize().map_err(Into::into)
}

pub fn save_config(app_config: &Config, config_path: &Path) -> Result<(), PatchGrabError> {
    let json =
        serde_json::to_string_pretty(app_config).map_err(|e| PatchGrabError::ConfigSave {
            path: config_path.to_path_buf(),
            reason: format!("JSON serialization failed: {}", e),
        })?;
    std::fs::write(config_path, json).map_err(|e| PatchGrabError::ConfigSave {
        path: config_path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(())
}
