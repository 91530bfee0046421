mod loader;
mod model;

pub use loader::{ENV_PREFIX, load_config, save_config};
pub use model::{
    Config, DEFAULT_ENDPOINT, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_SNAPSHOT_PATH, DirectorySetting,
};
