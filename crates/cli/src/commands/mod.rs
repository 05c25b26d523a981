pub mod config_cmd;
pub mod init;
pub mod introspect;
pub mod serve;
pub mod simulate;

use std::path::{Path, PathBuf};

use dialogwire_config::AppConfig;

/// The config file in use: `--config` or the default location.
pub fn config_file(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path)
}

/// Load the config file with environment overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let path = config_file(path);
    AppConfig::load_with_overrides(&path)
        .map_err(|e| format!("Failed to load config: {e}").into())
}
