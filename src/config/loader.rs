use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use tracing::debug;

use crate::config::AppConfig;

const CONFIG_DIR: &str = "stackadmin";
const CONFIG_FILE: &str = "config.toml";

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load the config from `path`, or from the default location.
///
/// A missing default file yields defaults; a missing explicit file is an error.
pub fn load(path: Option<&Path>) -> color_eyre::Result<AppConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match config_path() {
            Some(path) if path.exists() => path,
            Some(path) => {
                debug!("Config file not found at {:?}, using defaults", path);
                return Ok(AppConfig::default());
            }
            None => {
                debug!("No config directory found, using defaults");
                return Ok(AppConfig::default());
            }
        },
    };

    let content = fs::read_to_string(&path)
        .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
    let config = parse(&content)
        .wrap_err_with(|| format!("invalid config file {}", path.display()))?;
    debug!("Loaded config from {:?}", path);
    Ok(config)
}

pub fn parse(content: &str) -> color_eyre::Result<AppConfig> {
    Ok(toml::from_str(content)?)
}
