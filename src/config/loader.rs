use std::path::Path;

use tracing::warn;

use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Config file used when `--cfg` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "shard.json";

/// Loads a configuration file, choosing the parser from its extension.
///
/// # Errors
///
/// Returns an error when the config file cannot be read or parsed.
pub fn load_config_file(path: &Path) -> AppResult<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("toml") => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }
}

/// Writes the default configuration as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error when the default config cannot be serialized or written.
pub fn write_default_config(path: &Path) -> AppResult<()> {
    if path.exists() {
        warn!("{} already exists and will be overwritten.", path.display());
    }
    let mut content = serde_json::to_string_pretty(&ConfigFile::template())
        .map_err(|err| AppError::config(ConfigError::SerializeDefault { source: err }))?;
    content.push('\n');
    std::fs::write(path, content).map_err(|err| {
        AppError::config(ConfigError::WriteConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })
}
