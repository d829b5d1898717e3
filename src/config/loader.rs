//! Layered loading and saving of the JSON configuration file.

use super::{BotConfig, ConfigError};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use std::fs;
use std::path::Path;

/// Location of the configuration file relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "data/config.json";

/// Prefix of environment variables overriding file values.
pub const ENV_PREFIX: &str = "COMMENTCAST_";

/// Loads and validates configuration.
///
/// Merge order, later overriding earlier:
/// 1. Compiled defaults
/// 2. The JSON file at `path`, when it exists
/// 3. `COMMENTCAST_*` environment variables
///
/// # Errors
///
/// Returns [`ConfigError::Load`] when a layer is malformed and
/// [`ConfigError::Validation`] when the merged values break a rule.
pub fn load_config(path: &Path) -> Result<BotConfig, ConfigError> {
    let config: BotConfig = Figment::new()
        .merge(Serialized::defaults(BotConfig::default()))
        .merge(Json::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()
        .map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from a JSON string over the defaults, without
/// environment overrides.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] when the JSON is malformed and
/// [`ConfigError::Validation`] when the values break a rule.
pub fn load_config_from_str(json: &str) -> Result<BotConfig, ConfigError> {
    let config: BotConfig = Figment::new()
        .merge(Serialized::defaults(BotConfig::default()))
        .merge(Json::string(json))
        .extract()
        .map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}

/// Validates `config` and writes it as pretty JSON, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] for invalid values and
/// [`ConfigError::Io`] when the file cannot be written.
pub fn save_config(path: &Path, config: &BotConfig) -> Result<(), ConfigError> {
    config.validate()?;
    let body = serde_json::to_string_pretty(config)?;
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, body).map_err(io_error)
}
