//! Bot configuration: communities, request pacing and the default reply.
//!
//! Values are layered with `figment`: compiled defaults, then the JSON file,
//! then `COMMENTCAST_*` environment variables.

mod error;
mod loader;
mod model;

pub use error::ConfigError;
pub use loader::{DEFAULT_CONFIG_PATH, ENV_PREFIX, load_config, load_config_from_str, save_config};
pub use model::{BotConfig, Community, RequestDelay};
