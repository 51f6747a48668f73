// Configuration management module
// Handles TOML configuration for backend selection, model endpoint, and search limits

pub mod settings;

pub use settings::{
    BackendKind, Config, ConfigError, GenAiConfig, PostgresConfig, SearchConfig,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
