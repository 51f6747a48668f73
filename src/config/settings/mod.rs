
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 768;
pub const DEFAULT_MAX_ROWS: u32 = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub backend: BackendKind,
    /// SQL script (DDL + seed data) hydrating the database on first use.
    /// SQLite runs it verbatim; Postgres runs a copy with SQLite-only
    /// directives stripped.
    pub bootstrap_script: PathBuf,
    pub postgres: PostgresConfig,
    pub genai: GenAiConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Sqlite,
    Postgres,
}

impl fmt::Display for BackendKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
}

impl Default for PostgresConfig {
    #[inline]
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "user".to_string(),
            password: "password".to_string(),
            dbname: "london_travel".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenAiConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub embedding_model: String,
    pub generation_model: String,
    pub embedding_dimension: u32,
}

impl Default for GenAiConfig {
    #[inline]
    fn default() -> Self {
        Self {
            protocol: "https".to_string(),
            host: "generativelanguage.googleapis.com".to_string(),
            port: 443,
            api_key: None,
            embedding_model: "text-embedding-005".to_string(),
            generation_model: "gemini-2.5-flash".to_string(),
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound on rows returned by a single query
    pub max_rows: u32,
    /// When set, the pipeline logs full SQL, predicates, and embedding sizes at info level
    pub debug: bool,
}

impl Default for SearchConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            debug: false,
        }
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            bootstrap_script: PathBuf::from("data/activities.sql"),
            postgres: PostgresConfig::default(),
            genai: GenAiConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid embedding dimension: {0} (must be between 64 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid max rows: {0} (must be between 1 and 1000)")]
    InvalidMaxRows(u32),
    #[error("Invalid Postgres host (cannot be empty)")]
    InvalidPostgresHost,
    #[error("Invalid Postgres database name (cannot be empty)")]
    InvalidPostgresDbName,
    #[error("Invalid bootstrap script path (cannot be empty)")]
    InvalidBootstrapScript,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        fs::create_dir_all(config_dir.as_ref()).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.as_ref().display()
            )
        })?;

        let config_path = config_dir.as_ref().join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("lyla-retrieval"))
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.genai.validate()?;

        if self.search.max_rows == 0 || self.search.max_rows > 1000 {
            return Err(ConfigError::InvalidMaxRows(self.search.max_rows));
        }

        if self.bootstrap_script.as_os_str().is_empty() {
            return Err(ConfigError::InvalidBootstrapScript);
        }

        if self.backend == BackendKind::Postgres {
            if self.postgres.host.trim().is_empty() {
                return Err(ConfigError::InvalidPostgresHost);
            }
            if self.postgres.port == 0 {
                return Err(ConfigError::InvalidPort(self.postgres.port));
            }
            if self.postgres.dbname.trim().is_empty() {
                return Err(ConfigError::InvalidPostgresDbName);
            }
        }

        Ok(())
    }
}

impl GenAiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))?;

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.generation_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.generation_model.clone()));
        }

        if !(64..=4096).contains(&self.embedding_dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding_dimension,
            ));
        }

        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }
}
