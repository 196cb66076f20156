//! # configs
//!
//! Layered settings for the forum server:
//! built-in defaults, then `config/default.toml` (optional), then
//! `FORUM__SECTION__KEY` environment variables. A `.env` file in the working
//! directory is loaded into the environment first.

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: SecretString,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: SecretString::from(String::new()),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: SecretString::from(String::new()),
        }
    }
}

/// A member written into the directory at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberSeed {
    /// Bearer tokens carry this id as `sub`.
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub banned: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForumSettings {
    /// Empty means "use the built-in community list".
    pub communities: Vec<String>,
    pub members: Vec<MemberSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub forum: ForumSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Loads `.env`, `config/default.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::load_from("config/default")
    }

    /// Same as [`Settings::load`] without `.env`, reading the file at `path`
    /// (extension optional) if it exists.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("FORUM")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("forum.communities")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.expose_secret().len() < 16 {
            return Err(ConfigError::Invalid(
                "auth.jwt_secret must be at least 16 bytes".into(),
            ));
        }
        if self.storage.backend == StorageBackend::Postgres && self.database.url.expose_secret().is_empty() {
            return Err(ConfigError::Invalid(
                "database.url is required for the postgres backend".into(),
            ));
        }
        if self.forum.communities.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid("forum.communities contains an empty name".into()));
        }
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for member in &self.forum.members {
            if member.username.trim().is_empty() {
                return Err(ConfigError::Invalid("forum.members contains an empty username".into()));
            }
            if !ids.insert(member.id) || !names.insert(member.username.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "forum.members lists {} more than once",
                    member.username
                )));
            }
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
