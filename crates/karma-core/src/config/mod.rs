//! Configuration system for dazeus-karma.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{KarmaError, KarmaResult};

/// Property store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// The DaZeus core's own property store.
    #[default]
    DaZeus,
    /// A local SQLite database.
    Sqlite,
    /// Process memory only.
    Memory,
}

/// Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend type.
    pub backend: StoreBackend,
    /// Database path for the SQLite backend.
    pub sqlite_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let karma_dir = dirs::home_dir()
            .map(|h| h.join(".dazeus-karma"))
            .unwrap_or_else(|| PathBuf::from(".dazeus-karma"));

        Self {
            backend: StoreBackend::DaZeus,
            sqlite_path: karma_dir.join("karma.db"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Main plugin configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KarmaConfig {
    /// Prefix prepended to every karma property key.
    pub property_prefix: String,
    /// Command prefix, `}` in `}karma`.
    pub highlight_char: String,
    /// Characters that mark a recipient as a channel.
    pub channel_prefixes: String,
    /// Plugin name sent in the handshake.
    pub plugin_name: String,
    /// Plugin version sent in the handshake.
    pub plugin_version: String,
    /// Configuration group sent in the handshake.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_group: Option<String>,
    /// Property store configuration.
    pub store: StoreConfig,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for KarmaConfig {
    fn default() -> Self {
        Self {
            property_prefix: "perl.DazKarma.".to_string(),
            highlight_char: "}".to_string(),
            channel_prefixes: "#".to_string(),
            plugin_name: "dazeus-karma".to_string(),
            plugin_version: env!("CARGO_PKG_VERSION").to_string(),
            config_group: None,
            store: StoreConfig::default(),
            log_format: LogFormat::Text,
        }
    }
}

impl KarmaConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> KarmaResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| KarmaError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| KarmaError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| KarmaError::Configuration(e.to_string()))?,
            _ => {
                return Err(KarmaError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Overlay `KARMA_*` environment variables onto this configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(prefix) = std::env::var("KARMA_PROPERTY_PREFIX") {
            self.property_prefix = prefix;
        }
        if let Ok(highlight) = std::env::var("KARMA_HIGHLIGHT_CHAR") {
            self.highlight_char = highlight;
        }
        if let Ok(prefixes) = std::env::var("KARMA_CHANNEL_PREFIXES") {
            self.channel_prefixes = prefixes;
        }
        if let Ok(group) = std::env::var("KARMA_CONFIG_GROUP") {
            self.config_group = Some(group);
        }

        // Store configuration
        if let Ok(backend) = std::env::var("KARMA_STORE_BACKEND") {
            self.store.backend = match backend.to_lowercase().as_str() {
                "sqlite" => StoreBackend::Sqlite,
                "memory" => StoreBackend::Memory,
                _ => StoreBackend::DaZeus,
            };
        }
        if let Ok(path) = std::env::var("KARMA_SQLITE_PATH") {
            self.store.sqlite_path = PathBuf::from(path);
        }

        if let Ok(format) = std::env::var("KARMA_LOG_FORMAT") {
            self.log_format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Text,
            };
        }

        self
    }

    /// Check invariants the rest of the plugin relies on.
    pub fn validate(&self) -> KarmaResult<()> {
        if self.highlight_char.is_empty() {
            return Err(KarmaError::Configuration(
                "highlight_char must not be empty".to_string(),
            ));
        }
        if self.channel_prefixes.is_empty() {
            return Err(KarmaError::Configuration(
                "channel_prefixes must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
