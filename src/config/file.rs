//! TOML configuration file loading
//!
//! Supports `~/.config/smartbot/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::persona::Persona;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SmartbotConfigFile {
    /// Default persona name (e.g. "Pirate")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,

    /// API credentials, a single key or a list tried in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_keys: Option<ApiKeysFileConfig>,

    /// Remote model configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Knowledge store configuration
    #[serde(default)]
    pub knowledge: KnowledgeFileConfig,

    /// Log output configuration
    #[serde(default)]
    pub logging: LoggingFileConfig,

    /// Extra personas appended to the built-in ones
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub personas: Vec<Persona>,
}

/// `api_keys = "key"` or `api_keys = ["key1", "key2"]`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ApiKeysFileConfig {
    One(String),
    Many(Vec<String>),
}

impl ApiKeysFileConfig {
    /// Keys in configured order
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(key) => vec![key],
            Self::Many(keys) => keys,
        }
    }
}

/// Remote model configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LlmFileConfig {
    /// Fallback model identifier (e.g. "gemini-flash-latest")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Substrings tried in order against the live model list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_priority: Option<Vec<String>>,

    /// API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

/// Knowledge store configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct KnowledgeFileConfig {
    /// Path to the knowledge JSON file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Log output configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingFileConfig {
    /// File receiving debug-level logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Load the TOML config file from `SMARTBOT_CONFIG` or the standard path
///
/// Returns `SmartbotConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> SmartbotConfigFile {
    config_file_path().map_or_else(SmartbotConfigFile::default, |path| load_config_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Returns `SmartbotConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_from(path: &Path) -> SmartbotConfigFile {
    if !path.exists() {
        return SmartbotConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                SmartbotConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            SmartbotConfigFile::default()
        }
    }
}

/// Serialize and write a config file, creating parent directories
///
/// # Errors
///
/// Returns error if serialization or the write fails
pub fn write_config_file(path: &Path, config: &SmartbotConfigFile) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| crate::Error::Config(format!("failed to serialize config: {e}")))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Return the config file path: `SMARTBOT_CONFIG` or `~/.config/smartbot/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SMARTBOT_CONFIG") {
        return Some(PathBuf::from(path));
    }

    directories::BaseDirs::new().map(|d| d.config_dir().join("smartbot").join("config.toml"))
}
