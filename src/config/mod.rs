//! Configuration management for smartbot
//!
//! Precedence per field: environment > TOML file > default. Command-line
//! flags are applied on top by the binary.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::llm::{DEFAULT_API_BASE_URL, ModelSelection};
use crate::persona::{Persona, PersonaRegistry};
use crate::Result;

use file::SmartbotConfigFile;

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API credentials in fallback order, placeholders included
    pub api_keys: Vec<String>,

    /// Remote API base URL
    pub api_base_url: String,

    /// Model priority and fallback
    pub models: ModelSelection,

    /// Persona selected for new sessions, `None` for the registry default
    pub default_persona: Option<String>,

    /// Extra personas appended to the built-in registry
    pub personas: Vec<Persona>,

    /// Knowledge store file
    pub knowledge_path: PathBuf,

    /// Optional file receiving debug-level logs
    pub log_file: Option<PathBuf>,

    /// Per-request timeout for remote calls
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(SmartbotConfigFile::default(), |_| None)
    }
}

impl Config {
    /// Load from the config file and process environment
    #[must_use]
    pub fn load() -> Self {
        Self::resolve(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an env lookup
    #[must_use]
    pub fn resolve(fc: SmartbotConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        // Hosted secrets arrive as env vars; the file is the local fallback
        let api_keys = env("SMARTBOT_API_KEYS")
            .map(|s| split_list(&s))
            .filter(|keys| !keys.is_empty())
            .or_else(|| env("GEMINI_API_KEY").map(|k| vec![k.trim().to_string()]))
            .or_else(|| fc.api_keys.map(file::ApiKeysFileConfig::into_vec))
            .unwrap_or_default();

        let api_base_url = env("SMARTBOT_API_BASE_URL")
            .or(fc.llm.api_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let defaults = ModelSelection::default();
        let models = ModelSelection {
            priority: env("SMARTBOT_MODEL_PRIORITY")
                .map(|s| split_list(&s))
                .or(fc.llm.model_priority)
                .unwrap_or(defaults.priority),
            default_model: env("SMARTBOT_MODEL")
                .or(fc.llm.model)
                .unwrap_or(defaults.default_model),
        };

        let default_persona = env("SMARTBOT_PERSONA")
            .or(fc.persona)
            .filter(|p| !p.trim().is_empty());

        let knowledge_path = env("SMARTBOT_KNOWLEDGE")
            .or(fc.knowledge.path)
            .map_or_else(default_knowledge_path, PathBuf::from);

        let log_file = env("SMARTBOT_LOG_FILE")
            .or(fc.logging.file)
            .map(PathBuf::from);

        let request_timeout = env("SMARTBOT_REQUEST_TIMEOUT")
            .and_then(|s| s.parse().ok())
            .or(fc.llm.request_timeout_secs)
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs);

        Self {
            api_keys,
            api_base_url,
            models,
            default_persona,
            personas: fc.personas,
            knowledge_path,
            log_file,
            request_timeout,
        }
    }

    /// Build the persona registry: built-ins plus configured extras
    ///
    /// # Errors
    ///
    /// Returns error if a configured persona is malformed
    pub fn persona_registry(&self) -> Result<PersonaRegistry> {
        PersonaRegistry::with_extra(self.personas.iter().cloned())
    }
}

/// Default knowledge file: `~/.local/share/smartbot/knowledge.json` on Linux
#[must_use]
pub fn default_knowledge_path() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from("knowledge.json"),
        |d| d.data_dir().join("smartbot").join("knowledge.json"),
    )
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::llm::DEFAULT_MODEL;
    use file::{ApiKeysFileConfig, LlmFileConfig};

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_any_source() {
        let config = Config::default();
        assert!(config.api_keys.is_empty());
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.models.default_model, DEFAULT_MODEL);
        assert!(config.default_persona.is_none());
        assert!(config.knowledge_path.ends_with("knowledge.json"));
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn env_keys_beat_file_keys() {
        let fc = SmartbotConfigFile {
            api_keys: Some(ApiKeysFileConfig::One("file-key".to_string())),
            ..SmartbotConfigFile::default()
        };
        let config = Config::resolve(fc, env_from(&[("SMARTBOT_API_KEYS", "a, b ,,c")]));
        assert_eq!(config.api_keys, ["a", "b", "c"]);
    }

    #[test]
    fn file_keys_used_without_env() {
        let fc = SmartbotConfigFile {
            api_keys: Some(ApiKeysFileConfig::Many(vec![
                "YOUR_API_KEY".to_string(),
                "real".to_string(),
            ])),
            ..SmartbotConfigFile::default()
        };
        let config = Config::resolve(fc, |_| None);
        assert_eq!(config.api_keys, ["YOUR_API_KEY", "real"]);
    }

    #[test]
    fn single_gemini_key_from_env() {
        let config = Config::resolve(
            SmartbotConfigFile::default(),
            env_from(&[("GEMINI_API_KEY", " g-key ")]),
        );
        assert_eq!(config.api_keys, ["g-key"]);
    }

    #[test]
    fn model_settings_layer() {
        let fc = SmartbotConfigFile {
            llm: LlmFileConfig {
                model: Some("file-model".to_string()),
                model_priority: Some(vec!["pro".to_string()]),
                request_timeout_secs: Some(30),
                ..LlmFileConfig::default()
            },
            ..SmartbotConfigFile::default()
        };
        let config = Config::resolve(fc, env_from(&[("SMARTBOT_MODEL", "env-model")]));
        assert_eq!(config.models.default_model, "env-model");
        assert_eq!(config.models.priority, ["pro"]);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn registry_includes_configured_personas() {
        let fc = SmartbotConfigFile {
            persona: Some("Poet".to_string()),
            personas: vec![Persona::new("Poet", "Answer in rhyme.")],
            ..SmartbotConfigFile::default()
        };
        let config = Config::resolve(fc, |_| None);
        let registry = config.persona_registry().unwrap();
        assert!(registry.get("poet").is_some());
        assert_eq!(config.default_persona.as_deref(), Some("Poet"));
    }
}
