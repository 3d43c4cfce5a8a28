//! Interactive first-run setup wizard (`smartbot setup`)

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};

use crate::config::file::{
    ApiKeysFileConfig, KnowledgeFileConfig, LlmFileConfig, SmartbotConfigFile,
};
use crate::credentials::PLACEHOLDER_MARKER;
use crate::llm::DEFAULT_MODEL;
use crate::persona::PersonaRegistry;

/// Run the interactive setup wizard
///
/// # Errors
///
/// Returns error if user input fails or config cannot be written
pub fn run_setup() -> anyhow::Result<()> {
    println!("Smartbot Setup\n");

    // Load existing config if present
    let existing = crate::config::file::load_config_file();
    let config_path = crate::config::file::config_file_path()
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    if config_path.exists() {
        println!("Existing config found at {}\n", config_path.display());
    }

    // 1. Persona selection
    let registry = PersonaRegistry::with_extra(existing.personas.iter().cloned())?;
    let persona_labels: Vec<&str> = registry.names().collect();
    let default_persona = existing
        .persona
        .as_deref()
        .and_then(|p| {
            persona_labels
                .iter()
                .position(|l| l.eq_ignore_ascii_case(p))
        })
        .unwrap_or(0);

    let persona_idx = Select::new()
        .with_prompt("Select a default persona")
        .items(&persona_labels)
        .default(default_persona)
        .interact()?;
    let persona = persona_labels[persona_idx].to_string();

    // 2. API keys, tried in the order given
    let existing_keys = existing
        .api_keys
        .clone()
        .map(ApiKeysFileConfig::into_vec)
        .unwrap_or_default();
    let masked: Vec<String> = existing_keys
        .iter()
        .map(String::as_str)
        .map(mask_key)
        .collect();

    let prompt = if masked.is_empty() {
        "Gemini API keys, comma-separated (GEMINI_API_KEY)".to_string()
    } else {
        format!(
            "Gemini API keys, comma-separated (current: {}, leave blank to keep)",
            masked.join(", ")
        )
    };

    let keys_input: String = Input::new()
        .with_prompt(&prompt)
        .allow_empty(true)
        .interact_text()?;

    let keys: Vec<String> = if keys_input.trim().is_empty() {
        existing_keys
    } else {
        keys_input
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    };

    if keys.iter().all(|k| k.contains(PLACEHOLDER_MARKER)) {
        println!("No usable API key; only learned answers will be available.");
    }

    let api_keys = match keys.len() {
        0 => None,
        1 => keys.into_iter().next().map(ApiKeysFileConfig::One),
        _ => Some(ApiKeysFileConfig::Many(keys)),
    };

    // 3. Fallback model
    let default_model = existing.llm.model.as_deref().unwrap_or(DEFAULT_MODEL);
    let model: String = Input::new()
        .with_prompt("Fallback model")
        .default(default_model.to_string())
        .interact_text()?;

    // 4. Knowledge file
    let default_knowledge = existing.knowledge.path.clone().unwrap_or_else(|| {
        crate::config::default_knowledge_path()
            .display()
            .to_string()
    });
    let knowledge_path: String = Input::new()
        .with_prompt("Knowledge file")
        .default(default_knowledge)
        .interact_text()?;

    // 5. Build and write config
    let config_file = SmartbotConfigFile {
        persona: Some(persona),
        api_keys,
        llm: LlmFileConfig {
            model: Some(model),
            ..existing.llm
        },
        knowledge: KnowledgeFileConfig {
            path: Some(knowledge_path),
        },
        logging: existing.logging,
        personas: existing.personas,
    };

    if config_path.exists() {
        let overwrite = Confirm::new()
            .with_prompt("Overwrite the existing config?")
            .default(true)
            .interact()?;
        if !overwrite {
            println!("\nSetup cancelled, config left unchanged.");
            return Ok(());
        }
    }

    crate::config::file::write_config_file(&config_path, &config_file)?;
    println!("\nConfig written to {}", config_path.display());
    println!("\nSetup complete! Run `smartbot` to start chatting.");

    Ok(())
}

/// Show only the ends of a key
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}
