//! Per-conversation state
//!
//! A session owns its history, the selected persona and the model name the
//! last successful remote call resolved. Nothing here is shared across
//! sessions.

use crate::llm::Turn;
use crate::persona::{Persona, PersonaRegistry};
use crate::Result;

/// State of one conversation
#[derive(Debug, Clone)]
pub struct Session {
    history: Vec<Turn>,
    persona: Persona,
    active_model: Option<String>,
}

impl Session {
    /// Start a session with the registry's default persona
    #[must_use]
    pub fn new(registry: &PersonaRegistry) -> Self {
        Self::with_persona(registry.default_persona().clone())
    }

    /// Start a session with a specific persona
    #[must_use]
    pub const fn with_persona(persona: Persona) -> Self {
        Self {
            history: Vec::new(),
            persona,
            active_model: None,
        }
    }

    /// Currently selected persona
    #[must_use]
    pub const fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Switch persona by name; history is kept
    ///
    /// # Errors
    ///
    /// Returns error if the registry has no persona with that name
    pub fn set_persona(&mut self, registry: &PersonaRegistry, name: &str) -> Result<()> {
        let persona = registry.require(name)?;
        tracing::info!(persona = %persona.name, "persona set");
        self.persona = persona.clone();
        Ok(())
    }

    /// Conversation so far
    #[must_use]
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Record a successful exchange
    pub fn record_exchange(&mut self, prompt: impl Into<String>, reply: impl Into<String>) {
        self.history.push(Turn::user(prompt));
        self.history.push(Turn::model(reply));
    }

    /// Drop the most recent exchange, if any
    pub fn pop_exchange(&mut self) -> Option<(Turn, Turn)> {
        if self.history.len() < 2 {
            return None;
        }
        let reply = self.history.pop()?;
        let prompt = self.history.pop()?;
        Some((prompt, reply))
    }

    /// Start a new conversation
    pub fn clear(&mut self) {
        self.history.clear();
        tracing::info!("conversation cleared");
    }

    /// Model resolved by the last successful remote call
    #[must_use]
    pub fn active_model(&self) -> Option<&str> {
        self.active_model.as_deref()
    }

    /// Remember the model used for later calls such as reformatting
    pub fn set_active_model(&mut self, model: impl Into<String>) {
        self.active_model = Some(model.into());
    }
}
