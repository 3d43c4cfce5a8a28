//! Named system-prompt fragments that shape the model's tone

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A persona: a display name plus the instruction sent as system prompt
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Persona {
    /// Display name, also the selection key
    pub name: String,

    /// Instruction fragment prepended to the system prompt
    pub system_prompt: String,
}

impl Persona {
    /// Create a persona
    #[must_use]
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
        }
    }
}

/// Built-in personas, first entry is the default
const BUILTIN_PERSONAS: &[(&str, &str)] = &[
    (
        "Helpful Assistant",
        "You are a helpful and polite AI assistant.",
    ),
    (
        "Pirate",
        "You are a gruff pirate captain. Speak with pirate slang (Ahoy, Matey, Arrr).",
    ),
    (
        "Anime Character",
        "You are a cute and energetic anime character. End sentences with 'desu' or 'uwu'. Use emojis.",
    ),
    (
        "Strict Teacher",
        "You are a strict school teacher. Correct the user's grammar and lecture them.",
    ),
    (
        "Joker",
        "You are a comedian. Make a joke about everything the user says.",
    ),
    (
        "Military Soldier",
        "You are a disciplined and loud military soldier. You speak with authority. Address the user as 'Sir' or 'Ma'am'. Use military jargon like 'Affirmative', 'Negative', 'Copy that'. Be brief and concise.",
    ),
];

/// Ordered, immutable set of personas
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
}

impl PersonaRegistry {
    /// Build a registry from personas in display order
    ///
    /// Later entries replace earlier ones with the same name (case-insensitive)
    /// while keeping the original position.
    ///
    /// # Errors
    ///
    /// Returns error if no persona remains; the bot cannot run without one
    pub fn new(personas: impl IntoIterator<Item = Persona>) -> Result<Self> {
        let mut merged: Vec<Persona> = Vec::new();
        for persona in personas {
            let name = persona.name.trim();
            if name.is_empty() {
                return Err(Error::Config("persona name must not be empty".to_string()));
            }
            if let Some(existing) = merged
                .iter_mut()
                .find(|p| p.name.eq_ignore_ascii_case(name))
            {
                *existing = persona;
            } else {
                merged.push(persona);
            }
        }

        if merged.is_empty() {
            return Err(Error::Config("persona registry is empty".to_string()));
        }

        Ok(Self { personas: merged })
    }

    /// Registry containing only the built-in personas
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            personas: builtin_personas().collect(),
        }
    }

    /// Built-in personas followed by `extra`
    ///
    /// # Errors
    ///
    /// Returns error if an extra persona is malformed
    pub fn with_extra(extra: impl IntoIterator<Item = Persona>) -> Result<Self> {
        Self::new(builtin_personas().chain(extra))
    }

    /// The default persona (first entry)
    #[must_use]
    pub fn default_persona(&self) -> &Persona {
        // Construction guarantees at least one entry
        &self.personas[0]
    }

    /// Look up a persona by name, ignoring ASCII case
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Persona> {
        let name = name.trim();
        self.personas
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Look up a persona or fail with `PersonaNotFound`
    ///
    /// # Errors
    ///
    /// Returns error if no persona has that name
    pub fn require(&self, name: &str) -> Result<&Persona> {
        self.get(name)
            .ok_or_else(|| Error::PersonaNotFound(name.to_string()))
    }

    /// Personas in display order
    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    /// Persona names in display order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.personas.iter().map(|p| p.name.as_str())
    }

    /// Number of personas
    #[must_use]
    pub fn len(&self) -> usize {
        self.personas.len()
    }

    /// Always false; kept for API symmetry with `len`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_personas() -> impl Iterator<Item = Persona> {
    BUILTIN_PERSONAS
        .iter()
        .map(|(name, prompt)| Persona::new(*name, *prompt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_default_is_helpful_assistant() {
        let registry = PersonaRegistry::builtin();
        assert_eq!(registry.default_persona().name, "Helpful Assistant");
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn lookup_ignores_case() {
        let registry = PersonaRegistry::builtin();
        assert_eq!(registry.get("pirate").unwrap().name, "Pirate");
        assert!(registry.get("Ninja").is_none());
        assert!(matches!(
            registry.require("Ninja"),
            Err(Error::PersonaNotFound(_))
        ));
    }

    #[test]
    fn extra_personas_append_and_override() {
        let registry = PersonaRegistry::with_extra([
            Persona::new("Poet", "Answer in rhyme."),
            Persona::new("pirate", "Talk like a polite pirate."),
        ])
        .unwrap();

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names.len(), 7);
        assert_eq!(names[1], "pirate");
        assert_eq!(names[6], "Poet");
        assert_eq!(
            registry.get("Pirate").unwrap().system_prompt,
            "Talk like a polite pirate."
        );
    }

    #[test]
    fn empty_registry_is_rejected() {
        assert!(PersonaRegistry::new(Vec::new()).is_err());
        assert!(PersonaRegistry::new([Persona::new(" ", "x")]).is_err());
    }
}
