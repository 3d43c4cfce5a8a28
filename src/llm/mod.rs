//! Remote model API boundary
//!
//! `ModelClient` is the seam between the resolution pipeline and the hosted
//! model. `GeminiClient` talks to the Gemini REST API; tests substitute a
//! scripted client.

mod dispatch;
mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::credentials::Credential;

pub use dispatch::{ChatDispatcher, ChatRequest, ModelSelection, RemoteReply};
pub use gemini::{DEFAULT_API_BASE_URL, GeminiClient};

/// Model identifier used when nothing in the priority list is available
pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

/// Substrings tried in order against the live model list
pub const DEFAULT_MODEL_PRIORITY: &[&str] = &[
    "gemini-flash-latest",
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
];

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Wire name of the role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// One entry of conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// A user turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// A model turn
    #[must_use]
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

/// Part of the new message sent to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Plain text
    Text(String),
    /// Opaque binary payload such as an image
    InlineData { mime_type: String, data: Vec<u8> },
}

/// A single generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Resolved model identifier
    pub model: String,

    /// System instruction, if any
    pub system_instruction: Option<String>,

    /// Prior conversation
    pub history: Vec<Turn>,

    /// Parts of the new user message
    pub parts: Vec<Part>,
}

impl GenerateRequest {
    /// A one-shot text request without history or system instruction
    #[must_use]
    pub fn oneshot(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_instruction: None,
            history: Vec::new(),
            parts: vec![Part::Text(text.into())],
        }
    }
}

/// Hosted model API
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Model identifiers currently available to `credential`
    async fn list_models(&self, credential: &Credential) -> Result<Vec<String>>;

    /// Generate a reply; empty text is reported as an error
    async fn generate(&self, credential: &Credential, request: &GenerateRequest) -> Result<String>;
}

/// Strip the `models/` resource prefix from an identifier
#[must_use]
pub fn normalize_model_id(id: &str) -> &str {
    id.strip_prefix("models/").unwrap_or(id)
}

/// Pick a model from `available` by priority substring
///
/// For each priority entry in order, the first available identifier
/// containing it wins. Falls back to `default` when nothing matches.
#[must_use]
pub fn resolve_model<S: AsRef<str>, P: AsRef<str>>(
    available: &[S],
    priority: &[P],
    default: &str,
) -> String {
    for wanted in priority {
        let wanted = wanted.as_ref();
        if let Some(found) = available
            .iter()
            .map(|id| normalize_model_id(id.as_ref()))
            .find(|id| id.contains(wanted))
        {
            return found.to_string();
        }
    }

    default.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_priority_with_any_match_wins() {
        let available = ["models/gemini-1.0-pro", "models/gemini-1.5-pro", "models/embedding-001"];
        let chosen = resolve_model(&available, &["gemini-1.5-flash", "gemini-1.5-pro"], DEFAULT_MODEL);
        assert_eq!(chosen, "gemini-1.5-pro");
    }

    #[test]
    fn priority_order_beats_list_order() {
        let available = ["gemini-1.5-pro", "gemini-1.5-flash-002"];
        let chosen = resolve_model(&available, &["flash", "pro"], DEFAULT_MODEL);
        assert_eq!(chosen, "gemini-1.5-flash-002");
    }

    #[test]
    fn falls_back_to_default() {
        let available = ["models/text-bison-001"];
        assert_eq!(
            resolve_model(&available, DEFAULT_MODEL_PRIORITY, DEFAULT_MODEL),
            DEFAULT_MODEL
        );

        let none: [&str; 0] = [];
        assert_eq!(resolve_model(&none, &["flash"], "fallback"), "fallback");
    }

    #[test]
    fn normalizes_resource_prefix() {
        assert_eq!(normalize_model_id("models/gemini-pro"), "gemini-pro");
        assert_eq!(normalize_model_id("gemini-pro"), "gemini-pro");
    }
}
