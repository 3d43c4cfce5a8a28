//! Credential fallback around the model client
//!
//! Each usable credential gets one attempt: list models, resolve the best
//! one, generate. The first success wins; every failure is logged and the
//! next credential is tried.

use std::sync::Arc;

use chrono::Local;

use super::{
    DEFAULT_MODEL, DEFAULT_MODEL_PRIORITY, GenerateRequest, ModelClient, Part, Turn, resolve_model,
};
use crate::attachments::Attachment;
use crate::credentials::{Credential, CredentialRing};
use crate::persona::Persona;
use crate::prompt;
use crate::{Error, Result};

/// Model priority list plus the fallback identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub priority: Vec<String>,
    pub default_model: String,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            priority: DEFAULT_MODEL_PRIORITY.iter().map(ToString::to_string).collect(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// One conversational turn to send
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub prompt: &'a str,
    pub persona: &'a Persona,
    pub history: &'a [Turn],
    pub attachment: Option<&'a Attachment>,
}

/// Successful remote answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReply {
    pub text: String,
    /// Model that produced the answer
    pub model: String,
    /// Slot of the credential that worked
    pub credential: usize,
}

/// Sends requests through the credential ring
pub struct ChatDispatcher {
    client: Arc<dyn ModelClient>,
    credentials: Arc<CredentialRing>,
    models: ModelSelection,
}

impl ChatDispatcher {
    /// Create a dispatcher
    #[must_use]
    pub fn new(
        client: Arc<dyn ModelClient>,
        credentials: Arc<CredentialRing>,
        models: ModelSelection,
    ) -> Self {
        Self {
            client,
            credentials,
            models,
        }
    }

    /// Shared model client
    #[must_use]
    pub fn client(&self) -> &Arc<dyn ModelClient> {
        &self.client
    }

    /// Shared credential ring
    #[must_use]
    pub fn credentials(&self) -> &Arc<CredentialRing> {
        &self.credentials
    }

    /// Model selection policy
    #[must_use]
    pub const fn models(&self) -> &ModelSelection {
        &self.models
    }

    /// Send a turn, falling back across credentials
    ///
    /// Returns `Ok(None)` when every credential failed or none is configured.
    ///
    /// # Errors
    ///
    /// Returns error only for misconfiguration that no credential can fix
    pub async fn send(&self, request: ChatRequest<'_>) -> Result<Option<RemoteReply>> {
        if self.models.default_model.trim().is_empty() {
            return Err(Error::Config("no default model configured".to_string()));
        }

        if !self.credentials.has_usable() {
            tracing::warn!("no API credentials configured");
            return Ok(None);
        }

        let system_instruction = prompt::system_instruction(request.persona, &Local::now());
        let decorated = prompt::decorate_prompt(request.prompt);
        let parts = match request.attachment {
            Some(attachment) => attachment.message_parts(&decorated),
            None => vec![Part::Text(decorated)],
        };

        for credential in self.credentials.usable() {
            tracing::info!(credential = credential.slot(), "attempting API credential");
            match self
                .attempt(credential, &system_instruction, request.history, &parts)
                .await
            {
                Ok(reply) => {
                    tracing::info!(
                        credential = credential.slot(),
                        model = %reply.model,
                        "remote call succeeded"
                    );
                    return Ok(Some(reply));
                }
                Err(e) => {
                    tracing::warn!(
                        credential = credential.slot(),
                        error = %e,
                        "API credential failed, trying next"
                    );
                }
            }
        }

        tracing::error!("all API credentials failed");
        Ok(None)
    }

    /// Resolve the model to use with `credential` from its live model list
    ///
    /// # Errors
    ///
    /// Returns error if the model list cannot be fetched
    pub async fn resolve_model(&self, credential: &Credential) -> Result<String> {
        let available = self.client.list_models(credential).await?;
        let model = resolve_model(&available, &self.models.priority, &self.models.default_model);
        tracing::debug!(model = %model, available = available.len(), "resolved model");
        Ok(model)
    }

    async fn attempt(
        &self,
        credential: &Credential,
        system_instruction: &str,
        history: &[Turn],
        parts: &[Part],
    ) -> Result<RemoteReply> {
        let model = self.resolve_model(credential).await?;
        let request = GenerateRequest {
            model: model.clone(),
            system_instruction: Some(system_instruction.to_string()),
            history: history.to_vec(),
            parts: parts.to_vec(),
        };

        let text = self.client.generate(credential, &request).await?;
        if text.trim().is_empty() {
            return Err(Error::Llm("empty response".to_string()));
        }

        Ok(RemoteReply {
            text,
            model,
            credential: credential.slot(),
        })
    }
}
