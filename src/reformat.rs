//! Cosmetic HTML rewrite of answers
//!
//! Best-effort: any failure returns the input unchanged so the answer is
//! always delivered.

use std::sync::Arc;

use crate::credentials::CredentialRing;
use crate::llm::{GenerateRequest, ModelClient};
use crate::prompt;

/// Rewrites Markdown answers into a small HTML subset via the model
pub struct Reformatter {
    client: Arc<dyn ModelClient>,
    credentials: Arc<CredentialRing>,
    default_model: String,
}

impl Reformatter {
    /// Create a reformatter
    #[must_use]
    pub fn new(
        client: Arc<dyn ModelClient>,
        credentials: Arc<CredentialRing>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            credentials,
            default_model: default_model.into(),
        }
    }

    /// Rewrite `text` as HTML
    ///
    /// Uses `model` when given (normally the one the last answer came from),
    /// else the default. Returns `text` unchanged when no credential works.
    pub async fn reformat(&self, text: &str, model: Option<&str>) -> String {
        if !self.credentials.has_usable() {
            return text.to_string();
        }

        let model = model.unwrap_or(&self.default_model);
        let request = GenerateRequest::oneshot(model, prompt::reformat_prompt(text));

        for credential in self.credentials.usable() {
            match self.client.generate(credential, &request).await {
                Ok(html) if !html.trim().is_empty() => {
                    tracing::debug!(credential = credential.slot(), model = %model, "reformatted answer");
                    return prompt::strip_code_fences(&html);
                }
                Ok(_) => {
                    tracing::debug!(credential = credential.slot(), "empty reformat response");
                }
                Err(e) => {
                    tracing::debug!(credential = credential.slot(), error = %e, "reformat failed");
                }
            }
        }

        tracing::warn!("reformatting failed with every credential, using plain text");
        text.to_string()
    }
}
