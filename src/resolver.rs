//! Response resolution: local knowledge, then the remote model
//!
//! 1. Empty input without attachment answers with a placeholder.
//! 2. Text-only input matching a known utterance answers locally.
//! 3. Everything else goes to the remote model.
//! 4. If the remote call fails, text-only input is reported as unknown so
//!    the caller can offer to learn an answer; input with an attachment
//!    gets an apology.

use crate::attachments::Attachment;
use crate::knowledge::{KnowledgeStore, normalize};
use crate::llm::{ChatDispatcher, ChatRequest};
use crate::session::Session;
use crate::Result;

/// Answer for empty input
pub const EMPTY_INPUT_REPLY: &str = "...";

/// Answer when the remote call fails for input with an attachment
pub const ATTACHMENT_FAILURE_REPLY: &str = "I'm sorry, I couldn't process the attachment.";

/// Answer when resolution fails unexpectedly
pub const INTERNAL_ERROR_REPLY: &str = "Oops! Something went wrong internally.";

/// Where an answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    /// Placeholder for empty input
    Placeholder,
    /// Local knowledge store
    Knowledge,
    /// Remote model
    Remote,
    /// Fixed fallback text after a failure
    Fallback,
}

/// Outcome of resolving one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An answer is available
    Answered { text: String, source: AnswerSource },
    /// Nothing knew the answer; the caller may teach one
    Unknown,
}

impl Resolution {
    fn answered(text: impl Into<String>, source: AnswerSource) -> Self {
        Self::Answered {
            text: text.into(),
            source,
        }
    }

    /// Answer text, `None` when unknown
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Answered { text, .. } => Some(text),
            Self::Unknown => None,
        }
    }

    /// Whether an answer is available
    #[must_use]
    pub const fn is_answered(&self) -> bool {
        matches!(self, Self::Answered { .. })
    }
}

/// Resolves inputs against the knowledge store and the remote model
pub struct ResponseResolver<'a> {
    knowledge: &'a KnowledgeStore,
    dispatcher: &'a ChatDispatcher,
}

impl<'a> ResponseResolver<'a> {
    /// Create a resolver over shared components
    #[must_use]
    pub const fn new(knowledge: &'a KnowledgeStore, dispatcher: &'a ChatDispatcher) -> Self {
        Self {
            knowledge,
            dispatcher,
        }
    }

    /// Resolve `input` with an optional attachment
    ///
    /// Never fails: internal errors are logged and answered with
    /// `INTERNAL_ERROR_REPLY`. The attachment is consumed by the call.
    pub async fn resolve(
        &self,
        session: &mut Session,
        input: &str,
        attachment: Option<Attachment>,
    ) -> Resolution {
        match self.try_resolve(session, input, attachment.as_ref()).await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::error!(input = %input, error = ?e, "error processing input");
                Resolution::answered(INTERNAL_ERROR_REPLY, AnswerSource::Fallback)
            }
        }
    }

    async fn try_resolve(
        &self,
        session: &mut Session,
        input: &str,
        attachment: Option<&Attachment>,
    ) -> Result<Resolution> {
        if input.is_empty() && attachment.is_none() {
            return Ok(Resolution::answered(
                EMPTY_INPUT_REPLY,
                AnswerSource::Placeholder,
            ));
        }

        let utterance = normalize(input);
        tracing::debug!(utterance = %utterance, has_attachment = attachment.is_some(), "processing input");

        if attachment.is_none()
            && let Some(answer) = self.knowledge.random_answer(&utterance)
        {
            tracing::info!(utterance = %utterance, "local match found");
            return Ok(Resolution::answered(answer, AnswerSource::Knowledge));
        }

        tracing::info!("no local match (or attachment present), calling remote model");
        let request = ChatRequest {
            prompt: input,
            persona: session.persona(),
            history: session.history(),
            attachment,
        };

        if let Some(reply) = self.dispatcher.send(request).await? {
            session.record_exchange(input, reply.text.clone());
            session.set_active_model(reply.model);
            return Ok(Resolution::answered(reply.text, AnswerSource::Remote));
        }

        if attachment.is_some() {
            Ok(Resolution::answered(
                ATTACHMENT_FAILURE_REPLY,
                AnswerSource::Fallback,
            ))
        } else {
            tracing::info!(utterance = %utterance, "no answer from knowledge or remote model");
            Ok(Resolution::Unknown)
        }
    }
}
