//! Chat bot facade tying the pipeline together
//!
//! Holds the state shared by all sessions (knowledge, personas, credentials,
//! model client). Per-conversation state lives in `Session`.

use std::sync::Arc;

use crate::attachments::Attachment;
use crate::config::Config;
use crate::credentials::CredentialRing;
use crate::knowledge::KnowledgeStore;
use crate::llm::{ChatDispatcher, GeminiClient, ModelClient, ModelSelection};
use crate::persona::PersonaRegistry;
use crate::reformat::Reformatter;
use crate::resolver::{Resolution, ResponseResolver};
use crate::session::Session;
use crate::Result;

/// Shown when nothing knows the answer
pub const UNKNOWN_REPLY: &str = "I'm sorry, I don't know the answer to that yet.";

/// Final answer of the full pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// How the input was resolved
    pub resolution: Resolution,
    /// Presentation markup for display
    pub html: String,
}

/// Learning chat bot
pub struct ChatBot {
    knowledge: KnowledgeStore,
    personas: PersonaRegistry,
    dispatcher: ChatDispatcher,
    reformatter: Reformatter,
    default_persona: Option<String>,
}

impl ChatBot {
    /// Assemble a bot from its parts
    #[must_use]
    pub fn new(
        knowledge: KnowledgeStore,
        personas: PersonaRegistry,
        client: Arc<dyn ModelClient>,
        credentials: CredentialRing,
        models: ModelSelection,
    ) -> Self {
        let credentials = Arc::new(credentials);
        let reformatter = Reformatter::new(
            Arc::clone(&client),
            Arc::clone(&credentials),
            models.default_model.clone(),
        );
        let dispatcher = ChatDispatcher::new(client, credentials, models);

        Self {
            knowledge,
            personas,
            dispatcher,
            reformatter,
            default_persona: None,
        }
    }

    /// Build a bot talking to the Gemini API as configured
    ///
    /// # Errors
    ///
    /// Returns error if the persona registry or HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let personas = config.persona_registry()?;
        let client = GeminiClient::new(&config.api_base_url, config.request_timeout)?;
        let credentials = CredentialRing::new(config.api_keys.iter().cloned());
        if !credentials.has_usable() {
            tracing::warn!("no API credentials configured, remote answers are disabled");
        }

        let knowledge = KnowledgeStore::open(&config.knowledge_path);

        tracing::info!(
            personas = personas.len(),
            credentials = credentials.len(),
            knowledge = %config.knowledge_path.display(),
            "chat bot initialized"
        );

        Ok(Self::new(
            knowledge,
            personas,
            Arc::new(client),
            credentials,
            config.models.clone(),
        )
        .with_default_persona(config.default_persona.clone()))
    }

    /// Persona used by new sessions
    #[must_use]
    pub fn with_default_persona(mut self, name: Option<String>) -> Self {
        self.default_persona = name;
        self
    }

    /// Start a new session with the default persona
    ///
    /// An unknown configured persona is logged and the registry default is used.
    #[must_use]
    pub fn new_session(&self) -> Session {
        let mut session = Session::new(&self.personas);
        if let Some(name) = &self.default_persona
            && let Err(e) = session.set_persona(&self.personas, name)
        {
            tracing::warn!(error = %e, "configured persona unavailable, using default");
        }
        session
    }

    /// Known personas
    #[must_use]
    pub const fn personas(&self) -> &PersonaRegistry {
        &self.personas
    }

    /// Learned responses
    #[must_use]
    pub const fn knowledge(&self) -> &KnowledgeStore {
        &self.knowledge
    }

    /// Remote dispatcher
    #[must_use]
    pub const fn dispatcher(&self) -> &ChatDispatcher {
        &self.dispatcher
    }

    /// Resolve one input; see `ResponseResolver::resolve`
    pub async fn resolve(
        &self,
        session: &mut Session,
        input: &str,
        attachment: Option<Attachment>,
    ) -> Resolution {
        ResponseResolver::new(&self.knowledge, &self.dispatcher)
            .resolve(session, input, attachment)
            .await
    }

    /// Rewrite an answer as HTML using the session's last model
    pub async fn reformat(&self, session: &Session, text: &str) -> String {
        self.reformatter.reformat(text, session.active_model()).await
    }

    /// Resolve then reformat; unknown inputs get `UNKNOWN_REPLY`
    pub async fn respond(
        &self,
        session: &mut Session,
        input: &str,
        attachment: Option<Attachment>,
    ) -> Reply {
        let resolution = self.resolve(session, input, attachment).await;
        let text = resolution.text().unwrap_or(UNKNOWN_REPLY).to_string();
        let html = self.reformat(session, &text).await;
        Reply { resolution, html }
    }

    /// Learn a new answer; persistence is best-effort
    pub fn teach(&mut self, utterance: &str, answer: impl Into<String>) {
        self.knowledge.teach(utterance, answer);
    }
}
