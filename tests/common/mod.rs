//! Shared test utilities
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use smartbot::llm::{GenerateRequest, ModelSelection};
use smartbot::{
    ChatBot, Credential, CredentialRing, Error, KnowledgeStore, ModelClient, PersonaRegistry,
};

/// Scripted model API keyed by credential token
///
/// Tokens with a reply succeed, every other token fails. Requests without a
/// system instruction are treated as reformat calls.
#[derive(Default)]
pub struct ScriptedClient {
    models: Vec<String>,
    replies: HashMap<String, String>,
    reformat_reply: Option<String>,
    list_calls: Mutex<Vec<String>>,
    requests: Mutex<Vec<(String, GenerateRequest)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            models: vec![
                "models/gemini-flash-latest".to_string(),
                "models/gemini-1.5-pro".to_string(),
            ],
            ..Self::default()
        }
    }

    /// Replace the advertised model list
    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = models.iter().map(|m| (*m).to_string()).collect();
        self
    }

    /// Chat requests with `token` succeed with `reply`
    pub fn replying(mut self, token: &str, reply: &str) -> Self {
        self.replies.insert(token.to_string(), reply.to_string());
        self
    }

    /// Reformat requests from working credentials return `html`
    pub fn reformatting(mut self, html: &str) -> Self {
        self.reformat_reply = Some(html.to_string());
        self
    }

    /// Tokens that listed models, in call order
    pub fn list_calls(&self) -> Vec<String> {
        self.list_calls.lock().unwrap().clone()
    }

    /// Every generate request with the token it was sent with
    pub fn requests(&self) -> Vec<(String, GenerateRequest)> {
        self.requests.lock().unwrap().clone()
    }

    /// Chat (non-reformat) requests only
    pub fn chat_requests(&self) -> Vec<(String, GenerateRequest)> {
        self.requests()
            .into_iter()
            .filter(|(_, r)| r.system_instruction.is_some())
            .collect()
    }

    /// Reformat requests only
    pub fn reformat_requests(&self) -> Vec<(String, GenerateRequest)> {
        self.requests()
            .into_iter()
            .filter(|(_, r)| r.system_instruction.is_none())
            .collect()
    }

    /// Total remote calls of any kind
    pub fn total_calls(&self) -> usize {
        self.list_calls().len() + self.requests().len()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn list_models(&self, credential: &Credential) -> smartbot::Result<Vec<String>> {
        let token = credential.expose().to_string();
        self.list_calls.lock().unwrap().push(token.clone());
        if self.replies.contains_key(&token) {
            Ok(self.models.clone())
        } else {
            Err(Error::Llm(format!("invalid credential {}", credential.slot())))
        }
    }

    async fn generate(
        &self,
        credential: &Credential,
        request: &GenerateRequest,
    ) -> smartbot::Result<String> {
        let token = credential.expose().to_string();
        self.requests
            .lock()
            .unwrap()
            .push((token.clone(), request.clone()));

        let Some(reply) = self.replies.get(&token) else {
            return Err(Error::Llm("permission denied".to_string()));
        };

        if request.system_instruction.is_some() {
            Ok(reply.clone())
        } else {
            self.reformat_reply
                .clone()
                .ok_or_else(|| Error::Llm("reformat unavailable".to_string()))
        }
    }
}

/// Knowledge store with the given entries and no backing file
pub fn knowledge(entries: &[(&str, &[&str])]) -> KnowledgeStore {
    KnowledgeStore::in_memory(
        entries
            .iter()
            .map(|(k, answers)| (*k, answers.to_vec())),
    )
}

/// Bot over a scripted client with default model selection
pub fn bot(client: &Arc<ScriptedClient>, keys: &[&str], knowledge: KnowledgeStore) -> ChatBot {
    bot_with_models(client, keys, knowledge, ModelSelection::default())
}

/// Bot over a scripted client with explicit model selection
pub fn bot_with_models(
    client: &Arc<ScriptedClient>,
    keys: &[&str],
    knowledge: KnowledgeStore,
    models: ModelSelection,
) -> ChatBot {
    let client: Arc<dyn ModelClient> = client.clone();
    ChatBot::new(
        knowledge,
        PersonaRegistry::builtin(),
        client,
        CredentialRing::new(keys.iter().copied()),
        models,
    )
}
