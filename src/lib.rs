//! Smartbot - a learning chat bot in front of the Gemini API
//!
//! Answers come from a local knowledge store of learned responses when the
//! input matches exactly; everything else goes to a hosted model with a
//! persona, the conversation history and an optional attachment.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                       │
//! │        Console (chat)   │   One-shot CLI (ask)      │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                     ChatBot                         │
//! │  ResponseResolver │ KnowledgeStore │ Reformatter    │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │        ChatDispatcher (credential fallback)         │
//! │        ModelClient  →  Gemini REST API              │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod attachments;
pub mod bot;
pub mod config;
pub mod console;
pub mod credentials;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod persona;
pub mod prompt;
pub mod reformat;
pub mod resolver;
pub mod session;
pub mod setup;

pub use attachments::Attachment;
pub use bot::{ChatBot, Reply};
pub use config::Config;
pub use console::Console;
pub use credentials::{Credential, CredentialRing};
pub use error::{Error, Result};
pub use knowledge::KnowledgeStore;
pub use llm::{ChatDispatcher, GeminiClient, ModelClient};
pub use persona::{Persona, PersonaRegistry};
pub use reformat::Reformatter;
pub use resolver::{AnswerSource, Resolution, ResponseResolver};
pub use session::Session;
