//! Error types for smartbot

use thiserror::Error;

/// Result type alias for smartbot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving a conversation turn
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Persona not found
    #[error("persona not found: {0}")]
    PersonaNotFound(String),

    /// Knowledge store error
    #[error("knowledge error: {0}")]
    Knowledge(String),

    /// Attachment intake or decoding error
    #[error("attachment error: {0}")]
    Attachment(String),

    /// Remote model API error
    #[error("llm error: {0}")]
    Llm(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
