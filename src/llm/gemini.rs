//! Gemini REST client
//!
//! Uses `models.list` and `models.generateContent` of the
//! `generativelanguage` v1beta API.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{GenerateRequest, ModelClient, Part, normalize_model_id};
use crate::credentials::Credential;
use crate::{Error, Result};

/// Public Gemini API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API client
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
}

/// `generateContent` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
}

/// A role-tagged list of parts
#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<WirePart<'a>>,
}

/// Text or inline binary part
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart<'a> {
    Text { text: &'a str },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

/// Base64 payload with MIME type
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

/// `generateContent` response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// `models.list` response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl GeminiClient {
    /// Create a client for `base_url` (no trailing slash needed)
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one page of the model list
    async fn list_page(
        &self,
        credential: &Credential,
        page_token: Option<&str>,
    ) -> Result<ListModelsResponse> {
        let url = format!("{}/models", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .header("x-goog-api-key", credential.expose())
            .query(&[("pageSize", "1000")]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Llm(format!("list models request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("list models error {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("invalid list models response: {e}")))
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn list_models(&self, credential: &Credential) -> Result<Vec<String>> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_page(credential, page_token.as_deref()).await?;
            models.extend(
                page.models
                    .into_iter()
                    .filter(|m| {
                        m.supported_generation_methods.is_empty()
                            || m.supported_generation_methods
                                .iter()
                                .any(|method| method == "generateContent")
                    })
                    .map(|m| normalize_model_id(&m.name).to_string()),
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(count = models.len(), "listed available models");
        Ok(models)
    }

    async fn generate(&self, credential: &Credential, request: &GenerateRequest) -> Result<String> {
        let body = build_request(request);
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            normalize_model_id(&request.model)
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("generate request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("API error {status}: {body}")));
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("invalid generate response: {e}")))?;

        extract_text(result)
    }
}

/// Map a `GenerateRequest` onto the wire format
fn build_request(request: &GenerateRequest) -> GenerateContentRequest<'_> {
    let system_instruction = request.system_instruction.as_deref().map(|text| Content {
        role: None,
        parts: vec![WirePart::Text { text }],
    });

    let mut contents: Vec<Content<'_>> = request
        .history
        .iter()
        .map(|turn| Content {
            role: Some(turn.role.as_str()),
            parts: vec![WirePart::Text {
                text: &turn.content,
            }],
        })
        .collect();

    contents.push(Content {
        role: Some("user"),
        parts: request
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => WirePart::Text { text },
                Part::InlineData { mime_type, data } => WirePart::Inline {
                    inline_data: InlineData {
                        mime_type,
                        data: base64::engine::general_purpose::STANDARD.encode(data),
                    },
                },
            })
            .collect(),
    });

    GenerateContentRequest {
        system_instruction,
        contents,
    }
}

/// Join the text parts of the first candidate
fn extract_text(response: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(Error::Llm(format!("prompt blocked: {reason}")));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(Error::Llm("no candidates in response".to_string()));
    };

    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::Llm(format!(
            "empty response (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}
