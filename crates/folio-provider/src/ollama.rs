//! Local Ollama `/api/generate` backend
//!
//! https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-completion

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::{GenerationBackend, GenerationError};

pub const DEFAULT_OLLAMA_BASE: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "gemma2";

/// Joins the compiled context and the visitor's question into the single
/// prompt string the generate endpoint expects.
pub fn build_prompt(context: &str, user_message: &str) -> String {
    format!(
        "{context}\n\nUser question: {user_message}\n\nProvide a helpful, concise response (2-3 sentences max):"
    )
}

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// No request timeout: a stalled server keeps the caller waiting.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    /// Keeps the existing client, and logs, if one with a timeout cannot be built.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => self.client = client,
            Err(e) => tracing::warn!(
                ?timeout,
                "could not build HTTP client with timeout, requests will not time out: {e}"
            ),
        }
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate_endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    pub(crate) fn build_request(&self, context: &str, user_message: &str) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: build_prompt(context, user_message),
            stream: false,
        }
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_BASE, DEFAULT_OLLAMA_MODEL)
    }
}

#[async_trait]
impl GenerationBackend for OllamaProvider {
    async fn generate(&self, context: &str, user_message: &str) -> Result<String, GenerationError> {
        let endpoint = self.generate_endpoint();
        let payload = self.build_request(context, user_message);
        tracing::debug!(
            model = %self.model,
            prompt_chars = payload.prompt.len(),
            "sending generate request"
        );

        let resp = match self
            .client
            .post(&endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Err(GenerationError::Timeout { endpoint }),
            Err(e) if e.is_connect() => {
                return Err(GenerationError::Connect {
                    endpoint,
                    source: e,
                })
            }
            Err(e) => return Err(e.into()),
        };

        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => return Err(GenerationError::Timeout { endpoint }),
            Err(e) => return Err(e.into()),
        };
        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_generate_response(&body)
    }

    async fn health(&self) -> Result<()> {
        let endpoint = format!("{}/api/tags", self.base_url);
        let resp = self
            .client
            .get(&endpoint)
            .timeout(Duration::from_secs(2))
            .send()
            .await?
            .error_for_status()?;
        let tags: TagsResponse = resp.json().await?;
        let installed = tags
            .models
            .iter()
            .any(|m| m.name == self.model || m.name.starts_with(&format!("{}:", self.model)));
        if installed {
            Ok(())
        } else {
            Err(anyhow!(
                "model '{}' is not installed on {} (try `ollama pull {}`)",
                self.model,
                self.base_url,
                self.model
            ))
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// The generated text is handed back untouched: no trimming, no truncation.
fn parse_generate_response(body: &str) -> Result<String, GenerationError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
    Ok(parsed.response)
}

// ============================================================
// Wire Types
// ============================================================

#[derive(Debug, Clone, Serialize)]
pub(crate) struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Clone, Deserialize)]
struct TagModel {
    name: String,
}
