pub mod error;
pub mod ollama;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::GenerationError;
pub use ollama::{build_prompt, OllamaProvider, DEFAULT_OLLAMA_BASE, DEFAULT_OLLAMA_MODEL};

/// A text generation service that answers one question against one context.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, context: &str, user_message: &str) -> Result<String, GenerationError>;
    async fn health(&self) -> Result<()> {
        Ok(())
    }
    fn model(&self) -> &str;
}

// ============================================================
// Backend Configuration
// ============================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Ollama,
    /// Echoes the question back; for demos without a model server.
    Stub,
    /// Always fails, so every answer comes from the fallback responder.
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Unset means requests may wait forever.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_OLLAMA_BASE.to_string()
}

fn default_model() -> String {
    DEFAULT_OLLAMA_MODEL.to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: None,
        }
    }
}

impl BackendConfig {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_kind(mut self, kind: BackendKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Create a backend from configuration.
pub fn create_backend(config: &BackendConfig) -> Arc<dyn GenerationBackend> {
    let backend: Arc<dyn GenerationBackend> = match config.kind {
        BackendKind::Ollama => {
            let mut provider = OllamaProvider::new(&config.base_url, &config.model);
            if let Some(secs) = config.timeout_secs {
                provider = provider.with_timeout(Duration::from_secs(secs));
            }
            Arc::new(provider)
        }
        BackendKind::Stub => Arc::new(StubBackend::new(&config.model)),
        BackendKind::Offline => Arc::new(OfflineBackend),
    };
    tracing::info!(kind = ?config.kind, model = %backend.model(), "generation backend ready");
    backend
}

pub struct StubBackend {
    model: String,
}

impl StubBackend {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

#[async_trait]
impl GenerationBackend for StubBackend {
    async fn generate(&self, context: &str, user_message: &str) -> Result<String, GenerationError> {
        Ok(format!(
            "[stub:{}] {} (context: {} chars)",
            self.model,
            user_message,
            context.len()
        ))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

pub struct OfflineBackend;

#[async_trait]
impl GenerationBackend for OfflineBackend {
    async fn generate(&self, _context: &str, _user_message: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Offline("generation disabled by configuration".into()))
    }

    async fn health(&self) -> Result<()> {
        anyhow::bail!("generation disabled by configuration")
    }

    fn model(&self) -> &str {
        "offline"
    }
}
