//! Upstream embedding providers.
//!
//! The cache only calls a provider on a miss. Providers do not retry; a
//! failure is surfaced to the caller as-is.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Default OpenAI-compatible endpoint (a local Ollama server).
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Generate an embedding for `input` with `model`.
    async fn embed(&self, model: &str, input: &str) -> Result<Embedding>;
}

/// Provider speaking the OpenAI `/embeddings` API.
pub struct OpenAIProvider {
    /// API key. Local servers usually need none.
    api_key: Option<String>,

    /// API base URL, without the `/embeddings` suffix.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a provider pointed at [`DEFAULT_BASE_URL`].
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Set the API key. An empty key is treated as no key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = if key.is_empty() { None } else { Some(key) };
        self
    }

    /// Set the base URL. A trailing slash is tolerated.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Full URL of the embeddings endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

impl Default for OpenAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed(&self, model: &str, input: &str) -> Result<Embedding> {
        debug!("Requesting embedding from {} with model: {model}", self.base_url);

        let body = serde_json::json!({
            "input": input,
            "model": model,
            "encoding_format": "float"
        });

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "{status}: {error_text}"
            )));
        }

        let bytes = response.bytes().await?;
        let mut result: OpenAIEmbeddingResponse = serde_json::from_slice(&bytes)
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if result.data.is_empty() {
            return Err(EmbeddingError::InvalidResponse(
                "No embedding in response".to_string(),
            ));
        }

        // Several data items are flattened into one vector in index order.
        result.data.sort_by_key(|item| item.index);
        let embedding: Embedding = result
            .data
            .into_iter()
            .flat_map(|item| item.embedding)
            .collect();

        info!("Generated embedding with {} dimensions", embedding.len());

        Ok(embedding)
    }
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}
