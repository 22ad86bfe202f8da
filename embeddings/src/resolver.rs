//! Request handling: identity, cache lookup, provider fallback, write-through.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Embedding;
use crate::cache::{StoreOutcome, VectorStore};
use crate::error::{EmbeddingError, Result};
use crate::hash::ContentHash;
use crate::provider::EmbeddingProvider;
use crate::registry::ModelRegistry;

/// Default bound on a single provider call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Inbound request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Model name, passed through to the provider verbatim.
    #[serde(default)]
    pub model: String,

    /// Text to embed, hashed exactly as given.
    #[serde(default)]
    pub input: String,
}

impl EmbeddingRequest {
    /// Create a new embedding request.
    pub fn new(model: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(EmbeddingError::InvalidRequest(
                "model must not be empty".to_string(),
            ));
        }
        if self.input.is_empty() {
            return Err(EmbeddingError::InvalidRequest(
                "input must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Success payload returned to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The embedding vector.
    pub embedding: Embedding,
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The resolved vector.
    pub embedding: Embedding,

    /// Whether the vector came from the cache.
    pub cache_hit: bool,
}

impl From<Resolution> for EmbeddingResponse {
    fn from(resolution: Resolution) -> Self {
        Self {
            embedding: resolution.embedding,
        }
    }
}

/// Tunables for [`EmbeddingResolver`].
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Upper bound on one provider call. Elapsing counts as provider failure.
    pub provider_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

/// Resolves `(model, input)` pairs to vectors, consulting the cache first.
///
/// Holds no per-request state; clone it or share it behind an `Arc` across
/// concurrent requests. Concurrent misses on the same key may each call the
/// provider; the first stored vector wins and later writes are ignored.
#[derive(Clone)]
pub struct EmbeddingResolver {
    registry: Arc<ModelRegistry>,
    store: Arc<dyn VectorStore>,
    provider: Arc<dyn EmbeddingProvider>,
    config: ResolverConfig,
}

impl EmbeddingResolver {
    /// Create a resolver with the default configuration.
    pub fn new(
        registry: Arc<ModelRegistry>,
        store: Arc<dyn VectorStore>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            registry,
            store,
            provider,
            config: ResolverConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve one request.
    pub async fn resolve(&self, request: EmbeddingRequest) -> Result<Resolution> {
        request.validate()?;
        let EmbeddingRequest { model, input } = request;

        let registry = Arc::clone(&self.registry);
        let name = model.clone();
        let model_id =
            tokio::task::spawn_blocking(move || registry.get_or_create(&name)).await??;

        let hash = ContentHash::of(&input);

        let store = Arc::clone(&self.store);
        let key = hash.clone();
        let cached = tokio::task::spawn_blocking(move || store.lookup(&key, model_id)).await??;

        if let Some(embedding) = cached {
            debug!("Cache hit for {hash} (model {model})");
            return Ok(Resolution {
                embedding,
                cache_hit: true,
            });
        }

        debug!("Cache miss for {hash} (model {model}), calling {}", self.provider.name());

        let embedding = self.call_provider(&model, &input).await?;

        let store = Arc::clone(&self.store);
        let to_store = embedding.clone();
        let written =
            tokio::task::spawn_blocking(move || store.store(&hash, model_id, &to_store)).await;

        // The caller gets the vector either way; a failed write only costs
        // a future cache hit.
        match written {
            Ok(Ok(StoreOutcome::Inserted)) => info!("Cached new embedding for model {model}"),
            Ok(Ok(StoreOutcome::AlreadyPresent)) => {
                debug!("Concurrent request already cached this embedding")
            }
            Ok(Err(e)) => warn!("Failed to cache embedding for model {model}: {e}"),
            Err(e) => warn!("Cache write task failed for model {model}: {e}"),
        }

        Ok(Resolution {
            embedding,
            cache_hit: false,
        })
    }

    async fn call_provider(&self, model: &str, input: &str) -> Result<Embedding> {
        let timeout = self.config.provider_timeout;
        match tokio::time::timeout(timeout, self.provider.embed(model, input)).await {
            Ok(result) => result,
            Err(_) => Err(EmbeddingError::ProviderTimeout { timeout }),
        }
    }
}
