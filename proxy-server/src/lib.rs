//! # Embedding Proxy Server
//!
//! HTTP front end for the embedding cache. Every path accepts a JSON body of
//! the form `{"model": "...", "input": "..."}` and answers with
//! `{"embedding": [...]}`, serving from the SQLite cache when possible and
//! forwarding to the configured OpenAI-compatible provider otherwise.

pub mod config;
pub mod handler;
pub mod logging;

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use embed_proxy_embeddings::{
    Database, EmbeddingProvider, EmbeddingResolver, ModelRegistry, SqliteVectorStore, VectorStore,
};
use tokio::net::TcpListener;
use tracing::{error, info};

pub use config::ProxyConfig;

/// Build the router around a resolver.
pub fn router(resolver: EmbeddingResolver) -> Router {
    Router::new().fallback(handler::embed).with_state(resolver)
}

/// Open storage and wire the resolver described by `config`.
///
/// Failure here is fatal: the proxy cannot answer anything without a
/// working database.
pub fn build_resolver(config: &ProxyConfig) -> anyhow::Result<EmbeddingResolver> {
    let db = Arc::new(
        Database::open(&config.db_path)
            .with_context(|| format!("failed to open database {}", config.db_path.display()))?,
    );
    let registry =
        Arc::new(ModelRegistry::load(Arc::clone(&db)).context("failed to load models")?);
    let store: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::new(db));
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(config.provider());

    Ok(EmbeddingResolver::new(registry, store, provider).with_config(config.resolver_config()))
}

/// Serve requests on `listener` until `shutdown` completes.
pub async fn serve<F>(
    listener: TcpListener,
    resolver: EmbeddingResolver,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(resolver))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Run the proxy until Ctrl-C.
pub async fn run(config: ProxyConfig) -> anyhow::Result<()> {
    let resolver = build_resolver(&config)?;

    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Starting embedding proxy server on {addr}");
    serve(listener, resolver, shutdown_on(tokio::signal::ctrl_c()))
        .await
        .context("server error")
}

/// Resolve once `signal` fires.
///
/// A signal that could not be installed never fires, so the server keeps
/// running instead of stopping immediately.
async fn shutdown_on<S>(signal: S)
where
    S: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Shutting down"),
        Err(err) => {
            error!("Failed to install shutdown signal handler: {err}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_completes_when_signal_fires() {
        let shutdown = shutdown_on(async { Ok(()) });
        assert!(
            tokio::time::timeout(Duration::from_millis(50), shutdown)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_failed_signal_registration_keeps_serving() {
        let shutdown = shutdown_on(async { Err(std::io::Error::other("no signal support")) });
        assert!(
            tokio::time::timeout(Duration::from_millis(50), shutdown)
                .await
                .is_err()
        );
    }
}
