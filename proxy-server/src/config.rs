//! Command-line configuration for the proxy.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use embed_proxy_embeddings::{OpenAIProvider, ResolverConfig};

/// Caching proxy for OpenAI-compatible embedding APIs.
#[derive(Debug, Clone, Parser)]
#[command(name = "embed-proxy", version, about)]
pub struct ProxyConfig {
    /// Path to the SQLite database.
    #[arg(long = "db", default_value = "embeddings.db")]
    pub db_path: PathBuf,

    /// OpenAI-compatible API URL.
    #[arg(long, default_value = "http://localhost:11434/v1/")]
    pub api_url: String,

    /// API key sent as a bearer token. Leave empty for local servers.
    #[arg(long, env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Append logs to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Host to listen on.
    #[arg(long, default_value = "localhost")]
    pub web_host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 35248)]
    pub web_port: u16,

    /// Give up on an upstream call after this many seconds.
    #[arg(long, default_value_t = 60)]
    pub provider_timeout_secs: u64,
}

impl ProxyConfig {
    /// `host:port` the server listens on.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.web_host, self.web_port)
    }

    /// Upstream provider built from the API flags.
    pub fn provider(&self) -> OpenAIProvider {
        OpenAIProvider::new()
            .with_base_url(&self.api_url)
            .with_api_key(&self.api_key)
    }

    /// Resolver tunables.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            provider_timeout: Duration::from_secs(self.provider_timeout_secs),
        }
    }
}
