use clap::Parser;
use embed_proxy_server::{ProxyConfig, logging, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ProxyConfig::parse();
    let _log_guard = logging::init_tracing(config.log_file.as_deref());
    run(config).await
}
