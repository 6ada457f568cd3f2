use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use word_frequency::config::Config;
use word_frequency::http::{HttpState, start_http_server};

/// Top-K word frequency HTTP service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file (overrides WORDFREQ_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config and WORDFREQ_HTTP_BIND)
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    if let Some(bind) = args.bind {
        config.server.http_bind = bind;
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.runtime.log_level))
        .init();

    info!(
        "Starting word-frequency (spool={}, cache ttl={:?})",
        config.upload.spool,
        config.cache_ttl()
    );

    let state = HttpState::from_config(&config);
    start_http_server(&config, state).await
}
