use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use live_posts::{serve, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();

    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!(?config, "starting live-posts");
    serve(config).await?;
    Ok(())
}
