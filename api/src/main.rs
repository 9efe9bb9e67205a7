mod http;
mod metrics;
mod prompts;
mod upstream;

use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gitscope_api=info,tower_http=info".into()),
        )
        .init();

    let port = std::env::var("HTTP_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(42071);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let upstream = upstream::UpstreamClient::from_env()?;
    let state = http::ApiState::new(upstream);

    info!("Starting gitscope-api on http://{}", addr);

    http::serve(addr, state).await?;

    Ok(())
}
