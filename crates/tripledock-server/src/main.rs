//! Tripledock game session server.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commentary;
mod config;
mod protocol;
mod server;
mod session;

use commentary::{Commentator, HttpCommentator};
use config::ServerConfig;
use server::ServerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let commentator: Option<Arc<dyn Commentator>> = match &config.commentary_url {
        Some(url) => {
            info!("Commentary enabled via {}", url);
            Some(Arc::new(HttpCommentator::new(
                url.clone(),
                config.commentary_timeout,
            )))
        }
        None => {
            info!("Commentary disabled (COMMENTARY_URL not set)");
            None
        }
    };

    info!("Starting Tripledock server...");

    let state = Arc::new(ServerState::new(commentator));

    server::run_server(config.addr, state).await
}
