//! Chart synthesis server binary
//!
//! Run with: cargo run -p chart-synth --bin chart-synth-server
//!
//! Reads an optional TOML file named by `CHART_SYNTH_CONFIG`, then applies
//! `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `PORT` from the environment.

use chart_synth::{config::SynthConfig, server::ChartServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chart_synth=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var_os("CHART_SYNTH_CONFIG").map(PathBuf::from);
    let config = SynthConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Endpoint: {}", config.llm.base_url);
    tracing::info!("  - Chat model: {}", config.llm.chat_model);
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!("  - Retrieval top_k: {}", config.retrieval.top_k);

    if config.llm.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; requests are sent without credentials");
    }

    // Create and start server
    let server = ChartServer::new(config)?;

    let upstream = server.state().pipeline().upstream_health().await;
    if !upstream.chat {
        tracing::warn!("Chat endpoint is not reachable; generation will fail until it is");
    }
    if !upstream.embeddings {
        tracing::warn!("Embedding endpoint is not reachable; document uploads will fail until it is");
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/generate - Generate a chart (multipart: prompt, optional file)");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
