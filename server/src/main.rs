use std::{net::SocketAddr, sync::Arc};

use llm_core::GeminiClient;
use tokio::net::TcpListener;
use tracing::info;
use tts_core::ElevenLabsClient;

use server::{build_router, config::ServerConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = dotenv::dotenv();

    async_main().await
}

async fn async_main() -> anyhow::Result<()> {
    info!("Starting audio relay server...");

    let llm = GeminiClient::from_env()?;
    info!("Completion model: {}", llm.model());
    let tts = ElevenLabsClient::from_env()?;

    // Load configuration from environment
    let config = ServerConfig::from_env();
    info!(
        "Server configuration loaded: port={}, voice={}, model={}, format={}, llm_timeout={:?}",
        config.port, config.voice_id, config.model_id, config.output_format, config.llm_timeout_secs
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let state = AppState::new(Arc::new(llm), Arc::new(tts), config);
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different PORT.")
    })?;

    info!("Server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
