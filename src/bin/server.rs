//! Manual RAG server binary
//!
//! Run with: cargo run --bin manual-rag-server

use manual_rag::{config::Config, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "manual_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Model endpoint: {}", config.llm.base_url);
    tracing::info!("  - Chat model: {}", config.llm.chat_model);
    tracing::info!("  - Embedding model: {} ({} dims)", config.embeddings.model, config.embeddings.dimensions);
    tracing::info!("  - Vector store: {}", config.vector_db.url);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let server = RagServer::new(config)?;

    tracing::info!("Endpoints:");
    tracing::info!("  POST /upload_pdf/            - Upload a manual");
    tracing::info!("  POST /upload_multiple_pdfs/  - Upload several manuals");
    tracing::info!("  POST /query/                 - Ask a question");
    tracing::info!("  GET  /health/                - Component health");
    tracing::info!("Listening on http://{}", server.address());

    server.start().await?;

    Ok(())
}
