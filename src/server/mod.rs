//! HTTP server for the manual RAG service

pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth;
use crate::config::Config;
use crate::error::{Error, Result};
use state::AppState;

/// The RAG HTTP server
pub struct RagServer {
    config: Config,
    state: AppState,
}

impl RagServer {
    /// Create a server from configuration.
    pub fn new(config: Config) -> Result<Self> {
        let state = AppState::new(config.clone())?;
        Ok(Self { config, state })
    }

    /// Build the router with every route and middleware layer.
    fn build_router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            // Ingestion and manual management
            .route("/upload_pdf/", post(routes::upload::upload_pdf))
            .route("/upload_multiple_pdfs/", post(routes::upload::upload_multiple_pdfs))
            .route("/get_uploaded_files/", get(routes::upload::get_uploaded_files))
            .route("/remove_file/", post(routes::upload::remove_file))
            .route("/delete_manual/", delete(routes::upload::delete_manual))
            // Company and manual listing
            .route("/companies/", get(routes::companies::list_companies))
            .route("/companies/current/", get(routes::companies::current_company))
            .route("/companies/:company/models/", get(routes::companies::company_models))
            // Query and conversation
            .route("/query/", post(routes::query::process_query))
            .route("/conversation/history/", get(routes::query::conversation_history))
            .route("/conversation/clear/", get(routes::query::clear_conversation))
            .route("/health/", get(routes::query::health_check))
            // Reconciliation (admin)
            .route("/reconcile/", get(routes::admin::list_reconcile))
            .route("/reconcile/run", post(routes::admin::run_reconcile))
            // Auth
            .route("/auth/signup", post(auth::routes::signup))
            .route("/auth/login", post(auth::routes::login))
            .route("/auth/me", get(auth::routes::me))
            .route("/auth/admin-only", get(auth::routes::admin_only))
            .layer(DefaultBodyLimit::max(self.config.server.max_upload_size))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Bind and serve until shutdown.
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {e}")))?;

        let router = self.build_router();

        tracing::info!("Starting manual RAG server on http://{addr}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {e}")))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::internal(format!("Server error: {e}")))?;

        Ok(())
    }

    /// The configured bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}
