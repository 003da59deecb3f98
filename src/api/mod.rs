//! HTTP API server for the Rev gateway

pub mod health;
pub mod websocket;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::gemini::{GeminiClient, TextGenerator};
use crate::orchestrator::Orchestrator;
use crate::session::SessionStore;
use crate::transcriber::{FixedTranscriber, Transcriber};
use crate::Result;

/// Shared state for API handlers
pub struct ApiState {
    pub store: SessionStore,
    pub orchestrator: Arc<Orchestrator>,
    pub gemini: Arc<GeminiClient>,
    pub started_at: Instant,
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Wire the gateway together from configuration
    #[must_use]
    pub fn new(config: Config) -> Self {
        let gemini = Arc::new(GeminiClient::new(
            config.api_key,
            config.base_url,
            config.model,
        ));
        let store = SessionStore::new();

        let generator: Arc<dyn TextGenerator> = gemini.clone();
        let transcriber: Arc<dyn Transcriber> = Arc::new(FixedTranscriber::default());
        let orchestrator = Arc::new(Orchestrator::new(store.clone(), generator, transcriber));

        let state = Arc::new(ApiState {
            store,
            orchestrator,
            gemini,
            started_at: Instant::now(),
        });

        Self {
            state,
            port: config.port,
            static_dir: config.static_dir,
        }
    }

    /// Build the router with all routes
    fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(health::router(Arc::clone(&self.state)))
            .merge(websocket::router(Arc::clone(&self.state)));

        // Serve the browser client if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir = ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));
            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        // CORS layer for cross-origin requests from the frontend
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run.
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "gateway listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

/// Resolve when the process receives Ctrl-C
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
