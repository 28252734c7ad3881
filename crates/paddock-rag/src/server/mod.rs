//! HTTP and WebSocket server for the RAG system

pub mod routes;
pub mod session;
pub mod state;
pub mod ws;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use state::AppState;

/// RAG server exposing the WebSocket session endpoint and the HTTP API
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a server around prepared state
    pub fn new(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    /// Shared state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/health", get(health_check))
            .route("/ready", get(readiness))
            .route("/ws", get(ws::ws_handler))
            .nest("/api", routes::api_routes())
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.server.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router.layer(cors)
        } else {
            router
        }
    }

    /// Start the server and run until Ctrl-C
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!("Starting RAG server on http://{}", addr);
        tracing::info!("WebSocket endpoint: ws://{}/ws", addr);

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let pipeline = self.state.pipeline();

        if self.config.index.warm_start {
            if let Err(e) = pipeline.warm_start().await {
                tracing::warn!("Could not load persisted index: {}", e);
            }
        }
        let refresher = pipeline.spawn_refresher(self.config.index.refresh_interval_secs);
        if refresher.is_some() {
            tracing::info!(
                "Background index refresh every {}s",
                self.config.index.refresh_interval_secs
            );
        }

        let router = self.router();
        self.state.set_ready(true);

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)));

        if let Some(handle) = refresher {
            handle.abort();
        }
        self.state.set_ready(false);
        tracing::info!("Server stopped");

        result
    }

    /// Get the server address
    pub fn address(&self) -> String {
        self.config.address()
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(e) => {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
