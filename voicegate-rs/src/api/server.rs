//! API Server - HTTP server for webhooks, audio hosting and admin

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{admin, handlers};
use crate::api::handlers::AppState;

/// API Server configuration
pub struct ApiServer {
    state: Arc<AppState>,
    addr: String,
}

impl ApiServer {
    pub fn new(state: Arc<AppState>, addr: String) -> Self {
        Self { state, addr }
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        // Voice provider webhooks
        let webhook_routes = Router::new()
            .route("/voice", get(handlers::voice).post(handlers::voice))
            .route("/check_code", post(handlers::check_code))
            .route(
                "/fulfill/:code",
                get(handlers::fulfill).post(handlers::fulfill),
            );

        // Operator maintenance routes
        let admin_routes = Router::new()
            .route("/codes", get(admin::list_codes))
            .route("/codes/:code/reset", post(admin::reset_code))
            .route("/reset_all", post(admin::reset_all))
            .route("/sync", post(admin::sync_codes));

        Router::new()
            .merge(webhook_routes)
            .nest("/admin", admin_routes)
            .route("/health", get(handlers::health))
            .nest_service(
                "/audio",
                ServeDir::new(&self.state.config.storage.audio_dir),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the API server
    pub async fn run(&self) -> std::io::Result<()> {
        let router = self.router();

        info!("Starting API server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
