//! HTTP front end.
//!
//! - `GET /` serves the upload page
//! - `GET /static/*` serves its assets
//! - `POST /convert` turns an uploaded PDF into an xlsx workbook

mod config;
mod error;
mod handlers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tablift_core::orchestrator::Orchestrator;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::CliError;

pub use config::ServerConfig;

/// Shared by every request; read-only.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub index_path: PathBuf,
}

pub fn router(state: AppState, static_dir: &Path, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/convert", post(handlers::convert))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: ServerConfig, orchestrator: Orchestrator) -> Result<(), CliError> {
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        index_path: config.index.clone(),
    };
    let app = router(state, &config.static_dir, config.body_limit());

    let listener = tokio::net::TcpListener::bind(config.address()).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        index = %config.index.display(),
        static_dir = %config.static_dir.display(),
        max_upload_mb = config.max_upload_mb,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
