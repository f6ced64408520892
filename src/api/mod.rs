// src/api/mod.rs

pub mod handler;

use crate::config::ViewerConfig;
use crate::error::Result;
use crate::models::AppState;
use axum::{routing::get, Router};
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use handler::{index_handler, not_found_handler, render_index, stats_handler};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/stats", get(stats_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Serves the viewer until the process is stopped.
pub async fn serve(config: &ViewerConfig, state: AppState) -> Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!(
        "Server running on http://{}:{} (reports from {})",
        config.host,
        config.port,
        state.store.root().display()
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}
