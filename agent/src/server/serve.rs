//! HTTP server setup

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::app::state::DeviceContext;
use crate::errors::WattrixError;
use crate::server::handlers::{
    entities_handler, entity_handler, health_handler, number_handler, reapply_handler,
    select_mode_handler, version_handler,
};

/// Build the API router
pub fn router(state: Arc<DeviceContext>) -> Router {
    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Entities
        .route("/entities", get(entities_handler))
        .route("/entities/{unique_id}", get(entity_handler))
        // Actions
        .route("/select/mode", post(select_mode_handler))
        .route("/number/{field}", post(number_handler))
        .route("/button/reapply", post(reapply_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server; returns the bound address and the server task
pub async fn serve(
    options: &ServerOptions,
    state: Arc<DeviceContext>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, JoinHandle<Result<(), WattrixError>>), WattrixError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| WattrixError::ServerError(format!("{}: {}", addr, e)))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| WattrixError::ServerError(e.to_string()))?;
    info!("Starting HTTP server on {}", local_addr);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| WattrixError::ServerError(e.to_string()))
    });

    Ok((local_addr, handle))
}
