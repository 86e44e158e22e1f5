//! REST API over a running simulation engine.
//!
//! Device routes live under `/api/devices`, the snapshot streams under
//! `/api/streams`, and `/health` reports whether both loops are running.

mod handlers;
mod types;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::sim::engine::SimulationEngine;

pub use types::{DeviceResponse, DevicesResponse, ErrorResponse, HealthResponse};

/// Shared state for all request handlers.
///
/// The engine synchronizes internally, so handlers only need a shared
/// reference.
pub type AppState = Arc<SimulationEngine>;

/// Builds the axum router with all API routes.
pub fn router(engine: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/devices", get(handlers::list_devices))
        .route("/api/devices/telemetry", get(handlers::all_telemetry))
        .route("/api/devices/{id}", get(handlers::get_device))
        .route(
            "/api/devices/{id}/control/{command}",
            post(handlers::control_device),
        )
        .route("/api/live", get(handlers::all_telemetry))
        .route("/api/grid-context", get(handlers::grid_context))
        .route("/api/streams/combined", get(handlers::combined_stream))
        .route("/api/streams/internal", get(handlers::internal_stream))
        .route("/api/streams/external", get(handlers::grid_context))
        .with_state(engine)
}

/// Binds to the given address and serves the API until `shutdown` resolves.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(
    engine: AppState,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> io::Result<()> {
    let app = router(engine);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
