//! Gateway server setup
//!
//! Provides the HTTP / WebSocket routes and server lifecycle.

mod handler;
mod publish;
mod response;
mod state;

pub use handler::relay_handler;
pub use publish::navigate;
pub use response::ApiError;
pub use state::GatewayState;

use crate::broadcast::{BroadcastHub, HubConfig};
use axum::{extract::State, routing::get, Json, Router};
use relay_common::{AppConfig, AppError};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Health check body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
}

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/ws", get(relay_handler))
        .route("/navigate/:route", get(navigate))
        .route("/health", get(health_check))
}

/// Health check endpoint
///
/// GET /health
async fn health_check(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.hub().connection_count(),
    })
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the hub, start its delivery loop, and wrap it in `GatewayState`
///
/// Must be called from within a Tokio runtime.
pub fn create_gateway_state(config: AppConfig) -> GatewayState {
    let hub = BroadcastHub::new_shared(HubConfig::from(&config.hub));
    hub.clone().start();

    GatewayState::new(hub, config)
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting relay server on {}", addr);

    let listener = TcpListener::bind(addr).await.map_err(|e| AppError::Bind {
        addr: addr.to_string(),
        source: e,
    })?;

    tracing::info!("Relay listening on ws://{}/ws", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Server(e.to_string()))?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.server.socket_addr()?;

    let state = create_gateway_state(config);
    let app = create_app(state);

    run_server(app, addr).await
}
