//! Publish side-channel
//!
//! One-shot HTTP requests that inject an envelope into the hub.

use crate::server::{ApiError, GatewayState};
use axum::{
    extract::{Path, State},
    Json,
};
use relay_core::Envelope;

/// Broadcast a navigation to every connected client
///
/// GET /navigate/:route
///
/// Echoes the envelope back to the caller.
pub async fn navigate(
    State(state): State<GatewayState>,
    Path(route): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    let envelope = Envelope::navigation(route);

    state.hub().submit(envelope.clone()).await?;

    tracing::info!(
        content = %envelope.content(),
        kind = %envelope.kind(),
        "Navigation published"
    );

    Ok(Json(envelope))
}
