//! HTTP error mapping
//!
//! Turns application errors into JSON error responses.

use crate::broadcast::HubError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relay_common::{AppError, ErrorResponse};
use thiserror::Error;

/// API error type for consistent error responses
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    App(#[from] AppError),
}

impl From<HubError> for ApiError {
    fn from(err: HubError) -> Self {
        Self::App(err.into())
    }
}

impl ApiError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::App(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let Self::App(err) = &self;

        if status.is_server_error() {
            tracing::error!(error = %err, code = err.error_code(), "Request failed");
        }

        (status, Json(ErrorResponse::from(err))).into_response()
    }
}
