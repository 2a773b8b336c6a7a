//! HTTP route handlers.
//!
//! Every collaborator error is caught here and converted to a JSON status
//! response; nothing thrown below this boundary crashes the process.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use finbot_core::Error;

pub mod dashboard;
pub mod webhook;

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.0 {
            Error::Auth(_) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Invalid signature" })),
            )
                .into_response(),
            Error::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            err => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "status": "error", "message": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
