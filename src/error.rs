/*
 * Responsibility
 * - Gate setup errors (GateError)
 * - Authorization failures as data (Rejection) and their IntoResponse mapping
 *   - 401/400: whatever the verifier prepared
 *   - 403: fixed insufficient_scope body synthesized by the gate
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::verifier::ErrorResponse;

pub const INSUFFICIENT_SCOPE: &str = "insufficient_scope";
pub const INSUFFICIENT_SCOPE_DESCRIPTION: &str =
    "The request requires higher privileges than provided by the access token";

#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
}

/// Why the gate refused to forward a request.
#[derive(Debug, Clone)]
pub enum Rejection {
    /// Verification failed; the verifier's response is passed through.
    Unauthorized(ErrorResponse),
    /// The token is valid but no required scope alternative is granted.
    InsufficientScope,
}

impl Rejection {
    fn into_error_response(self) -> ErrorResponse {
        let mut response = match self {
            Rejection::Unauthorized(response) => response,
            Rejection::InsufficientScope => ErrorResponse::with_error(
                StatusCode::FORBIDDEN,
                INSUFFICIENT_SCOPE,
                INSUFFICIENT_SCOPE_DESCRIPTION,
            ),
        };
        response.ensure_json_content_type();
        response
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        self.into_error_response().into_response()
    }
}
