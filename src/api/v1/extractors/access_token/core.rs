use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};

use crate::services::verifier::TokenClaims;

/// Extractor giving handlers the claims of the current request's token.
/// The authorization gate inserts them into request.extensions() before forwarding.
/// Missing means the route is not behind the gate, which is answered with 401.
#[derive(Debug, Clone)]
pub struct AccessToken(pub TokenClaims);

impl<S> FromRequestParts<S> for AccessToken
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TokenClaims>()
            .cloned()
            .map(AccessToken)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
