//! Token verification collaborators consumed by the authorization gate.
//!
//! A [`TokenVerifier`] locates the bearer token in a request, validates it and
//! answers with either the token's claims or a prepared error response. The
//! gate never looks at the error vocabulary; whatever the verifier puts in the
//! [`ErrorResponse`] is what the client receives.

use async_trait::async_trait;
use axum::http::{
    HeaderValue, StatusCode, header,
    request::Parts,
};
use thiserror::Error;

pub mod claims;
pub mod factory;
pub mod jwt;
pub mod memory;
pub mod response;

pub use claims::TokenClaims;
pub use factory::build_verifier;
pub use jwt::JwtTokenVerifier;
pub use memory::MemoryTokenVerifier;
pub use response::{ErrorBody, ErrorResponse};

/// Realm advertised in `WWW-Authenticate` when none is configured.
pub const DEFAULT_REALM: &str = "Service";

/// Result of a single resource-request verification.
#[derive(Debug, Clone)]
pub enum Verification {
    Granted(TokenClaims),
    Denied(ErrorResponse),
}

/// Verifies the access token carried by an incoming request.
///
/// Implementations own the whole check: finding the token, looking it up,
/// expiry, and any scope configured on the verifier itself.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify_resource_request(&self, request: &Parts) -> Verification;
}

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("failed to read access token fixture: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid access token fixture: {0}")]
    Fixture(#[from] serde_json::Error),

    #[error("invalid verification key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),
}

/// Locate the access token in the `Authorization` header or the
/// `access_token` query parameter.
///
/// Returns:
/// - `Ok(Some(token))` when exactly one method carries a token
/// - `Ok(None)` when the request carries no token at all
/// - `Err(_)` (400 `invalid_request`) for a malformed header or when both methods are used
pub fn bearer_token(request: &Parts) -> Result<Option<String>, ErrorResponse> {
    let from_header = request.headers.get(header::AUTHORIZATION);
    let from_query = request.uri.query().and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "access_token")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    });

    match (from_header, from_query) {
        (Some(_), Some(_)) => Err(ErrorResponse::with_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "Only one method may be used to authenticate at a time",
        )),
        (Some(value), None) => value
            .to_str()
            .ok()
            .and_then(parse_bearer)
            .map(|token| Some(token.to_string()))
            .ok_or_else(|| {
                ErrorResponse::with_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_request",
                    "Malformed auth header",
                )
            }),
        (None, Some(token)) => Ok(Some(token)),
        (None, None) => Ok(None),
    }
}

// `Bearer <token>`, scheme case-insensitive, token a single non-empty word.
fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty() && !token.contains(char::is_whitespace)).then_some(token)
}

/// Attach the RFC 6750 `WWW-Authenticate` challenge to a failure response.
pub(crate) fn with_challenge(
    mut response: ErrorResponse,
    realm: &str,
    scope: Option<&str>,
) -> ErrorResponse {
    let mut challenge = format!("Bearer realm={}", quoted(realm));
    if let Some(scope) = scope {
        challenge.push_str(&format!(", scope={}", quoted(scope)));
    }
    if let Some(error) = response.error() {
        challenge.push_str(&format!(", error={}", quoted(error)));
        if let Some(description) = response.error_description() {
            challenge.push_str(&format!(", error_description={}", quoted(description)));
        }
    }

    if let Ok(value) = HeaderValue::from_str(&challenge) {
        response.headers.insert(header::WWW_AUTHENTICATE, value);
    }
    response
}

// RFC 9110 quoted-string: backslash-escape `"` and `\`.
fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn token_from_header() {
        let p = parts("/foos", Some("Bearer atokenvalue"));
        assert_eq!(bearer_token(&p).unwrap().as_deref(), Some("atokenvalue"));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let p = parts("/foos", Some("bearer atokenvalue"));
        assert_eq!(bearer_token(&p).unwrap().as_deref(), Some("atokenvalue"));
    }

    #[test]
    fn token_from_query() {
        let p = parts("/foos?access_token=atokenvalue", None);
        assert_eq!(bearer_token(&p).unwrap().as_deref(), Some("atokenvalue"));
    }

    #[test]
    fn no_token() {
        let p = parts("/foos", None);
        assert!(bearer_token(&p).unwrap().is_none());
    }

    #[test]
    fn both_methods_rejected() {
        let p = parts("/foos?access_token=a", Some("Bearer b"));
        let err = bearer_token(&p).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error(), Some("invalid_request"));
    }

    #[test]
    fn malformed_header_rejected() {
        for value in ["Basic abc", "Bearer", "Bearer a b", "atokenvalue"] {
            let p = parts("/foos", Some(value));
            let err = bearer_token(&p).unwrap_err();
            assert_eq!(err.error_description(), Some("Malformed auth header"), "{value}");
        }
    }

    #[test]
    fn challenge_includes_error_fields() {
        let resp = with_challenge(
            ErrorResponse::with_error(StatusCode::UNAUTHORIZED, "invalid_token", "expired"),
            "Service",
            None,
        );
        assert_eq!(
            resp.headers[header::WWW_AUTHENTICATE],
            "Bearer realm=\"Service\", error=\"invalid_token\", error_description=\"expired\""
        );
    }

    #[test]
    fn challenge_without_error_is_bare() {
        let resp = with_challenge(ErrorResponse::new(StatusCode::UNAUTHORIZED), "Service", None);
        assert_eq!(resp.headers[header::WWW_AUTHENTICATE], "Bearer realm=\"Service\"");
    }

    #[test]
    fn challenge_escapes_quoted_strings() {
        let resp = with_challenge(
            ErrorResponse::with_error(
                StatusCode::UNAUTHORIZED,
                "malformed_token",
                r#"Malformed token (missing "expires") \ retry"#,
            ),
            "Service",
            None,
        );
        assert_eq!(
            resp.headers[header::WWW_AUTHENTICATE],
            r#"Bearer realm="Service", error="malformed_token", error_description="Malformed token (missing \"expires\") \\ retry""#
        );
    }
}
