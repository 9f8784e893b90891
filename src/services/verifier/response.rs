//! Error responses handed back by a verifier (or synthesized by the gate).
//!
//! The body follows RFC 6750 section 3: `error`, `error_description` and
//! `error_uri`, each omitted when absent. It is always serialized as minified
//! JSON.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

/// Status, body and headers of a rejected request.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub body: ErrorBody,
    pub headers: HeaderMap,
}

impl ErrorResponse {
    /// Response with an empty body (`{}`) and no headers.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: ErrorBody::default(),
            headers: HeaderMap::new(),
        }
    }

    pub fn with_error(
        status: StatusCode,
        error: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: Some(error.into()),
                error_description: Some(description.into()),
                error_uri: None,
            },
            headers: HeaderMap::new(),
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn error(&self) -> Option<&str> {
        self.body.error.as_deref()
    }

    pub fn error_description(&self) -> Option<&str> {
        self.body.error_description.as_deref()
    }

    /// Sets `Content-Type: application/json` unless some content type is
    /// already present. An existing value is never replaced.
    pub fn ensure_json_content_type(&mut self) {
        self.headers
            .entry(header::CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let body = serde_json::to_vec(&self.body).unwrap_or_else(|_| b"{}".to_vec());

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
