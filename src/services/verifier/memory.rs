//! In-memory access token verifier.
//!
//! Looks bearer tokens up in a process-local table, the way a resource
//! controller sits on top of an access-token storage. Mostly useful for local
//! development and tests; the table can be seeded from a JSON fixture:
//!
//! ```json
//! {"access_tokens": {"atokenvalue": {"client_id": "a client id", "user_id": "a user id", "expires": 99999999900, "scope": null}}}
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use axum::http::{StatusCode, request::Parts};
use serde::{Deserialize, Serialize};

use super::{
    DEFAULT_REALM, ErrorResponse, TokenClaims, TokenVerifier, Verification, VerifierError,
    bearer_token, with_challenge,
};

/// A row of the access-token table.
///
/// Every field is optional so that malformed rows can be reported as such
/// instead of failing the whole fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub expires: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl From<&TokenClaims> for StoredToken {
    fn from(claims: &TokenClaims) -> Self {
        Self {
            client_id: Some(claims.client_id.clone()),
            user_id: Some(claims.user_id.clone()),
            expires: Some(claims.expires),
            scope: claims.scope.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    access_tokens: HashMap<String, StoredToken>,
}

#[derive(Debug)]
pub struct MemoryTokenVerifier {
    tokens: RwLock<HashMap<String, StoredToken>>,
    realm: String,
    // Space-separated; every name must be granted.
    scope: Option<String>,
}

impl Default for MemoryTokenVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTokenVerifier {
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            realm: DEFAULT_REALM.to_string(),
            scope: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, VerifierError> {
        let fixture: Fixture = serde_json::from_str(json)?;
        let verifier = Self::new();
        *verifier.tokens.write().unwrap_or_else(PoisonError::into_inner) = fixture.access_tokens;
        Ok(verifier)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VerifierError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_token(self, claims: TokenClaims) -> Self {
        self.insert(claims);
        self
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    /// Scope the verifier itself demands from every token (AND semantics).
    pub fn with_required_scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        self.scope = (!scope.trim().is_empty()).then_some(scope);
        self
    }

    pub fn insert(&self, claims: TokenClaims) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(claims.access_token.clone(), StoredToken::from(&claims));
    }

    pub fn len(&self) -> usize {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, token: &str) -> Option<StoredToken> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
    }

    fn check(&self, request: &Parts, now: i64) -> Result<TokenClaims, ErrorResponse> {
        let Some(token) = bearer_token(request)? else {
            // RFC 6750: no error code when the request carries no credentials.
            return Err(ErrorResponse::new(StatusCode::UNAUTHORIZED));
        };

        let row = self.lookup(&token).ok_or_else(|| {
            ErrorResponse::with_error(
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "The access token provided is invalid",
            )
        })?;

        let Some(client_id) = row.client_id else {
            return Err(malformed("client_id"));
        };
        let Some(expires) = row.expires else {
            return Err(malformed("expires"));
        };

        let claims = TokenClaims {
            access_token: token,
            client_id,
            user_id: row.user_id.unwrap_or_default(),
            expires,
            scope: row.scope,
        };

        if claims.is_expired_at(now) {
            return Err(ErrorResponse::with_error(
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "The access token provided has expired",
            ));
        }

        if let Some(required) = &self.scope {
            let granted = claims.scopes();
            let missing = required
                .split_whitespace()
                .any(|name| !granted.contains(name));
            if missing {
                return Err(ErrorResponse::with_error(
                    StatusCode::FORBIDDEN,
                    "insufficient_scope",
                    "The request requires higher privileges than provided by the access token",
                ));
            }
        }

        Ok(claims)
    }
}

fn malformed(field: &str) -> ErrorResponse {
    ErrorResponse::with_error(
        StatusCode::UNAUTHORIZED,
        "malformed_token",
        format!("Malformed token (missing \"{field}\")"),
    )
}

#[async_trait]
impl TokenVerifier for MemoryTokenVerifier {
    async fn verify_resource_request(&self, request: &Parts) -> Verification {
        let now = chrono::Utc::now().timestamp();

        match self.check(request, now) {
            Ok(claims) => Verification::Granted(claims),
            Err(response) => {
                tracing::warn!(
                    status = %response.status,
                    error = response.error().unwrap_or("missing_token"),
                    path = %request.uri.path(),
                    "access token verification failed"
                );
                let scope = response
                    .error()
                    .filter(|e| *e == "insufficient_scope")
                    .and(self.scope.as_deref());
                Verification::Denied(with_challenge(response, &self.realm, scope))
            }
        }
    }
}
