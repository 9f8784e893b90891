use async_trait::async_trait;
use axum::http::{StatusCode, request::Parts};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;

use super::{
    DEFAULT_REALM, ErrorResponse, TokenClaims, TokenVerifier, Verification, VerifierError,
    bearer_token, with_challenge,
};

/// Claims read from a JWT access token.
///
/// NOTE:
/// - `client_id` falls back to `azp` when the issuer does not set it.
/// - `scope` is the space-separated OAuth scope string.
#[derive(Debug, Clone, Deserialize)]
struct JwtAccessClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    azp: Option<String>,
    exp: i64,
    #[serde(default)]
    scope: Option<String>,
}

/// Self-contained (JWT) access token verifier.
///
/// - Key material is not printable via Debug.
#[derive(Clone)]
pub struct JwtTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    realm: String,
}

impl std::fmt::Debug for JwtTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenVerifier")
            .field("validation", &self.validation)
            .field("realm", &self.realm)
            .finish()
    }
}

impl JwtTokenVerifier {
    /// HS256 with a shared secret.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::with_key(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    /// EdDSA (Ed25519) with the issuer's public key.
    pub fn from_ed_pem(public_key_pem: &str) -> Result<Self, VerifierError> {
        let key = DecodingKey::from_ed_pem(public_key_pem.as_bytes())?;
        Ok(Self::with_key(key, Algorithm::EdDSA))
    }

    fn with_key(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        // Audience is only checked once one is configured.
        validation.validate_aud = false;

        Self {
            decoding_key,
            validation,
            realm: DEFAULT_REALM.to_string(),
        }
    }

    pub fn issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    pub fn audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self.validation.validate_aud = true;
        self
    }

    pub fn leeway(mut self, seconds: u64) -> Self {
        self.validation.leeway = seconds;
        self
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, ErrorResponse> {
        let data = jsonwebtoken::decode::<JwtAccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| {
                tracing::warn!(error = ?err, "jwt access token rejected");
                let description = match err.kind() {
                    ErrorKind::ExpiredSignature => "The access token provided has expired",
                    _ => "The access token provided is invalid",
                };
                ErrorResponse::with_error(StatusCode::UNAUTHORIZED, "invalid_token", description)
            })?;

        let claims = data.claims;
        Ok(TokenClaims {
            access_token: token.to_string(),
            client_id: claims.client_id.or(claims.azp).unwrap_or_default(),
            user_id: claims.sub.unwrap_or_default(),
            expires: claims.exp,
            scope: claims.scope,
        })
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify_resource_request(&self, request: &Parts) -> Verification {
        let outcome = match bearer_token(request) {
            Ok(Some(token)) => self.decode(&token),
            Ok(None) => Err(ErrorResponse::new(StatusCode::UNAUTHORIZED)),
            Err(response) => Err(response),
        };

        match outcome {
            Ok(claims) => Verification::Granted(claims),
            Err(response) => Verification::Denied(with_challenge(response, &self.realm, None)),
        }
    }
}
