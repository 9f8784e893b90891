/*
 * Responsibility
 * - Load settings from the environment (PORT, realm, verifier keys, route scope)
 * - Validate them up front so the process fails at startup, not per request
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::middleware::authorization::RequiredScope;
use crate::services::verifier::DEFAULT_REALM;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// How bearer tokens are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierKind {
    /// Opaque tokens looked up in an in-memory table, optionally seeded from a JSON file.
    Memory { tokens_file: Option<PathBuf> },
    /// HS256 JWTs signed with a shared secret.
    JwtSecret { secret: String },
    /// EdDSA JWTs signed by the authorization server.
    JwtPublicKey { public_key_pem: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub www_realm: String,
    pub verifier: VerifierKind,
    // Scope the verifier itself demands (space-separated, all required).
    pub verifier_scope: Option<String>,
    pub auth_issuer: Option<String>,
    pub auth_audience: Option<String>,
    pub access_token_leeway_seconds: u64,

    // Alternatives required on the protected routes, e.g. `["superUser", ["basicUser", "withPermission"]]`.
    pub required_scope: RequiredScope,

    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match var("PORT") {
            Some(s) => s.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV"));

        let www_realm = var("WWW_REALM")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REALM.to_string());

        let jwt_secret = var("JWT_HS256_SECRET").filter(|s| !s.is_empty());
        let public_key_pem = var("ACCESS_JWT_PUBLIC_KEY_PEM")
            .filter(|s| !s.is_empty())
            .map(|s| s.replace("\\n", "\n"));

        let verifier = match (jwt_secret, public_key_pem) {
            (Some(_), Some(_)) => return Err(ConfigError::Invalid("JWT_HS256_SECRET")),
            (Some(secret), None) => VerifierKind::JwtSecret { secret },
            (None, Some(public_key_pem)) => VerifierKind::JwtPublicKey { public_key_pem },
            (None, None) => VerifierKind::Memory {
                tokens_file: var("ACCESS_TOKENS_FILE").map(PathBuf::from),
            },
        };

        let verifier_scope = var("VERIFIER_SCOPE").filter(|s| !s.trim().is_empty());
        let auth_issuer = var("AUTH_ISSUER").filter(|s| !s.is_empty());
        let auth_audience = var("AUTH_AUDIENCE").filter(|s| !s.is_empty());

        let access_token_leeway_seconds = match var("ACCESS_TOKEN_LEEWAY_SECONDS") {
            Some(v) => v
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("ACCESS_TOKEN_LEEWAY_SECONDS"))?,
            None => 60,
        };

        let required_scope = match var("REQUIRED_SCOPE").filter(|s| !s.trim().is_empty()) {
            Some(json) => serde_json::from_str::<RequiredScope>(&json)
                .map_err(|_| ConfigError::Invalid("REQUIRED_SCOPE"))?,
            None => RequiredScope::none(),
        };

        let request_timeout = var("REQUEST_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let body_limit_bytes = var("BODY_LIMIT_BYTES")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        Ok(Self {
            addr,
            app_env,
            www_realm,
            verifier,
            verifier_scope,
            auth_issuer,
            auth_audience,
            access_token_leeway_seconds,
            required_scope,
            request_timeout,
            body_limit_bytes,
        })
    }
}
