//! Factory: build the configured `TokenVerifier` from application `Config`.
use std::sync::Arc;

use crate::config::{Config, VerifierKind};

use super::{JwtTokenVerifier, MemoryTokenVerifier, TokenVerifier, VerifierError};

pub fn build_verifier(config: &Config) -> Result<Arc<dyn TokenVerifier>, VerifierError> {
    let verifier: Arc<dyn TokenVerifier> = match &config.verifier {
        VerifierKind::Memory { tokens_file } => {
            let verifier = match tokens_file {
                Some(path) => MemoryTokenVerifier::from_file(path)?,
                None => MemoryTokenVerifier::new(),
            };
            tracing::info!(tokens = verifier.len(), "using in-memory access token verifier");

            let verifier = verifier.with_realm(config.www_realm.clone());
            match &config.verifier_scope {
                Some(scope) => Arc::new(verifier.with_required_scope(scope.clone())),
                None => Arc::new(verifier),
            }
        }
        VerifierKind::JwtSecret { secret } => {
            Arc::new(configure_jwt(JwtTokenVerifier::from_secret(secret.as_bytes()), config))
        }
        VerifierKind::JwtPublicKey { public_key_pem } => {
            Arc::new(configure_jwt(JwtTokenVerifier::from_ed_pem(public_key_pem)?, config))
        }
    };

    Ok(verifier)
}

fn configure_jwt(verifier: JwtTokenVerifier, config: &Config) -> JwtTokenVerifier {
    let mut verifier = verifier
        .leeway(config.access_token_leeway_seconds)
        .with_realm(config.www_realm.clone());

    if let Some(issuer) = &config.auth_issuer {
        verifier = verifier.issuer(issuer);
    }
    if let Some(audience) = &config.auth_audience {
        verifier = verifier.audience(audience);
    }

    tracing::info!("using jwt access token verifier");
    verifier
}
