//! OAuth2 resource-server authorization gate for axum/tower.
//!
//! The gate ([`middleware::authorization::AuthorizationGate`]) verifies bearer
//! tokens through a pluggable [`services::verifier::TokenVerifier`], enforces
//! OR-of-AND scope requirements and hands validated claims to downstream
//! handlers. The remaining modules wire it into a small resource server.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
