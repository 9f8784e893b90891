/*
 * Responsibility
 * - v1 URL structure
 * - /health is public; /foos and /admin sit behind the gate
 * - Per-route scope: the base gate is specialized with with_required_scope
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{
    foos::{admin_overview, list_foos, update_foos},
    health::health,
};
use crate::middleware::authorization;
use crate::state::AppState;

pub const ADMIN_SCOPE: &str = "admin";

pub fn routes(state: &AppState) -> Router<AppState> {
    let foos = Router::new().route("/foos", get(list_foos).patch(update_foos));
    let foos = authorization::apply(foos, state.gate.clone());

    let admin = Router::new().route("/admin", get(admin_overview));
    let admin = authorization::apply(admin, state.gate.with_required_scope(ADMIN_SCOPE));

    Router::new()
        .route("/health", get(health))
        .merge(foos)
        .merge(admin)
}
