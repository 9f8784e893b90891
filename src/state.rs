/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 *   - gate: the base AuthorizationGate, specialized per route via with_required_scope
 * - Cloned per request, so everything inside is Arc/Clone cheap
 */
use crate::middleware::authorization::AuthorizationGate;

#[derive(Clone, Debug)]
pub struct AppState {
    pub gate: AuthorizationGate,
}

impl AppState {
    pub fn new(gate: AuthorizationGate) -> Self {
        Self { gate }
    }
}
