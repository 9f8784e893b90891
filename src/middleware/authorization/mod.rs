//! Bearer-token authorization gate.
//!
//! - verify the access token (delegated to a [`TokenVerifier`](crate::services::verifier::TokenVerifier))
//! - enforce the route's [`RequiredScope`]
//! - store the claims under `"token"` in the [`ClaimsContext`] (supplied, or fresh per request)
//!   and put both the claims and the context into the request extensions
//! - forward, or answer with the verifier's error / a 403 `insufficient_scope`
//!
//! Usable as an axum middleware ([`apply`]), a tower layer ([`GateLayer`]) or
//! directly via [`AuthorizationGate::invoke`] / [`AuthorizationGate::process`].

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};

mod context;
mod gate;
mod layer;
mod scope;

pub use context::{ClaimsContext, ClaimsMap, ClaimsStore, SharedClaimsMap, TOKEN_KEY};
pub use gate::AuthorizationGate;
pub use layer::{GateLayer, GateService};
pub use scope::{RequiredScope, ScopeAlternative};

/// Put `gate` in front of every route of `router`.
///
/// Example:
/// ```ignore
/// let foos = Router::new().route("/foos", get(list_foos));
/// let foos = middleware::authorization::apply(foos, gate.clone());
/// let admin = middleware::authorization::apply(admin, gate.with_required_scope("admin"));
/// ```
pub fn apply<S>(router: Router<S>, gate: AuthorizationGate) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // route_layer: unmatched paths stay 404 instead of turning into 401.
    router.route_layer(middleware::from_fn_with_state(gate, gate_middleware))
}

/// axum adapter over [`AuthorizationGate::invoke`].
pub async fn gate_middleware(
    State(gate): State<AuthorizationGate>,
    request: Request,
    next: Next,
) -> Response {
    gate.invoke(request, Response::default(), |request, _| next.run(request))
        .await
}
