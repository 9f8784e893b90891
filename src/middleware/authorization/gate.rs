use std::any::Any;
use std::future::{Future, poll_fn};
use std::sync::Arc;

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::Service;

use super::context::{ClaimsContext, TOKEN_KEY};
use super::layer::GateLayer;
use super::scope::RequiredScope;
use crate::error::{GateError, Rejection};
use crate::services::verifier::{TokenClaims, TokenVerifier, Verification};

/// Bearer-token authorization gate.
///
/// Verifies the request's access token through a [`TokenVerifier`], applies
/// the gate's [`RequiredScope`], records the claims in the [`ClaimsContext`]
/// and only then lets the request through. Rejections are returned as
/// responses and never reach the downstream handler.
///
/// The context is either supplied by the caller ([`new`](Self::new)) or
/// created fresh for every admitted request ([`per_request`](Self::per_request)).
/// Either way the handle written to is also inserted into the forwarded
/// request's extensions.
///
/// Two call conventions share one decision path:
/// - [`invoke`](Self::invoke): continuation style, `next(request, response)`
/// - [`process`](Self::process): delegation to a `tower::Service`
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use resource_gate::middleware::authorization::{AuthorizationGate, ClaimsContext};
/// use resource_gate::services::verifier::MemoryTokenVerifier;
///
/// let base = AuthorizationGate::unrestricted(
///     Arc::new(MemoryTokenVerifier::new()),
///     ClaimsContext::empty(),
/// );
/// let admin_only = base.with_required_scope("admin");
/// ```
#[derive(Clone)]
pub struct AuthorizationGate {
    verifier: Arc<dyn TokenVerifier>,
    // None: a fresh context per admitted request.
    context: Option<ClaimsContext>,
    required_scope: RequiredScope,
}

impl std::fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field("context", &self.context)
            .field("required_scope", &self.required_scope)
            .finish_non_exhaustive()
    }
}

/// Decision of [`AuthorizationGate::authorize`].
pub(crate) enum Outcome {
    /// Claims already inserted into the request extensions.
    Forward(Request<Body>, TokenClaims),
    Reject(Rejection),
}

impl AuthorizationGate {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        context: ClaimsContext,
        required_scope: impl Into<RequiredScope>,
    ) -> Self {
        Self {
            verifier,
            context: Some(context),
            required_scope: required_scope.into(),
        }
    }

    /// Gate that writes into a new, empty context for every admitted request.
    ///
    /// Downstream code reads it from the request extensions
    /// (`Extension<ClaimsContext>`). Nothing outlives the request.
    pub fn per_request(
        verifier: Arc<dyn TokenVerifier>,
        required_scope: impl Into<RequiredScope>,
    ) -> Self {
        Self {
            verifier,
            context: None,
            required_scope: required_scope.into(),
        }
    }

    /// Gate without any scope requirement.
    pub fn unrestricted(verifier: Arc<dyn TokenVerifier>, context: ClaimsContext) -> Self {
        Self::new(verifier, context, RequiredScope::none())
    }

    /// Like [`new`](Self::new), but accepts a type-erased claims context.
    ///
    /// Fails with [`GateError::InvalidConfiguration`] when the context is
    /// neither an index-style map nor a keyed store.
    pub fn try_new(
        verifier: Arc<dyn TokenVerifier>,
        context: Arc<dyn Any + Send + Sync>,
        required_scope: impl Into<RequiredScope>,
    ) -> Result<Self, GateError> {
        let context = ClaimsContext::from_any(context)?;
        Ok(Self::new(verifier, context, required_scope))
    }

    /// New gate with the same verifier and context but a different scope
    /// requirement. `self` is left untouched.
    pub fn with_required_scope(&self, required_scope: impl Into<RequiredScope>) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
            context: self.context.clone(),
            required_scope: required_scope.into(),
        }
    }

    /// New gate writing into another claims context.
    pub fn with_claims_context(&self, context: ClaimsContext) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
            context: Some(context),
            required_scope: self.required_scope.clone(),
        }
    }

    pub fn required_scope(&self) -> &RequiredScope {
        &self.required_scope
    }

    /// The caller-supplied context, `None` for a [`per_request`](Self::per_request) gate.
    pub fn claims_context(&self) -> Option<&ClaimsContext> {
        self.context.as_ref()
    }

    /// Tower layer running this gate in front of a service.
    pub fn layer(&self) -> GateLayer {
        GateLayer::new(self.clone())
    }

    pub(crate) async fn authorize(&self, request: Request<Body>) -> Outcome {
        let (mut parts, body) = request.into_parts();

        let claims = match self.verifier.verify_resource_request(&parts).await {
            Verification::Granted(claims) => claims,
            Verification::Denied(response) => {
                return Outcome::Reject(Rejection::Unauthorized(response));
            }
        };

        if !self
            .required_scope
            .is_satisfied_by(claims.scope.as_deref())
        {
            return Outcome::Reject(Rejection::InsufficientScope);
        }

        parts.extensions.insert(claims.clone());
        Outcome::Forward(Request::from_parts(parts, body), claims)
    }

    // Only called right before the downstream handler runs.
    fn admit(&self, request: &mut Request<Body>, claims: TokenClaims) {
        let context = self.context.clone().unwrap_or_else(ClaimsContext::empty);
        context.set(TOKEN_KEY, claims);
        request.extensions_mut().insert(context);
    }

    /// Continuation-style entry point.
    ///
    /// `next` receives the request and the `response` passed in here as its
    /// starting point. Its result is returned as is.
    pub async fn invoke<N, F>(&self, request: Request<Body>, response: Response, next: N) -> Response
    where
        N: FnOnce(Request<Body>, Response) -> F,
        F: Future<Output = Response>,
    {
        match self.authorize(request).await {
            Outcome::Forward(mut request, claims) => {
                self.admit(&mut request, claims);
                next(request, response).await
            }
            Outcome::Reject(rejection) => rejection.into_response(),
        }
    }

    /// Delegation-style entry point.
    ///
    /// Rejections become `Ok` responses; errors of `handler` propagate
    /// unchanged.
    pub async fn process<S>(&self, request: Request<Body>, mut handler: S) -> Result<Response, S::Error>
    where
        S: Service<Request<Body>, Response = Response>,
    {
        match self.authorize(request).await {
            Outcome::Forward(mut request, claims) => {
                poll_fn(|cx| handler.poll_ready(cx)).await?;
                self.admit(&mut request, claims);
                handler.call(request).await
            }
            Outcome::Reject(rejection) => Ok(rejection.into_response()),
        }
    }
}
