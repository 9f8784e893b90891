//! Tower middleware running the authorization gate in front of a service.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use tower::{Layer, Service};

use super::gate::AuthorizationGate;

/// Tower layer wrapping services with [`GateService`].
#[derive(Clone, Debug)]
pub struct GateLayer {
    gate: AuthorizationGate,
}

impl GateLayer {
    pub fn new(gate: AuthorizationGate) -> Self {
        Self { gate }
    }
}

impl<S> Layer<S> for GateLayer {
    type Service = GateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GateService {
            inner,
            gate: self.gate.clone(),
        }
    }
}

/// Tower service delegating to `inner` only for authorized requests.
///
/// Created by [`GateLayer`]. See [`AuthorizationGate::process`].
#[derive(Clone, Debug)]
pub struct GateService<S> {
    inner: S,
    gate: AuthorizationGate,
}

impl<S> Service<Request<Body>> for GateService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Hand the service that was driven to readiness to the future.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let gate = self.gate.clone();

        Box::pin(async move { gate.process(req, inner).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::authorization::{ClaimsContext, RequiredScope, SharedClaimsMap, TOKEN_KEY};
    use crate::services::verifier::{MemoryTokenVerifier, TokenClaims};
    use axum::http::{StatusCode, header};
    use std::convert::Infallible;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// A minimal inner service that returns 200 OK for any request
    #[derive(Clone)]
    struct OkService;

    impl Service<Request<Body>> for OkService {
        type Response = Response;
        type Error = Infallible;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<Body>) -> Self::Future {
            Box::pin(async { Ok(Response::default()) })
        }
    }

    fn gate(map: &SharedClaimsMap) -> AuthorizationGate {
        let verifier = MemoryTokenVerifier::new().with_token(TokenClaims {
            access_token: "atokenvalue".into(),
            client_id: "a client id".into(),
            user_id: "a user id".into(),
            expires: 99_999_999_900,
            scope: Some("mcp:read".into()),
        });
        AuthorizationGate::unrestricted(Arc::new(verifier), ClaimsContext::indexed(map.clone()))
    }

    fn request(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/foos");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_token_returns_401() {
        let map = SharedClaimsMap::default();
        let service = gate(&map).layer().layer(OkService);

        let resp = service.oneshot(request(None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
        assert!(map.read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn valid_token_passes() {
        let map = SharedClaimsMap::default();
        let service = gate(&map).layer().layer(OkService);

        let resp = service.oneshot(request(Some("atokenvalue"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(map.read().unwrap().contains_key(TOKEN_KEY));
    }

    #[tokio::test]
    async fn insufficient_scope_returns_403() {
        let map = SharedClaimsMap::default();
        let service = gate(&map)
            .with_required_scope(RequiredScope::from("mcp:admin"))
            .layer()
            .layer(OkService);

        let resp = service.oneshot(request(Some("atokenvalue"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(map.read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn service_is_reusable() {
        let map = SharedClaimsMap::default();
        let mut service = gate(&map).layer().layer(OkService);

        for _ in 0..2 {
            let resp = service
                .ready()
                .await
                .unwrap()
                .call(request(Some("atokenvalue")))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }
    }
}
