//! `handle(requirement, endpoint)`: wraps an endpoint with the gate and the
//! dispatcher and exposes it as a `tower::Service` for axum's router.
//!
//! ```ignore
//! Router::new().route("/hello", post_service(state.handle(Requirement::RequiresClaim, save_hello)))
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use tower::Service;
use tracing::Instrument;

use crate::handler::context::RequestContext;
use crate::handler::gate::{self, Admission, Requirement};
use crate::middleware::http::{REQUEST_ID_HEADER, new_correlation_id};
use crate::services::auth::TokenCodec;

/// Business callback: receives the shared state, the context (claim already
/// attached) and the request; returns the context with its result recorded.
pub trait Endpoint<S>: Clone + Send + Sync + 'static {
    fn call(
        &self,
        state: S,
        ctx: RequestContext,
        req: Request,
    ) -> impl Future<Output = RequestContext> + Send;
}

impl<S, F, Fut> Endpoint<S> for F
where
    F: Fn(S, RequestContext, Request) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = RequestContext> + Send,
{
    fn call(
        &self,
        state: S,
        ctx: RequestContext,
        req: Request,
    ) -> impl Future<Output = RequestContext> + Send {
        self(state, ctx, req)
    }
}

#[derive(Clone)]
pub struct RequestHandler<S, E> {
    requirement: Requirement,
    codec: Arc<TokenCodec>,
    state: S,
    endpoint: E,
}

pub fn handle<S, E>(
    codec: Arc<TokenCodec>,
    state: S,
    requirement: Requirement,
    endpoint: E,
) -> RequestHandler<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Endpoint<S>,
{
    RequestHandler {
        requirement,
        codec,
        state,
        endpoint,
    }
}

impl<S, E> RequestHandler<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Endpoint<S>,
{
    pub fn requirement(&self) -> Requirement {
        self.requirement
    }

    async fn serve(self, req: Request) -> Response {
        let mut ctx = RequestContext::new(
            request_id_of(&req),
            req.method().clone(),
            req.uri().path(),
        );
        let span = tracing::info_span!("request", request_id = %ctx.request_id());

        async move {
            let credential = gate::credential_from_headers(req.headers());

            match gate::evaluate(self.requirement, credential.as_deref(), &self.codec) {
                Admission::Admitted(claim) => {
                    if let Some(claim) = claim {
                        ctx.attach_claim(claim);
                    }
                    ctx = self.endpoint.call(self.state.clone(), ctx, req).await;
                }
                Admission::Rejected(err) => ctx.set_err(err),
            }

            ctx.into_response()
        }
        .instrument(span)
        .await
    }
}

impl<S, E> Service<Request> for RequestHandler<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: Endpoint<S>,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { Ok(this.serve(req).await) })
    }
}

/// Id assigned by `SetRequestIdLayer`, or a fresh one when running without it.
fn request_id_of(req: &Request) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(new_correlation_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::services::auth::{Claim, Role};
    use axum::body::{Body, to_bytes};
    use axum::http::{StatusCode, header};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    #[derive(Clone, Default)]
    struct Calls(Arc<AtomicUsize>);

    async fn whoami(calls: Calls, mut ctx: RequestContext, _req: Request) -> RequestContext {
        calls.0.fetch_add(1, Ordering::SeqCst);
        let subject = ctx.claim().map(|c| c.subject.clone());
        ctx.set_app_response(&subject, StatusCode::OK);
        ctx
    }

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(b"k1", 0, 0))
    }

    fn request(credential: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(credential) = credential {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {credential}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn rejected_request_never_reaches_endpoint() {
        let calls = Calls::default();
        let svc = handle(codec(), calls.clone(), Requirement::RequiresClaim, whoami);

        let response = svc.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(calls.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn admitted_request_runs_endpoint_once_with_claim() {
        let calls = Calls::default();
        let codec = codec();
        let token = codec.sign(&Claim::new("u1", Role::Normal)).unwrap();
        let svc = handle(codec, calls.clone(), Requirement::RequiresClaim, whoami);

        let response = svc.oneshot(request(Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.0.load(Ordering::SeqCst), 1);

        let body: serde_json::Value =
            serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap())
                .unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "payload": "u1"}));
    }

    #[tokio::test]
    async fn incoming_request_id_is_reused() {
        let svc = handle(codec(), Calls::default(), Requirement::Open, whoami);
        let req = Request::builder()
            .uri("/whoami")
            .header(REQUEST_ID_HEADER, "client-id-1")
            .body(Body::empty())
            .unwrap();

        let response = svc.oneshot(req).await.unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "client-id-1");
    }

    #[tokio::test]
    async fn endpoint_errors_are_rendered() {
        async fn failing(_: (), mut ctx: RequestContext, _req: Request) -> RequestContext {
            ctx.set_err(ApiError::not_found("hello not found"));
            ctx
        }

        let svc = handle(codec(), (), Requirement::Open, failing);
        let response = svc.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
