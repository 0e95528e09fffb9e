//! HTTP-level middleware (cross-cutting concerns).
//!
//! Responsibility:
//! - Correlation id generation + propagation (`x-request-id`)
//! - Access logging / request tracing (TraceLayer), switchable from Config
//! - Body size limit
//! - Global timeout
//!
//! Layer order, outermost first: request id -> propagate -> error handling ->
//! body limit -> timeout -> (trace) -> router. Everything that produces a
//! response sits inside the propagate layer, so the header is never missing.

use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::{HeaderName, HeaderValue, Request, Response, StatusCode};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{Level, Span};
use uuid::Uuid;

use crate::config::Config;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Two random v4 UUIDs joined by `-`.
///
/// Drawn from the OS RNG, so concurrent tasks need no shared counter.
pub fn new_correlation_id() -> String {
    format!("{}-{}", Uuid::new_v4(), Uuid::new_v4())
}

/// `MakeRequestId` for `SetRequestIdLayer`. A client-supplied id is kept by
/// the layer; this only runs when the header is missing.
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeCorrelationId;

impl MakeRequestId for MakeCorrelationId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&new_correlation_id())
            .ok()
            .map(RequestId::new)
    }
}

pub fn apply(router: Router, config: &Config) -> Router {
    let router = if config.enable_request_log {
        router.layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    let request_id = req
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default();
                    tracing::span!(
                        Level::INFO,
                        "http",
                        method = %req.method(),
                        path = %req.uri().path(),
                        %request_id
                    )
                })
                .on_response(|res: &Response<_>, latency: Duration, _span: &Span| {
                    tracing::info!(
                        status = %res.status(),
                        elapsed_us = latency.as_micros() as u64,
                        "response"
                    );
                }),
        )
    } else {
        router
    };

    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id_header.clone(), MakeCorrelationId))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        // Make the service error `Infallible` by converting errors into responses.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                tracing::error!(error = %err, "unhandled middleware error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        .layer(RequestBodyLimitLayer::new(config.max_request_body_bytes))
        .layer(TimeoutLayer::new(config.request_timeout));

    router.layer(layers)
}
