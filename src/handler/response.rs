//! Response dispatcher: renders a finished `RequestContext` into exactly one
//! HTTP response.
//!
//! | state            | body                                                     |
//! |------------------|----------------------------------------------------------|
//! | errors recorded  | `{"error": [...], "success": false, "request_id": "..."}` |
//! | raw reply        | bytes verbatim with their content type                   |
//! | JSON reply       | `{"success": true, "payload": ...}`                      |
//! | redirect reply   | empty, `Location: <target>`                              |
//! | nothing recorded | empty 200                                                |
//!
//! `x-request-id` is set on all of them.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::handler::context::{Reply, RequestContext};
use crate::middleware::http::REQUEST_ID_HEADER;

#[derive(Serialize)]
struct ErrorResponseBody<'a> {
    error: &'a [ApiError],
    success: bool,
    request_id: &'a str,
}

#[derive(Serialize)]
struct SuccessResponseBody {
    success: bool,
    payload: Value,
}

impl IntoResponse for RequestContext {
    fn into_response(self) -> Response {
        let request_id = self.request_id.clone();
        let mut response = render(self);

        match HeaderValue::from_str(&request_id) {
            Ok(value) => {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            Err(_) => tracing::warn!(%request_id, "request id is not a valid header value"),
        }

        response
    }
}

fn render(ctx: RequestContext) -> Response {
    if ctx.is_err() {
        let status = ctx.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return error_response(status, &ctx.errors, &ctx.request_id);
    }

    let status = ctx.status.unwrap_or(StatusCode::OK);

    match ctx.reply {
        Some(Reply::Json(payload)) => (
            status,
            Json(SuccessResponseBody {
                success: true,
                payload,
            }),
        )
            .into_response(),
        Some(Reply::Raw { body, content_type }) => {
            (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Some(Reply::Redirect(target)) => redirect(status, &target, &ctx.request_id),
        None => {
            tracing::warn!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                path = %ctx.path,
                "endpoint finished without a result"
            );
            StatusCode::OK.into_response()
        }
    }
}

fn error_response(status: StatusCode, errors: &[ApiError], request_id: &str) -> Response {
    let body = ErrorResponseBody {
        error: errors,
        success: false,
        request_id,
    };
    (status, Json(body)).into_response()
}

fn redirect(status: StatusCode, target: &str, request_id: &str) -> Response {
    let status = if status.is_redirection() {
        status
    } else {
        StatusCode::FOUND
    };

    match HeaderValue::from_str(target) {
        Ok(location) => (status, [(header::LOCATION, location)]).into_response(),
        Err(_) => {
            tracing::error!(%request_id, %target, "redirect target is not a valid header value");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &[ApiError::internal("invalid redirect target")],
                request_id,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Method;
    use serde_json::json;

    fn ctx() -> RequestContext {
        RequestContext::new("rid-1", Method::GET, "/hello")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_wraps_payload() {
        let mut ctx = ctx();
        ctx.set_app_response(&json!({"name": "u1"}), StatusCode::CREATED);

        let response = ctx.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "rid-1");
        assert_eq!(
            json_body(response).await,
            json!({"success": true, "payload": {"name": "u1"}})
        );
    }

    #[tokio::test]
    async fn error_body_replaces_payload() {
        let mut ctx = ctx();
        ctx.set_app_response(&"Hello", StatusCode::OK);
        ctx.set_err(ApiError::bad_request("name is required").with_context("field", "name"));

        let response = ctx.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "rid-1");
        assert_eq!(
            json_body(response).await,
            json!({
                "error": [{"message": "name is required", "type": "BadRequest", "field": "name"}],
                "success": false,
                "request_id": "rid-1"
            })
        );
    }

    #[tokio::test]
    async fn raw_bytes_are_written_verbatim() {
        let mut ctx = ctx();
        ctx.set_html_response("<h1>hi</h1>", StatusCode::OK);

        let response = ctx.into_response();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>hi</h1>");
    }

    #[tokio::test]
    async fn redirect_sets_location_without_body() {
        let mut ctx = ctx();
        ctx.set_redirect_response("/api/v1/", StatusCode::SEE_OTHER);

        let response = ctx.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/api/v1/");
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "rid-1");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn non_redirect_status_falls_back_to_found() {
        let mut ctx = ctx();
        ctx.set_redirect_response("/next", StatusCode::OK);
        assert_eq!(ctx.into_response().status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn empty_context_still_renders() {
        let response = ctx().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "rid-1");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }
}
