//! Diagnostic endpoints mounted under `/test` when `ENABLE_TEST_ROUTE` is on.
//! One per requirement tier and response kind.

use axum::{extract::Request, http::StatusCode};
use serde_json::json;

use crate::api::v1::dto::token::{TokenRequest, TokenResponse};
use crate::error::ApiError;
use crate::handler::{RequestContext, decode_json_body};
use crate::services::auth::{Claim, Role};
use crate::state::AppState;

pub async fn issue_token(state: AppState, mut ctx: RequestContext, req: Request) -> RequestContext {
    let body = match decode_json_body::<TokenRequest>(req, state.max_body_bytes).await {
        Ok(body) => body,
        Err(err) => {
            ctx.set_err(err);
            return ctx;
        }
    };
    if body.id.trim().is_empty() {
        ctx.set_err(ApiError::bad_request("id must not be empty").with_context("field", "id"));
        return ctx;
    }

    let role = body.role.map(Role::from).unwrap_or(Role::Normal);
    match state.auth.sign(&Claim::new(body.id, role)) {
        Ok(token) => {
            let ttl = state.auth.ttl_seconds();
            ctx.set_app_response(
                &TokenResponse {
                    token,
                    expires_in: (ttl > 0).then_some(ttl),
                },
                StatusCode::OK,
            );
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to sign credential");
            ctx.set_err(ApiError::internal("failed to issue token"));
        }
    }
    ctx
}

pub async fn whoami(_state: AppState, mut ctx: RequestContext, _req: Request) -> RequestContext {
    let claim = ctx.claim().cloned();
    ctx.set_app_response(&claim, StatusCode::OK);
    ctx
}

pub async fn admin(_state: AppState, mut ctx: RequestContext, _req: Request) -> RequestContext {
    ctx.set_app_response(&json!({"admin": true}), StatusCode::OK);
    ctx
}

pub async fn html(_state: AppState, mut ctx: RequestContext, _req: Request) -> RequestContext {
    ctx.set_html_response("<!doctype html><h1>Hello</h1>", StatusCode::OK);
    ctx
}

pub async fn redirect(_state: AppState, mut ctx: RequestContext, _req: Request) -> RequestContext {
    ctx.set_redirect_response("/api/v1", StatusCode::FOUND);
    ctx
}
