/*
 * Responsibility
 * - / と /hello 系の endpoint
 * - 結果もエラーも RequestContext に積むだけ (レスポンス生成は dispatcher)
 */
use axum::{
    RequestExt,
    extract::{Path, Request},
    http::StatusCode,
};
use uuid::Uuid;

use crate::api::v1::dto::hello::SaveHelloRequest;
use crate::error::ApiError;
use crate::handler::{RequestContext, decode_json_body};
use crate::state::AppState;

pub async fn home(state: AppState, mut ctx: RequestContext, _req: Request) -> RequestContext {
    ctx.set_app_response(&state.hello.say_hello(), StatusCode::OK);
    ctx
}

pub async fn save_hello(state: AppState, mut ctx: RequestContext, req: Request) -> RequestContext {
    let body = match decode_json_body::<SaveHelloRequest>(req, state.max_body_bytes).await {
        Ok(body) => body,
        Err(err) => {
            ctx.set_err(err);
            return ctx;
        }
    };

    // RequiresClaim guarantees a claim here
    let Some(created_by) = ctx.claim().map(|c| c.subject.clone()) else {
        ctx.set_err(ApiError::internal("claim missing on authenticated route"));
        return ctx;
    };

    match state.hello.save_hello(&body.name, &created_by).await {
        Ok(greeting) => ctx.set_app_response(&greeting, StatusCode::CREATED),
        Err(err) => ctx.set_err(err.into()),
    }
    ctx
}

pub async fn get_hello(state: AppState, mut ctx: RequestContext, mut req: Request) -> RequestContext {
    let Ok(Path(id)) = req.extract_parts::<Path<Uuid>>().await else {
        ctx.set_err(ApiError::bad_request("invalid id").with_context("field", "id"));
        return ctx;
    };

    match state.hello.get_hello(id).await {
        Ok(Some(greeting)) => ctx.set_app_response(&greeting, StatusCode::OK),
        Ok(None) => ctx.set_err(ApiError::not_found("hello not found")),
        Err(err) => ctx.set_err(err.into()),
    }
    ctx
}
