/*
 * Responsibility
 * - GET /health (疎通用)
 * - gate を通さない素の axum handler
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
