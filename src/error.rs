/*
 * Responsibility
 * - 起動/実行時のエラー (AppError)
 * - handler が RequestContext に積むエラー (ApiError)
 *   - message / type / HTTP status / 任意の context (key-value)
 *   - JSON では `{"message", "type", ...context}` に展開される
 */
use std::borrow::Cow;

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type tags used by the built-in constructors.
pub mod kind {
    pub const BAD_REQUEST: &str = "BadRequest";
    pub const PERMISSION_DENIED: &str = "PermissionDenied";
    pub const NOT_FOUND: &str = "NotFound";
    pub const INTERNAL: &str = "Internal";
}

#[derive(Debug, Clone, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct ApiError {
    message: String,
    #[serde(rename = "type")]
    kind: Cow<'static, str>,
    #[serde(skip)]
    status: StatusCode,
    #[serde(flatten)]
    context: Map<String, Value>,
}

impl ApiError {
    pub fn new(
        kind: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            message: message.into(),
            kind: kind.into(),
            status,
            context: Map::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(kind::BAD_REQUEST, message, StatusCode::BAD_REQUEST)
    }

    /// `status` is 401 for missing/invalid credentials, 403 for insufficient role.
    pub fn permission_denied(message: impl Into<String>, status: StatusCode) -> Self {
        Self::new(kind::PERMISSION_DENIED, message, status)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(kind::NOT_FOUND, message, StatusCode::NOT_FOUND)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(kind::INTERNAL, message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Attach extra diagnostic context. `message` and `type` are reserved.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "message" && key != "type" {
            self.context.insert(key, value.into());
        }
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_is_flattened_next_to_message_and_type() {
        let err = ApiError::bad_request("name is required").with_context("field", "name");

        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"message": "name is required", "type": "BadRequest", "field": "name"})
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn reserved_context_keys_are_dropped() {
        let err = ApiError::not_found("missing").with_context("type", "Other");
        assert_eq!(serde_json::to_value(&err).unwrap()["type"], "NotFound");
    }

    #[test]
    fn custom_kind_keeps_its_status() {
        let err = ApiError::new("QuotaExceeded", "too many greetings", StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.kind(), "QuotaExceeded");
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.to_string(), "QuotaExceeded: too many greetings");
    }
}
