//! Per-request accumulator threaded from the gate, through the endpoint, into
//! the dispatcher.

use axum::body::Bytes;
use axum::http::{HeaderValue, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::services::auth::Claim;

/// Successful result an endpoint can record.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Raw { body: Bytes, content_type: HeaderValue },
    Redirect(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Json,
    Raw,
    Redirect,
    Error,
}

/// Exclusively owned by the task serving one request.
///
/// At most one `Reply` is ever kept. Recording an error switches the kind to
/// `Error` for good; any reply set before or after is ignored by the dispatcher.
#[derive(Debug)]
pub struct RequestContext {
    pub(super) request_id: String,
    pub(super) method: Method,
    pub(super) path: String,
    pub(super) claim: Option<Claim>,
    pub(super) status: Option<StatusCode>,
    pub(super) reply: Option<Reply>,
    pub(super) errors: Vec<ApiError>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            method,
            path: path.into(),
            claim: None,
            status: None,
            reply: None,
            errors: Vec::new(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The verified claim, if the request carried a valid credential.
    pub fn claim(&self) -> Option<&Claim> {
        self.claim.as_ref()
    }

    pub(crate) fn attach_claim(&mut self, claim: Claim) {
        self.claim = Some(claim);
    }

    pub fn is_err(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ApiError] {
        &self.errors
    }

    pub fn kind(&self) -> Option<ResponseKind> {
        if self.is_err() {
            return Some(ResponseKind::Error);
        }
        self.reply.as_ref().map(|reply| match reply {
            Reply::Json(_) => ResponseKind::Json,
            Reply::Raw { .. } => ResponseKind::Raw,
            Reply::Redirect(_) => ResponseKind::Redirect,
        })
    }

    /// Status of the latest recorded error, otherwise of the reply.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Record a JSON success payload, rendered as `{"success": true, "payload": ...}`.
    pub fn set_app_response<T: Serialize>(&mut self, payload: &T, status: StatusCode) {
        match serde_json::to_value(payload) {
            Ok(value) => self.set_reply(Reply::Json(value), status),
            Err(err) => {
                tracing::error!(request_id = %self.request_id, error = %err, "failed to serialize payload");
                self.set_err(ApiError::internal("failed to serialize response"));
            }
        }
    }

    pub fn set_html_response(&mut self, body: impl Into<Bytes>, status: StatusCode) {
        self.set_raw_response(
            body,
            HeaderValue::from_static("text/html; charset=utf-8"),
            status,
        );
    }

    pub fn set_raw_response(
        &mut self,
        body: impl Into<Bytes>,
        content_type: HeaderValue,
        status: StatusCode,
    ) {
        self.set_reply(
            Reply::Raw {
                body: body.into(),
                content_type,
            },
            status,
        );
    }

    /// `status` should be a 3xx code; anything else is rendered as 302.
    pub fn set_redirect_response(&mut self, target: impl Into<String>, status: StatusCode) {
        self.set_reply(Reply::Redirect(target.into()), status);
    }

    pub fn set_err(&mut self, err: ApiError) {
        self.status = Some(err.status());
        self.errors.push(err);
    }

    pub fn set_errs<I>(&mut self, errs: I)
    where
        I: IntoIterator<Item = ApiError>,
    {
        for err in errs {
            self.set_err(err);
        }
    }

    fn set_reply(&mut self, reply: Reply, status: StatusCode) {
        if self.is_err() {
            tracing::debug!(request_id = %self.request_id, "reply ignored: request already failed");
            return;
        }
        if self.reply.is_some() {
            tracing::warn!(request_id = %self.request_id, path = %self.path, "reply already set; keeping the first one");
            return;
        }
        self.reply = Some(reply);
        self.status = Some(status);
    }
}
