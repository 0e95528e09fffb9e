//! Authorization gate evaluated before an endpoint runs.
//!
//! Order matters:
//! 1. a presented credential is always verified, even on `Open` endpoints
//! 2. a verified claim is attached
//! 3. `RequiresClaim` / `RequiresElevated` without a claim is rejected (401)
//! 4. `RequiresElevated` with a non-elevated claim is rejected (403)
//!
//! Every rejection is a `PermissionDenied` error; the codec's sub-cause only
//! reaches the log.

use axum::http::{HeaderMap, StatusCode, header};
use chrono::{DateTime, Utc};

use crate::error::ApiError;
use crate::services::auth::{Claim, TokenCodec};

/// Declared once per endpoint at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Open,
    RequiresClaim,
    RequiresElevated,
}

#[derive(Debug)]
pub enum Admission {
    /// The endpoint runs exactly once, with the claim if one was presented.
    Admitted(Option<Claim>),
    /// The endpoint never runs.
    Rejected(ApiError),
}

pub fn evaluate(requirement: Requirement, credential: Option<&str>, codec: &TokenCodec) -> Admission {
    evaluate_at(requirement, credential, codec, Utc::now())
}

pub fn evaluate_at(
    requirement: Requirement,
    credential: Option<&str>,
    codec: &TokenCodec,
    now: DateTime<Utc>,
) -> Admission {
    let claim = match credential {
        Some(credential) => match codec.verify_at(credential, now) {
            Ok(claim) => Some(claim),
            Err(err) => {
                tracing::warn!(error = %err, ?requirement, "credential verification failed");
                return Admission::Rejected(ApiError::permission_denied(
                    "failed to verify token",
                    StatusCode::UNAUTHORIZED,
                ));
            }
        },
        None => None,
    };

    match (requirement, claim.as_ref()) {
        (Requirement::Open, _) => {}
        (_, None) => {
            return Admission::Rejected(ApiError::permission_denied(
                "auth token required",
                StatusCode::UNAUTHORIZED,
            ));
        }
        (Requirement::RequiresElevated, Some(claim)) if !claim.is_elevated() => {
            tracing::warn!(subject = %claim.subject, "elevation required");
            return Admission::Rejected(ApiError::permission_denied(
                "permission denied: required admin user role",
                StatusCode::FORBIDDEN,
            ));
        }
        _ => {}
    }

    Admission::Admitted(claim)
}

/// Credential from `Authorization`, with or without a `Bearer ` prefix.
///
/// An empty header counts as absent. A header that is not valid UTF-8 is
/// still returned (lossily) so the gate rejects it instead of ignoring it.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?;
    let raw = String::from_utf8_lossy(value.as_bytes());
    let token = raw.strip_prefix("Bearer ").unwrap_or(&raw).trim();

    (!token.is_empty()).then(|| token.to_owned())
}
