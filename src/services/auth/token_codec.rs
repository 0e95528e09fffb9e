//! Credential codec: Claim <-> opaque bearer string.
//!
//! The credential is an HS256 JWT carrying the claim, wrapped once more in
//! URL-safe base64 so callers only ever see a single opaque token.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use thiserror::Error;

use crate::services::auth::claim::Claim;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed credential: {0}")]
    MalformedCredential(String),
    #[error("credential signature is invalid")]
    InvalidSignature,
    #[error("credential expired at {expired_at}")]
    Expired { expired_at: i64 },
    #[error("ttl of {0}s does not fit an expiration timestamp")]
    TtlOutOfRange(u64),
    #[error("failed to sign credential: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// HS256 signer/verifier over an immutable symmetric key.
///
/// Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
    leeway_seconds: u64,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl TokenCodec {
    /// `ttl_seconds == 0` signs credentials without an expiration.
    pub fn new(sign_key: &[u8], ttl_seconds: u64, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is checked in `verify_at` against the caller's clock
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(sign_key),
            decoding_key: DecodingKey::from_secret(sign_key),
            validation,
            ttl_seconds,
            leeway_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn sign(&self, claim: &Claim) -> Result<String, CodecError> {
        self.sign_at(claim, Utc::now())
    }

    /// Sign `claim`, stamping `exp = now + ttl` when a TTL is configured.
    ///
    /// Any expiration already present on `claim` is replaced.
    pub fn sign_at(&self, claim: &Claim, now: DateTime<Utc>) -> Result<String, CodecError> {
        let mut claim = claim.clone();
        claim.expires_at = match self.ttl_seconds {
            0 => None,
            ttl => Some(
                i64::try_from(ttl)
                    .ok()
                    .and_then(|ttl| now.timestamp().checked_add(ttl))
                    .ok_or(CodecError::TtlOutOfRange(ttl))?,
            ),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claim, &self.encoding_key)
            .map_err(CodecError::Signing)?;

        Ok(URL_SAFE_NO_PAD.encode(token))
    }

    pub fn verify(&self, credential: &str) -> Result<Claim, CodecError> {
        self.verify_at(credential, Utc::now())
    }

    /// Unwrap, check the MAC, then check expiration against `now`.
    pub fn verify_at(&self, credential: &str, now: DateTime<Utc>) -> Result<Claim, CodecError> {
        let raw = URL_SAFE_NO_PAD
            .decode(credential.trim())
            .map_err(|e| CodecError::MalformedCredential(e.to_string()))?;
        let token = String::from_utf8(raw)
            .map_err(|_| CodecError::MalformedCredential("credential is not utf-8".into()))?;

        // Past the header every remaining byte is covered by the MAC.
        jsonwebtoken::decode_header(&token)
            .map_err(|e| CodecError::MalformedCredential(e.to_string()))?;

        let claim = jsonwebtoken::decode::<Claim>(&token, &self.decoding_key, &self.validation)
            .map_err(classify)?
            .claims;

        if let Some(expired_at) = claim.expires_at {
            let leeway = i64::try_from(self.leeway_seconds).unwrap_or(i64::MAX);
            if now.timestamp() > expired_at.saturating_add(leeway) {
                return Err(CodecError::Expired { expired_at });
            }
        }

        Ok(claim)
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> CodecError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::Base64(_) => CodecError::InvalidSignature,
        _ => CodecError::MalformedCredential(err.to_string()),
    }
}
