//! JSON request body decoding with client-facing error messages.

use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::{StatusCode, header};
use http_body_util::LengthLimitError;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::error::{ApiError, kind};

/// Decode the whole body of `req` as one JSON value of type `T`.
///
/// Use `#[serde(deny_unknown_fields)]` on `T` to reject unexpected keys.
pub async fn decode_json_body<T: DeserializeOwned>(req: Request, limit: usize) -> Result<T, ApiError> {
    if let Some(content_type) = req.headers().get(header::CONTENT_TYPE) {
        let is_json = content_type
            .to_str()
            .ok()
            .and_then(|v| v.split(';').next())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("application/json"));
        if !is_json {
            return Err(ApiError::bad_request(
                "unsupported content-type request: Content-Type header is not application/json",
            ));
        }
    }

    let bytes = to_bytes(req.into_body(), limit).await.map_err(|err| {
        if is_length_limit(&err) {
            ApiError::new(
                kind::BAD_REQUEST,
                format!("Request body must not be larger than {limit} bytes"),
                StatusCode::PAYLOAD_TOO_LARGE,
            )
        } else {
            ApiError::bad_request(format!("failed to read request body: {err}"))
        }
    })?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request("Request body must not be empty"));
    }

    let mut de = serde_json::Deserializer::from_slice(&bytes);
    let value = <T as serde::Deserialize>::deserialize(&mut de).map_err(describe)?;
    de.end()
        .map_err(|_| ApiError::bad_request("Request body must only contain a single JSON object"))?;

    Ok(value)
}

fn describe(err: serde_json::Error) -> ApiError {
    match err.classify() {
        Category::Syntax => ApiError::bad_request(format!(
            "Request body contains badly-formed JSON (at line {} column {})",
            err.line(),
            err.column()
        )),
        Category::Eof => ApiError::bad_request("Request body contains badly-formed JSON"),
        Category::Data => {
            ApiError::bad_request(format!("Request body contains an invalid value: {err}"))
        }
        Category::Io => ApiError::bad_request(err.to_string()),
    }
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
