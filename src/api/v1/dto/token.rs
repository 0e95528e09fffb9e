use serde::{Deserialize, Serialize};

/// Body of `POST /test/token`. `type` defaults to a normal user.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenRequest {
    pub id: String,
    #[serde(rename = "type", default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}
