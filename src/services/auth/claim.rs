/*
 * Responsibility
 * - 認証済み主体 (Claim) の型
 * - credential に埋め込まれる JSON 表現 (id / type / exp) との対応
 */
use serde::{Deserialize, Serialize};

/// Role tag carried by a credential.
///
/// Serialized as `"user"` / `"admin"`. Any unknown tag decodes as `Normal`,
/// so only an explicit admin tag ever grants elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Role {
    Normal,
    Elevated,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Normal => "user",
            Role::Elevated => "admin",
        }
    }
}

impl From<String> for Role {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "admin" | "elevated" => Role::Elevated,
            _ => Role::Normal,
        }
    }
}

impl From<Role> for &'static str {
    fn from(role: Role) -> Self {
        role.as_str()
    }
}

/// One authenticated identity, decoded from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "id")]
    pub subject: String,
    #[serde(rename = "type")]
    pub role: Role,
    /// Unix seconds. Absent when the credential was signed without a TTL.
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl Claim {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
            expires_at: None,
        }
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self.role, Role::Elevated)
    }
}
