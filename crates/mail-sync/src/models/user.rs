//! Caller identity and the per-user credential record

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque user identity assigned by the invoking platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authentication context injected by the platform for a single call.
///
/// An invocation without one is rejected before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub uid: UserId,
}

impl AuthContext {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: UserId::new(uid),
        }
    }
}

/// View of the user document fields this system reads and writes.
///
/// The user document may carry other fields owned by other writers; this
/// type never round-trips them, writes go through a merge instead.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UserCredentialRecord {
    /// Long-lived Gmail refresh token, if one was ever obtained
    pub refresh_token: Option<String>,
}

impl UserCredentialRecord {
    /// Field name of the refresh token inside the user document
    pub const REFRESH_TOKEN_FIELD: &'static str = "gmailRefreshToken";

    /// Read the record out of a raw user document.
    ///
    /// Non-string or empty values are treated as "no credential".
    pub fn from_document(doc: &Map<String, Value>) -> Self {
        let refresh_token = doc
            .get(Self::REFRESH_TOKEN_FIELD)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self { refresh_token }
    }

    /// Fields to merge into the user document when a refresh token is stored
    pub fn merge_fields(refresh_token: &str) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(
            Self::REFRESH_TOKEN_FIELD.to_string(),
            Value::String(refresh_token.to_string()),
        );
        fields
    }
}

impl std::fmt::Debug for UserCredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentialRecord")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
