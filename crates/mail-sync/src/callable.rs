//! Request/response types for the callable `fetchEmails` operation
//!
//! The wire envelope follows the callable-function convention: requests
//! arrive as `{"data": ...}`, and replies are either `{"result": ...}` or
//! `{"error": {"status": ..., "message": ...}}`.

use serde::{Deserialize, Serialize};

use crate::error::CallableError;

/// Payload of a sync request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchEmailsRequest {
    /// One-time server auth code; only needed before a refresh token is stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl FetchEmailsRequest {
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
}

/// Successful sync result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchEmailsResponse {
    pub status: ResponseStatus,
    pub message: String,
}

impl FetchEmailsResponse {
    pub const NO_NEW_EMAILS: &'static str = "No new emails found.";

    /// Response for a sync that wrote `count` summaries
    pub fn synced(count: usize) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: format!("{} emails are being synced.", count),
        }
    }

    /// Response for an empty inbox
    pub fn no_new_emails() -> Self {
        Self {
            status: ResponseStatus::Success,
            message: Self::NO_NEW_EMAILS.to_string(),
        }
    }
}

/// Incoming envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallableRequest<T> {
    pub data: T,
}

/// Outgoing envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallableResponse<T> {
    Result(T),
    Error(CallableError),
}

impl<T> From<Result<T, CallableError>> for CallableResponse<T> {
    fn from(result: Result<T, CallableError>) -> Self {
        match result {
            Ok(value) => CallableResponse::Result(value),
            Err(err) => CallableResponse::Error(err),
        }
    }
}
