//! Gmail API integration
//!
//! This module provides:
//! - OAuth2 token refresh and server-side code exchange
//! - Gmail API client for listing messages and fetching metadata
//! - Conversion of metadata responses into summary documents

mod auth;
mod client;
mod normalize;

pub use auth::{AccessToken, OAuthClient};
pub use client::GmailClient;
pub use normalize::{FROM_HEADER, SUBJECT_HEADER, SUMMARY_HEADERS, extract_header, summarize_message};

/// Gmail API response types
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Response from listing messages
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListMessagesResponse {
        pub messages: Option<Vec<MessageRef>>,
    }

    /// Reference to a message
    #[derive(Debug, Clone, Deserialize)]
    pub struct MessageRef {
        pub id: String,
    }

    /// Message as returned by `format=metadata`
    #[derive(Debug, Deserialize)]
    pub struct GmailMessage {
        pub id: String,
        #[serde(default)]
        pub snippet: String,
        pub payload: Option<MessagePayload>,
    }

    /// Message payload; metadata responses only carry headers
    #[derive(Debug, Deserialize)]
    pub struct MessagePayload {
        pub headers: Option<Vec<Header>>,
    }

    /// Email header (name-value pair)
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct Header {
        pub name: String,
        pub value: String,
    }
}
