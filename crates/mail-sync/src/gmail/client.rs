//! Gmail API HTTP client
//!
//! Lists message IDs and fetches per-message metadata.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};

use super::AccessToken;
use super::api::{GmailMessage, ListMessagesResponse, MessageRef};
use crate::models::MessageId;

/// Gmail API client bound to one API root
#[derive(Clone)]
pub struct GmailClient {
    agent: ureq::Agent,
    base_url: String,
}

impl GmailClient {
    /// Gmail API page size limit
    pub const MAX_PAGE_SIZE: usize = 500;

    /// Create a client
    ///
    /// # Arguments
    /// * `agent` - Shared HTTP agent
    /// * `base_url` - API root, e.g. `https://gmail.googleapis.com`
    pub fn new(agent: ureq::Agent, base_url: impl AsRef<str>) -> Self {
        Self {
            agent,
            base_url: format!("{}/gmail/v1", base_url.as_ref().trim_end_matches('/')),
        }
    }

    /// List message IDs matching a search query, newest first
    ///
    /// Only the first page is read: the sync is bounded to `max_results`.
    ///
    /// # Arguments
    /// * `token` - Access token for the mailbox owner
    /// * `query` - Gmail search query (e.g. `is:inbox`)
    /// * `max_results` - Maximum number of IDs to return (1-500)
    pub fn list_message_ids(
        &self,
        token: &AccessToken,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<MessageRef>> {
        let url = format!("{}/users/me/messages", self.base_url);
        let max_results = max_results.clamp(1, Self::MAX_PAGE_SIZE).to_string();

        let mut response = self
            .agent
            .get(&url)
            .query("maxResults", &max_results)
            .query("q", query)
            .header("Authorization", &token.bearer())
            .call()
            .context("Failed to send list messages request")?;

        let list: ListMessagesResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse list messages response")?;

        Ok(list.messages.unwrap_or_default())
    }

    /// Get message metadata (selected headers and snippet) by ID
    ///
    /// # Arguments
    /// * `token` - Access token for the mailbox owner
    /// * `id` - The message ID to fetch
    /// * `headers` - Header names to include in the payload
    pub fn get_message_metadata(
        &self,
        token: &AccessToken,
        id: &MessageId,
        headers: &[&str],
    ) -> Result<GmailMessage> {
        let url = format!(
            "{}/users/me/messages/{}",
            self.base_url,
            urlencoding::encode(id.as_str())
        );

        let mut request = self
            .agent
            .get(&url)
            .query("format", "metadata")
            .header("Authorization", &token.bearer());
        for header in headers {
            request = request.query("metadataHeaders", *header);
        }

        let mut response = request
            .call()
            .with_context(|| format!("Failed to send get message request for {}", id))?;

        let message: GmailMessage = response
            .body_mut()
            .read_json()
            .with_context(|| format!("Failed to parse message response for {}", id))?;

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn token() -> AccessToken {
        AccessToken {
            access_token: "ya29.test".to_string(),
            refresh_token: None,
            expires_at: None,
        }
    }

    #[test]
    fn test_list_message_ids_sends_query_and_limit() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("maxResults".into(), "100".into()),
                Matcher::UrlEncoded("q".into(), "is:inbox".into()),
            ]))
            .match_header("authorization", "Bearer ya29.test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"messages":[{"id":"m1","threadId":"t1"},{"id":"m2","threadId":"t2"}],"resultSizeEstimate":2}"#,
            )
            .create();

        let client = GmailClient::new(ureq::Agent::new_with_defaults(), server.url());
        let ids = client.list_message_ids(&token(), "is:inbox", 100).unwrap();

        mock.assert();
        let ids: Vec<&str> = ids.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[test]
    fn test_list_message_ids_empty_mailbox() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"resultSizeEstimate":0}"#)
            .create();

        let client = GmailClient::new(ureq::Agent::new_with_defaults(), server.url());
        assert!(client.list_message_ids(&token(), "is:inbox", 100).unwrap().is_empty());
    }

    #[test]
    fn test_get_message_metadata() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/gmail/v1/users/me/messages/m1")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("format".into(), "metadata".into()),
                Matcher::Regex("metadataHeaders=Subject&metadataHeaders=From".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "id": "m1",
                    "threadId": "t1",
                    "snippet": "See you tomorrow",
                    "payload": {
                        "mimeType": "multipart/alternative",
                        "headers": [
                            {"name": "Subject", "value": "Lunch"},
                            {"name": "From", "value": "Ada <ada@example.com>"}
                        ]
                    }
                }"#,
            )
            .create();

        let client = GmailClient::new(ureq::Agent::new_with_defaults(), format!("{}/", server.url()));
        let message = client
            .get_message_metadata(&token(), &MessageId::new("m1"), &["Subject", "From"])
            .unwrap();

        mock.assert();
        assert_eq!(message.id, "m1");
        assert_eq!(message.snippet, "See you tomorrow");
        assert_eq!(message.payload.unwrap().headers.unwrap().len(), 2);
    }

    #[test]
    fn test_get_message_metadata_not_found() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/gmail/v1/users/me/messages/gone")
            .match_query(Matcher::Any)
            .with_status(404)
            .create();

        let client = GmailClient::new(ureq::Agent::new_with_defaults(), server.url());
        let err = client
            .get_message_metadata(&token(), &MessageId::new("gone"), &["Subject"])
            .unwrap_err();
        assert!(format!("{:#}", err).contains("gone"));
    }
}
