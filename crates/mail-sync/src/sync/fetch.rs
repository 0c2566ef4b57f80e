//! Message listing and concurrent metadata fetch

use anyhow::{Context, Result};
use log::{debug, info};
use rayon::prelude::*;

use crate::gmail::api::GmailMessage;
use crate::gmail::{AccessToken, GmailClient, SUMMARY_HEADERS};
use crate::models::MessageId;

/// Lists recent messages and fetches their metadata.
///
/// Metadata requests fan out over a dedicated worker pool. The fetch is
/// all-or-nothing: the first failure stops dispatch of any request not yet
/// started, in-flight requests run to completion, and the whole call fails.
pub struct MessageFetcher {
    gmail: GmailClient,
    pool: rayon::ThreadPool,
    query: String,
    max_results: usize,
}

impl MessageFetcher {
    /// Create a fetcher
    ///
    /// # Arguments
    /// * `gmail` - Gmail API client
    /// * `query` - Search query selecting candidate messages
    /// * `max_results` - Upper bound on listed messages
    /// * `concurrency` - Maximum number of metadata requests in flight
    pub fn new(
        gmail: GmailClient,
        query: impl Into<String>,
        max_results: usize,
        concurrency: usize,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency.max(1))
            .thread_name(|i| format!("gmail-fetch-{}", i))
            .build()
            .context("Failed to build fetch worker pool")?;

        Ok(Self {
            gmail,
            pool,
            query: query.into(),
            max_results: max_results.clamp(1, GmailClient::MAX_PAGE_SIZE),
        })
    }

    /// List the IDs of the most recent matching messages.
    ///
    /// An empty mailbox yields an empty list, not an error.
    pub fn list(&self, token: &AccessToken) -> Result<Vec<MessageId>> {
        let refs = self
            .gmail
            .list_message_ids(token, &self.query, self.max_results)
            .context("Failed to list messages")?;

        // The API honors maxResults, but never trust it for the bound
        let ids: Vec<MessageId> = refs
            .into_iter()
            .take(self.max_results)
            .map(|r| MessageId::new(r.id))
            .collect();

        debug!("Listed {} message IDs for query {:?}", ids.len(), self.query);
        Ok(ids)
    }

    /// Fetch metadata for every ID, returned in the same order as `ids`
    pub fn fetch_all(&self, token: &AccessToken, ids: &[MessageId]) -> Result<Vec<GmailMessage>> {
        let start = std::time::Instant::now();

        // Collecting into a Result stops scheduling new items once any
        // item has failed; the join completes before we return.
        let messages = self.pool.install(|| {
            ids.par_iter()
                .map(|id| self.gmail.get_message_metadata(token, id, &SUMMARY_HEADERS))
                .collect::<Result<Vec<_>>>()
        })?;

        info!(
            "Fetched metadata for {} messages in {}ms",
            messages.len(),
            start.elapsed().as_millis()
        );
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Mock, ServerGuard};

    fn token() -> AccessToken {
        AccessToken {
            access_token: "ya29.test".to_string(),
            refresh_token: None,
            expires_at: None,
        }
    }

    fn fetcher(server: &ServerGuard, max_results: usize, concurrency: usize) -> MessageFetcher {
        let gmail = GmailClient::new(ureq::Agent::new_with_defaults(), server.url());
        MessageFetcher::new(gmail, "is:inbox", max_results, concurrency).unwrap()
    }

    fn mock_message(server: &mut ServerGuard, id: &str) -> Mock {
        server
            .mock("GET", format!("/gmail/v1/users/me/messages/{}", id).as_str())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"id":"{id}","snippet":"snippet {id}","payload":{{"headers":[{{"name":"Subject","value":"Subject {id}"}}]}}}}"#
            ))
    }

    #[test]
    fn test_list_truncates_to_max_results() {
        let mut server = mockito::Server::new();
        let _list = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(Matcher::UrlEncoded("maxResults".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"messages":[{"id":"a"},{"id":"b"},{"id":"c"}]}"#)
            .create();

        let ids = fetcher(&server, 2, 4).list(&token()).unwrap();
        assert_eq!(ids, vec![MessageId::new("a"), MessageId::new("b")]);
    }

    #[test]
    fn test_list_failure_is_error() {
        let mut server = mockito::Server::new();
        let _list = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(Matcher::Any)
            .with_status(401)
            .create();

        assert!(fetcher(&server, 100, 4).list(&token()).is_err());
    }

    #[test]
    fn test_fetch_all_preserves_order() {
        let mut server = mockito::Server::new();
        let ids: Vec<MessageId> = (1..=12).map(|i| MessageId::new(format!("m{}", i))).collect();
        let mocks: Vec<Mock> = ids
            .iter()
            .map(|id| mock_message(&mut server, id.as_str()).expect(1).create())
            .collect();

        let messages = fetcher(&server, 100, 4).fetch_all(&token(), &ids).unwrap();

        for mock in &mocks {
            mock.assert();
        }
        let fetched: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        let expected: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(fetched, expected);
        assert_eq!(messages[0].snippet, "snippet m1");
    }

    #[test]
    fn test_fetch_all_empty_input() {
        let server = mockito::Server::new();
        assert!(fetcher(&server, 100, 4).fetch_all(&token(), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_first_failure_fails_batch() {
        let mut server = mockito::Server::new();
        let ids: Vec<MessageId> = ["m1", "m2", "m3"].into_iter().map(MessageId::from).collect();
        let _ok1 = mock_message(&mut server, "m1").create();
        let _broken = server
            .mock("GET", "/gmail/v1/users/me/messages/m2")
            .match_query(Matcher::Any)
            .with_status(500)
            .create();
        let _ok3 = mock_message(&mut server, "m3").create();

        assert!(fetcher(&server, 100, 3).fetch_all(&token(), &ids).is_err());
    }

    #[test]
    fn test_failure_stops_unstarted_fetches() {
        let mut server = mockito::Server::new();
        let ids: Vec<MessageId> = ["m1", "m2", "m3", "m4"].into_iter().map(MessageId::from).collect();
        let _broken = server
            .mock("GET", "/gmail/v1/users/me/messages/m1")
            .match_query(Matcher::Any)
            .with_status(500)
            .create();
        let never: Vec<Mock> = ["m2", "m3", "m4"]
            .into_iter()
            .map(|id| mock_message(&mut server, id).expect(0).create())
            .collect();

        // A single worker runs items in order, so nothing after m1 starts
        assert!(fetcher(&server, 100, 1).fetch_all(&token(), &ids).is_err());
        for mock in &never {
            mock.assert();
        }
    }
}
