//! The fetchEmails pipeline: credentials, fetch, persist

use anyhow::Result;
use log::{error, info};
use std::sync::Arc;

use super::{CredentialManager, MessageFetcher, SummaryWriter};
use crate::callable::{FetchEmailsRequest, FetchEmailsResponse};
use crate::config::{OAuthCredentials, SyncSettings};
use crate::error::{CallableError, UNAUTHENTICATED_MESSAGE};
use crate::gmail::{GmailClient, OAuthClient};
use crate::models::{AuthContext, UserId};
use crate::storage::DocumentStore;

/// Message returned for every failure after credentials were resolved
const PROCESS_FAILED: &str = "Failed to process emails.";

/// Runs one sync per invocation.
///
/// Holds no per-call state; a single instance serves every invocation in
/// the process.
pub struct SyncOrchestrator {
    credentials: CredentialManager,
    fetcher: MessageFetcher,
    writer: SummaryWriter,
}

impl SyncOrchestrator {
    pub fn new(credentials: CredentialManager, fetcher: MessageFetcher, writer: SummaryWriter) -> Self {
        Self {
            credentials,
            fetcher,
            writer,
        }
    }

    /// Wire up every stage from settings, sharing one HTTP agent
    pub fn from_settings(
        oauth: OAuthCredentials,
        settings: &SyncSettings,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self> {
        settings.validate()?;
        let agent = ureq::Agent::new_with_defaults();

        let oauth = OAuthClient::new(
            agent.clone(),
            oauth,
            settings.token_url.as_str(),
            settings.redirect_uri.as_str(),
        );
        let gmail = GmailClient::new(agent, &settings.gmail_base_url);

        Ok(Self::new(
            CredentialManager::new(oauth, store.clone(), settings.fallback_to_code),
            MessageFetcher::new(
                gmail,
                settings.query.as_str(),
                settings.max_results,
                settings.fetch_concurrency,
            )?,
            SummaryWriter::new(store),
        ))
    }

    /// Sync the caller's recent inbox into the document store.
    ///
    /// # Errors
    /// * `unauthenticated` if `auth` is absent (checked before any I/O)
    /// * `invalid-argument` if a first-time caller sent no code
    /// * `internal` for any downstream failure
    pub fn fetch_emails(
        &self,
        auth: Option<&AuthContext>,
        request: &FetchEmailsRequest,
    ) -> Result<FetchEmailsResponse, CallableError> {
        let Some(auth) = auth else {
            return Err(CallableError::unauthenticated(UNAUTHENTICATED_MESSAGE));
        };
        let uid = &auth.uid;
        let start = std::time::Instant::now();

        let token = self.credentials.resolve(uid, request.code.as_deref())?;

        let ids = self.fetcher.list(&token).map_err(|e| internal(uid, e))?;
        if ids.is_empty() {
            info!("No messages to sync for {}", uid);
            return Ok(FetchEmailsResponse::no_new_emails());
        }

        let messages = self
            .fetcher
            .fetch_all(&token, &ids)
            .map_err(|e| internal(uid, e))?;
        let count = self.writer.write(uid, messages).map_err(|e| internal(uid, e))?;

        info!(
            "Synced {} messages for {} in {}ms",
            count,
            uid,
            start.elapsed().as_millis()
        );
        Ok(FetchEmailsResponse::synced(count))
    }
}

fn internal(uid: &UserId, e: anyhow::Error) -> CallableError {
    error!("Error fetching or processing emails for {}: {:#}", uid, e);
    CallableError::internal(PROCESS_FAILED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::storage::InMemoryDocumentStore;

    #[test]
    fn test_unauthenticated_call_does_no_io() {
        // Endpoints point nowhere; any request would fail as internal
        let settings = SyncSettings {
            token_url: "http://127.0.0.1:9/token".to_string(),
            gmail_base_url: "http://127.0.0.1:9".to_string(),
            ..SyncSettings::default()
        };
        let store = Arc::new(InMemoryDocumentStore::new());
        let orchestrator =
            SyncOrchestrator::from_settings(OAuthCredentials::new("id", "secret"), &settings, store)
                .unwrap();

        let err = orchestrator
            .fetch_emails(None, &FetchEmailsRequest::with_code("code"))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }

    #[test]
    fn test_from_settings_rejects_invalid_settings() {
        let settings = SyncSettings {
            max_results: 0,
            ..SyncSettings::default()
        };
        let result = SyncOrchestrator::from_settings(
            OAuthCredentials::new("id", "secret"),
            &settings,
            Arc::new(InMemoryDocumentStore::new()),
        );
        assert!(result.is_err());
    }
}
