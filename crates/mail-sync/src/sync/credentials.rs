//! Access-token resolution for a caller

use log::{error, info, warn};
use std::sync::Arc;

use crate::error::CallableError;
use crate::gmail::{AccessToken, OAuthClient};
use crate::models::{UserCredentialRecord, UserId};
use crate::storage::DocumentStore;

/// Resolves a usable access token for a user.
///
/// A stored refresh token always takes precedence over a supplied code. A
/// code is only exchanged when no refresh token is stored, or when the
/// refresh is rejected and `fallback_to_code` is enabled.
pub struct CredentialManager {
    oauth: OAuthClient,
    store: Arc<dyn DocumentStore>,
    fallback_to_code: bool,
}

impl CredentialManager {
    pub fn new(oauth: OAuthClient, store: Arc<dyn DocumentStore>, fallback_to_code: bool) -> Self {
        Self {
            oauth,
            store,
            fallback_to_code,
        }
    }

    /// Produce an access token for `uid`.
    ///
    /// # Errors
    /// * `invalid-argument` if no refresh token is stored and `code` is absent or empty
    /// * `internal` if reading the user record, refreshing, exchanging, or
    ///   persisting the new refresh token fails
    pub fn resolve(&self, uid: &UserId, code: Option<&str>) -> Result<AccessToken, CallableError> {
        let doc = self.store.get_user_document(uid).map_err(|e| {
            error!("Error reading user document for {}: {:#}", uid, e);
            CallableError::internal("Failed to load stored credentials.")
        })?;
        let record = doc
            .map(|d| UserCredentialRecord::from_document(&d))
            .unwrap_or_default();
        let code = code.filter(|c| !c.is_empty());

        if let Some(refresh_token) = record.refresh_token {
            match self.oauth.refresh(&refresh_token) {
                Ok(token) => {
                    info!("Refreshed access token for {}", uid);
                    return Ok(token);
                }
                Err(e) => {
                    error!("Error refreshing access token for {}: {:#}", uid, e);
                    match code {
                        Some(code) if self.fallback_to_code => {
                            warn!("Falling back to supplied auth code for {}", uid);
                            return self.exchange(uid, code);
                        }
                        _ => return Err(CallableError::internal("Failed to refresh access token.")),
                    }
                }
            }
        }

        let Some(code) = code else {
            return Err(CallableError::invalid_argument("Server auth code is required."));
        };
        self.exchange(uid, code)
    }

    /// Exchange a one-time code and persist the refresh token it yields
    fn exchange(&self, uid: &UserId, code: &str) -> Result<AccessToken, CallableError> {
        let token = self.oauth.exchange_code(code).map_err(|e| {
            error!("Error exchanging server auth code for {}: {:#}", uid, e);
            CallableError::internal("Token exchange failed.")
        })?;

        match &token.refresh_token {
            Some(refresh_token) => {
                self.store
                    .merge_user_document(uid, UserCredentialRecord::merge_fields(refresh_token))
                    .map_err(|e| {
                        error!("Error saving refresh token for {}: {:#}", uid, e);
                        CallableError::internal("Token exchange failed.")
                    })?;
                info!("Stored new refresh token for {}", uid);
            }
            None => warn!(
                "Code exchange for {} returned no refresh token; the next sync will need a new code",
                uid
            ),
        }
        Ok(token)
    }
}
