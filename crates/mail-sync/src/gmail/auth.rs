//! Gmail OAuth2 token handling
//!
//! The function never runs an interactive consent flow itself. The client
//! app obtains a one-time server auth code, which is exchanged here for a
//! token pair; afterwards the stored refresh token is used.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result, ensure};
use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::Deserialize;

use crate::config::OAuthCredentials;

/// Short-lived credential for Gmail API calls
#[derive(Clone)]
pub struct AccessToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Authorization header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token response from Google
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    #[allow(dead_code)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_access_token(self) -> Result<AccessToken> {
        ensure!(!self.access_token.is_empty(), "Token response has an empty access token");
        Ok(AccessToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            expires_at: self
                .expires_in
                .and_then(Duration::try_seconds)
                .and_then(|d| Utc::now().checked_add_signed(d)),
        })
    }
}

/// Client for the OAuth2 token endpoint
pub struct OAuthClient {
    agent: ureq::Agent,
    credentials: OAuthCredentials,
    token_url: String,
    redirect_uri: String,
}

impl OAuthClient {
    /// Create a token client
    ///
    /// # Arguments
    /// * `agent` - Shared HTTP agent
    /// * `credentials` - OAuth client ID and secret
    /// * `token_url` - Token endpoint URL
    /// * `redirect_uri` - Redirect URI registered with the client; only echoed
    ///   back during code exchange
    pub fn new(
        agent: ureq::Agent,
        credentials: OAuthCredentials,
        token_url: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            agent,
            credentials,
            token_url: token_url.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Exchange a stored refresh token for a fresh access token.
    ///
    /// Google does not always return a new refresh token; when it doesn't,
    /// the one passed in is carried on the result.
    pub fn refresh(&self, refresh_token: &str) -> Result<AccessToken> {
        debug!("Refreshing access token");
        let mut response = self
            .agent
            .post(&self.token_url)
            .send_form([
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .context("Failed to refresh access token")?;

        let token: TokenResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse refresh token response")?;

        let mut token = token.into_access_token()?;
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }
        Ok(token)
    }

    /// Exchange a one-time authorization code for a token pair
    pub fn exchange_code(&self, code: &str) -> Result<AccessToken> {
        debug!("Exchanging authorization code");
        let mut response = self
            .agent
            .post(&self.token_url)
            .send_form([
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .context("Failed to exchange authorization code")?;

        let token: TokenResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse token response")?;

        token.into_access_token()
    }
}
