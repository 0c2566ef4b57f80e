//! Configuration loading for the sync function
//!
//! OAuth client credentials are loaded from (in order of priority):
//! 1. Compile-time embedded credentials (for release builds)
//! 2. JSON file (Google Cloud Console format)
//! 3. Runtime environment variables (fallback)
//!
//! Pipeline tuning lives in [`SyncSettings`], read from an optional JSON file.

use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Credentials filename in the config directory
const CREDENTIALS_FILE: &str = "google-credentials.json";

/// Settings filename in the config directory
const SETTINGS_FILE: &str = "sync-settings.json";

/// Runtime environment variables holding the OAuth client
const CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";
const CLIENT_SECRET_ENV: &str = "GOOGLE_CLIENT_SECRET";

/// OAuth client credentials for the Google token endpoint
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Google Cloud Console credential file format
#[derive(Deserialize)]
struct GoogleCredentialFile {
    installed: Option<ClientSection>,
    web: Option<ClientSection>,
}

#[derive(Deserialize)]
struct ClientSection {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Load credentials using the following priority:
    /// 1. Compile-time embedded credentials
    /// 2. JSON file (~/.config/mail-sync/google-credentials.json)
    /// 3. Runtime environment variables
    pub fn load() -> Result<Self> {
        if let Some(creds) = Self::from_compile_time() {
            return Ok(creds);
        }

        if config::config_exists(CREDENTIALS_FILE) {
            let creds: GoogleCredentialFile = config::load_json(CREDENTIALS_FILE)?;
            return Self::from_credential_file(creds);
        }

        Self::from_env()
    }

    /// Credentials embedded at build time.
    /// Build with: GOOGLE_CLIENT_ID=xxx GOOGLE_CLIENT_SECRET=yyy cargo build --release
    pub fn from_compile_time() -> Option<Self> {
        let client_id = option_env!("GOOGLE_CLIENT_ID")?;
        let client_secret = option_env!("GOOGLE_CLIENT_SECRET")?;

        if client_id.is_empty() || client_secret.is_empty() {
            return None;
        }

        Some(Self::new(client_id, client_secret))
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let creds: GoogleCredentialFile = config::load_json_file(path)?;
        Self::from_credential_file(creds)
    }

    fn from_credential_file(creds: GoogleCredentialFile) -> Result<Self> {
        // Server-side functions usually get a "web" client, but accept both
        let section = creds
            .web
            .or(creds.installed)
            .context("Credentials file missing 'installed' or 'web' section")?;

        Ok(Self::new(section.client_id, section.client_secret))
    }

    /// Parse credentials from JSON string (Google Cloud Console format)
    pub fn from_json(json: &str) -> Result<Self> {
        let creds: GoogleCredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Self::from_credential_file(creds)
    }

    /// Load credentials from environment variables
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var(CLIENT_ID_ENV)
            .with_context(|| format!("{} environment variable not set", CLIENT_ID_ENV))?;
        let client_secret = std::env::var(CLIENT_SECRET_ENV)
            .with_context(|| format!("{} environment variable not set", CLIENT_SECRET_ENV))?;

        if client_id.is_empty() || client_secret.is_empty() {
            bail!("{} and {} must be non-empty", CLIENT_ID_ENV, CLIENT_SECRET_ENV);
        }

        Ok(Self::new(client_id, client_secret))
    }

    /// Default credentials file path (~/.config/mail-sync/google-credentials.json)
    pub fn default_credentials_path() -> Option<PathBuf> {
        config::config_path(CREDENTIALS_FILE)
    }
}

/// Tunables for the sync pipeline
///
/// Every field is optional in the settings file; missing fields take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    /// Maximum number of message IDs listed per sync (Gmail caps pages at 500)
    pub max_results: usize,
    /// Gmail search query used to select messages
    pub query: String,
    /// Number of metadata fetches allowed in flight at once
    pub fetch_concurrency: usize,
    /// Redirect URI registered for the server-side code exchange.
    /// Must match the one the client used; it is never called.
    pub redirect_uri: String,
    /// OAuth token endpoint
    pub token_url: String,
    /// Gmail REST API root (without the `/gmail/v1` suffix)
    pub gmail_base_url: String,
    /// Retry with a supplied authorization code when the stored refresh
    /// token is rejected
    pub fallback_to_code: bool,
}

impl SyncSettings {
    pub const DEFAULT_MAX_RESULTS: usize = 100;
    pub const MAX_RESULTS_LIMIT: usize = 500;
    pub const DEFAULT_QUERY: &'static str = "is:inbox";
    pub const DEFAULT_FETCH_CONCURRENCY: usize = 16;
    pub const DEFAULT_REDIRECT_URI: &'static str = "http://localhost";
    pub const DEFAULT_TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";
    pub const DEFAULT_GMAIL_BASE_URL: &'static str = "https://gmail.googleapis.com";

    /// Load settings from the config directory, or defaults if the file is absent
    pub fn load() -> Result<Self> {
        let settings = if config::config_exists(SETTINGS_FILE) {
            config::load_json(SETTINGS_FILE)?
        } else {
            Self::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let settings: Self = config::load_json_file(path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check ranges and URL syntax
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=Self::MAX_RESULTS_LIMIT).contains(&self.max_results),
            "max_results must be between 1 and {}, got {}",
            Self::MAX_RESULTS_LIMIT,
            self.max_results
        );
        ensure!(self.fetch_concurrency >= 1, "fetch_concurrency must be at least 1");
        ensure!(!self.query.trim().is_empty(), "query must not be empty");

        for (name, value) in [
            ("redirect_uri", &self.redirect_uri),
            ("token_url", &self.token_url),
            ("gmail_base_url", &self.gmail_base_url),
        ] {
            Url::parse(value).with_context(|| format!("Invalid {}: {}", name, value))?;
        }
        Ok(())
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_results: Self::DEFAULT_MAX_RESULTS,
            query: Self::DEFAULT_QUERY.to_string(),
            fetch_concurrency: Self::DEFAULT_FETCH_CONCURRENCY,
            redirect_uri: Self::DEFAULT_REDIRECT_URI.to_string(),
            token_url: Self::DEFAULT_TOKEN_URL.to_string(),
            gmail_base_url: Self::DEFAULT_GMAIL_BASE_URL.to_string(),
            fallback_to_code: false,
        }
    }
}
