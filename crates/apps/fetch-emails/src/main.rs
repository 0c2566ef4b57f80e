//! fetch-emails - invoke the Gmail inbox sync once
//!
//! The invoking platform supplies the caller identity (flag or
//! environment) and the request envelope; the response envelope is written
//! to stdout as JSON.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use mail_sync::{
    AuthContext, CallableError, CallableRequest, CallableResponse, FetchEmailsRequest,
    FetchEmailsResponse, OAuthCredentials, SqliteDocumentStore, SyncOrchestrator, SyncSettings,
    UNAUTHENTICATED_MESSAGE, runtime,
};

/// Database filename in the config directory
const DEFAULT_DB_FILE: &str = "mail-sync.sqlite";

#[derive(Debug, Parser)]
#[command(name = "fetch-emails", version, about = "Sync recent Gmail inbox summaries for a user")]
struct Args {
    /// Authenticated caller identity, injected by the invoking platform
    #[arg(long, env = "FETCH_EMAILS_CALLER_UID")]
    uid: Option<String>,

    /// One-time server auth code (shorthand for --data '{"data":{"code":...}}')
    #[arg(long, conflicts_with = "data")]
    code: Option<String>,

    /// Request envelope as JSON, or "-" to read it from stdin
    #[arg(long)]
    data: Option<String>,

    /// SQLite database path (defaults to the config directory)
    #[arg(long, env = "MAIL_SYNC_DB")]
    db: Option<PathBuf>,

    /// Google OAuth client credentials file
    #[arg(long, env = "MAIL_SYNC_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Sync settings file
    #[arg(long, env = "MAIL_SYNC_SETTINGS")]
    settings: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();

    // No identity means no work: answer before touching config or storage
    let auth = match caller(&args) {
        Ok(auth) => auth,
        Err(e) => return respond(Err(e)),
    };

    let request = match read_request(&args) {
        Ok(request) => request,
        Err(e) => {
            error!("Invalid request: {:#}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = init_runtime(&args) {
        error!("Failed to initialize sync runtime: {:#}", e);
        return ExitCode::from(2);
    }

    respond(runtime::invoke(Some(&auth), &request))
}

/// Caller identity from --uid or the environment; empty counts as absent
fn caller(args: &Args) -> Result<AuthContext, CallableError> {
    args.uid
        .as_deref()
        .filter(|uid| !uid.is_empty())
        .map(AuthContext::new)
        .ok_or_else(|| CallableError::unauthenticated(UNAUTHENTICATED_MESSAGE))
}

/// Print the response envelope and map it to an exit code
fn respond(result: Result<FetchEmailsResponse, CallableError>) -> ExitCode {
    let failed = result.is_err();

    match serde_json::to_string(&CallableResponse::from(result)) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            return ExitCode::from(2);
        }
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

/// Build the request from --code or the --data envelope
fn read_request(args: &Args) -> Result<FetchEmailsRequest> {
    if let Some(code) = &args.code {
        return Ok(FetchEmailsRequest::with_code(code));
    }

    let raw = match args.data.as_deref() {
        None => return Ok(FetchEmailsRequest::default()),
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
        Some(json) => json.to_string(),
    };

    let envelope: CallableRequest<FetchEmailsRequest> =
        serde_json::from_str(&raw).context("Request must be a {\"data\": {...}} envelope")?;
    Ok(envelope.data)
}

/// Load configuration and install the process-wide orchestrator
fn init_runtime(args: &Args) -> Result<()> {
    let credentials = match &args.credentials {
        Some(path) => OAuthCredentials::from_file(path)?,
        None => OAuthCredentials::load().with_context(|| {
            format!(
                "OAuth credentials not found; place them at {} or set GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET",
                OAuthCredentials::default_credentials_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<config dir>".to_string())
            )
        })?,
    };

    let settings = match &args.settings {
        Some(path) => SyncSettings::from_file(path)?,
        None => SyncSettings::load()?,
    };

    let db_path = match &args.db {
        Some(path) => path.clone(),
        None => config::init()?.join(DEFAULT_DB_FILE),
    };
    info!("Using document store at {}", db_path.display());
    let store = Arc::new(SqliteDocumentStore::new(&db_path)?);

    runtime::init(SyncOrchestrator::from_settings(credentials, &settings, store)?)?;
    Ok(())
}
