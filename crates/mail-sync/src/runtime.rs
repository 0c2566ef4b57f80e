//! Process-wide sync runtime
//!
//! The orchestrator (HTTP agent, worker pool, store handle) is built once
//! at process start and reused by every invocation. Initialization is
//! explicit: a second `init` is an error, never a silent replacement.

use anyhow::{Result, anyhow};
use log::error;
use std::sync::OnceLock;

use crate::callable::{FetchEmailsRequest, FetchEmailsResponse};
use crate::error::CallableError;
use crate::models::AuthContext;
use crate::sync::SyncOrchestrator;

static RUNTIME: OnceLock<SyncOrchestrator> = OnceLock::new();

/// Install the process-wide orchestrator
pub fn init(orchestrator: SyncOrchestrator) -> Result<&'static SyncOrchestrator> {
    RUNTIME
        .set(orchestrator)
        .map_err(|_| anyhow!("Sync runtime is already initialized"))?;
    instance()
}

/// Get the process-wide orchestrator
pub fn instance() -> Result<&'static SyncOrchestrator> {
    RUNTIME
        .get()
        .ok_or_else(|| anyhow!("Sync runtime has not been initialized"))
}

pub fn is_initialized() -> bool {
    RUNTIME.get().is_some()
}

/// Handle one invocation against the process-wide orchestrator
pub fn invoke(
    auth: Option<&AuthContext>,
    request: &FetchEmailsRequest,
) -> Result<FetchEmailsResponse, CallableError> {
    let orchestrator = instance().map_err(|e| {
        error!("{:#}", e);
        CallableError::internal("Service is not ready.")
    })?;
    orchestrator.fetch_emails(auth, request)
}
