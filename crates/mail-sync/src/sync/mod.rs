//! Sync pipeline
//!
//! Three stages run in sequence for every invocation: credential
//! resolution, metadata fetch, and batched persistence. Re-running a sync
//! is idempotent because summaries are keyed by Gmail message ID.

mod credentials;
mod fetch;
mod orchestrator;
mod writer;

pub use credentials::CredentialManager;
pub use fetch::MessageFetcher;
pub use orchestrator::SyncOrchestrator;
pub use writer::SummaryWriter;
