//! Mail sync - Gmail inbox summaries for a per-user document store
//!
//! This crate provides the `fetchEmails` callable operation:
//! - OAuth token refresh and one-time code exchange
//! - Gmail message listing and concurrent metadata fetch
//! - Atomic batched persistence of message summaries
//! - Document store trait with in-memory and SQLite backends
//!
//! The caller identity is always an explicit [`AuthContext`] parameter;
//! nothing is read from ambient request state.

pub mod callable;
pub mod config;
pub mod error;
pub mod gmail;
pub mod models;
pub mod runtime;
pub mod storage;
pub mod sync;

pub use callable::{CallableRequest, CallableResponse, FetchEmailsRequest, FetchEmailsResponse};
pub use crate::config::{OAuthCredentials, SyncSettings};
pub use error::{CallableError, ErrorKind, UNAUTHENTICATED_MESSAGE};
pub use gmail::{AccessToken, GmailClient, OAuthClient};
pub use models::{AuthContext, MessageId, MessageSummary, SummaryDocument, UserCredentialRecord, UserId};
pub use storage::{DocumentStore, InMemoryDocumentStore, SqliteDocumentStore, WriteBatch};
pub use sync::{CredentialManager, MessageFetcher, SummaryWriter, SyncOrchestrator};
