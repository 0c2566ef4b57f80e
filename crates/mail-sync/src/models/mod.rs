//! Domain models for the sync pipeline

mod summary;
mod user;

pub use summary::{MessageId, MessageSummary, SummaryDocument};
pub use user::{AuthContext, UserCredentialRecord, UserId};
