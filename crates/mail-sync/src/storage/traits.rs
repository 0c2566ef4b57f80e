//! Storage trait definitions

use anyhow::Result;
use serde_json::{Map, Value};

use crate::models::{MessageId, MessageSummary, SummaryDocument, UserId};

/// A single set operation inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryWrite {
    pub uid: UserId,
    pub message_id: MessageId,
    pub doc: SummaryDocument,
}

/// A set of summary writes committed all-or-nothing
///
/// Each write fully replaces the document at `(uid, message_id)`. When the
/// same key appears twice, the later write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<SummaryWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a full overwrite of the summary document
    pub fn set(&mut self, uid: &UserId, message_id: MessageId, doc: SummaryDocument) {
        self.writes.push(SummaryWrite {
            uid: uid.clone(),
            message_id,
            doc,
        });
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[SummaryWrite] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<SummaryWrite> {
        self.writes
    }
}

/// Trait for the per-user document store
///
/// Layout mirrors a document database: one user document per uid, and an
/// `emails` sub-collection of summaries keyed by message ID.
pub trait DocumentStore: Send + Sync {
    /// Get the raw user document, if it exists
    fn get_user_document(&self, uid: &UserId) -> Result<Option<Map<String, Value>>>;

    /// Merge fields into the user document, creating it if needed.
    /// Fields not named in `fields` are left untouched.
    fn merge_user_document(&self, uid: &UserId, fields: Map<String, Value>) -> Result<()>;

    /// Commit a batch atomically, stamping every written summary with the
    /// commit time. Returns the number of writes applied.
    fn commit(&self, batch: WriteBatch) -> Result<usize>;

    /// Get one stored summary
    fn get_summary(&self, uid: &UserId, id: &MessageId) -> Result<Option<MessageSummary>>;

    /// List a user's summaries, ordered by message ID
    fn list_summaries(&self, uid: &UserId) -> Result<Vec<MessageSummary>>;

    /// Count a user's summaries
    fn count_summaries(&self, uid: &UserId) -> Result<usize>;
}
