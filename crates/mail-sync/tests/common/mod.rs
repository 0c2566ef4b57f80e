//! Shared helpers for the integration tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Result, bail};
use mail_sync::models::{MessageId, MessageSummary, UserId};
use mail_sync::storage::{DocumentStore, InMemoryDocumentStore, WriteBatch};
use serde_json::{Map, Value};

/// In-memory store that counts writes and can be told to reject commits
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryDocumentStore,
    commits: AtomicUsize,
    merges: AtomicUsize,
    fail_commits: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn merge_count(&self) -> usize {
        self.merges.load(Ordering::SeqCst)
    }

    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

impl DocumentStore for RecordingStore {
    fn get_user_document(&self, uid: &UserId) -> Result<Option<Map<String, Value>>> {
        self.inner.get_user_document(uid)
    }

    fn merge_user_document(&self, uid: &UserId, fields: Map<String, Value>) -> Result<()> {
        self.inner.merge_user_document(uid, fields)?;
        self.merges.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn commit(&self, batch: WriteBatch) -> Result<usize> {
        if self.fail_commits.load(Ordering::SeqCst) {
            bail!("commit rejected by store");
        }
        let count = self.inner.commit(batch)?;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(count)
    }

    fn get_summary(&self, uid: &UserId, id: &MessageId) -> Result<Option<MessageSummary>> {
        self.inner.get_summary(uid, id)
    }

    fn list_summaries(&self, uid: &UserId) -> Result<Vec<MessageSummary>> {
        self.inner.list_summaries(uid)
    }

    fn count_summaries(&self, uid: &UserId) -> Result<usize> {
        self.inner.count_summaries(uid)
    }
}
