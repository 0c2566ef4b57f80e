//! In-memory document store
//!
//! Used by tests and by one-off runs that don't need durability.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{DocumentStore, WriteBatch};
use crate::models::{MessageId, MessageSummary, SummaryDocument, UserId};

type SummaryKey = (UserId, MessageId);

/// In-memory implementation of DocumentStore
///
/// Uses maps protected by RwLocks for thread-safe access. A batch is applied
/// under a single write lock, so readers never observe half of it.
pub struct InMemoryDocumentStore {
    users: RwLock<HashMap<UserId, Map<String, Value>>>,
    summaries: RwLock<BTreeMap<SummaryKey, (SummaryDocument, DateTime<Utc>)>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            summaries: RwLock::new(BTreeMap::new()),
        }
    }

    fn read_users(&self) -> Result<RwLockReadGuard<'_, HashMap<UserId, Map<String, Value>>>> {
        self.users.read().map_err(|_| anyhow!("user document lock poisoned"))
    }

    fn read_summaries(
        &self,
    ) -> Result<RwLockReadGuard<'_, BTreeMap<SummaryKey, (SummaryDocument, DateTime<Utc>)>>> {
        self.summaries.read().map_err(|_| anyhow!("summary lock poisoned"))
    }

    fn write_summaries(
        &self,
    ) -> Result<RwLockWriteGuard<'_, BTreeMap<SummaryKey, (SummaryDocument, DateTime<Utc>)>>> {
        self.summaries.write().map_err(|_| anyhow!("summary lock poisoned"))
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get_user_document(&self, uid: &UserId) -> Result<Option<Map<String, Value>>> {
        Ok(self.read_users()?.get(uid).cloned())
    }

    fn merge_user_document(&self, uid: &UserId, fields: Map<String, Value>) -> Result<()> {
        let mut users = self
            .users
            .write()
            .map_err(|_| anyhow!("user document lock poisoned"))?;
        users.entry(uid.clone()).or_default().extend(fields);
        Ok(())
    }

    fn commit(&self, batch: WriteBatch) -> Result<usize> {
        let received_at = Utc::now();
        let count = batch.len();
        let mut summaries = self.write_summaries()?;
        for write in batch.into_writes() {
            summaries.insert((write.uid, write.message_id), (write.doc, received_at));
        }
        Ok(count)
    }

    fn get_summary(&self, uid: &UserId, id: &MessageId) -> Result<Option<MessageSummary>> {
        let summaries = self.read_summaries()?;
        Ok(summaries
            .get(&(uid.clone(), id.clone()))
            .map(|(doc, at)| MessageSummary::from_document(id.clone(), doc.clone(), *at)))
    }

    fn list_summaries(&self, uid: &UserId) -> Result<Vec<MessageSummary>> {
        let summaries = self.read_summaries()?;
        Ok(summaries
            .iter()
            .filter(|((owner, _), _)| owner == uid)
            .map(|((_, id), (doc, at))| MessageSummary::from_document(id.clone(), doc.clone(), *at))
            .collect())
    }

    fn count_summaries(&self, uid: &UserId) -> Result<usize> {
        let summaries = self.read_summaries()?;
        Ok(summaries.keys().filter(|(owner, _)| owner == uid).count())
    }
}
