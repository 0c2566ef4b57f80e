//! Summary persistence

use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;

use crate::gmail::api::GmailMessage;
use crate::gmail::summarize_message;
use crate::models::UserId;
use crate::storage::{DocumentStore, WriteBatch};

/// Turns fetched messages into summaries and commits them in one batch
pub struct SummaryWriter {
    store: Arc<dyn DocumentStore>,
}

impl SummaryWriter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Build the batch of summary writes for `uid`
    pub fn build_batch(uid: &UserId, messages: Vec<GmailMessage>) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for message in messages {
            let (id, doc) = summarize_message(message);
            batch.set(uid, id, doc);
        }
        batch
    }

    /// Summarize and commit; returns the number of messages synced
    pub fn write(&self, uid: &UserId, messages: Vec<GmailMessage>) -> Result<usize> {
        let batch = Self::build_batch(uid, messages);
        let count = self
            .store
            .commit(batch)
            .with_context(|| format!("Failed to commit summaries for {}", uid))?;
        info!("Committed {} summaries for {}", count, uid);
        Ok(count)
    }
}
