//! Message summary model persisted per user

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a message (Gmail message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The caller-supplied fields of a summary record.
///
/// `receivedAt` is not part of this type: the store stamps it when the
/// batch containing the document is committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDocument {
    /// Subject header, empty if absent
    pub subject: String,
    /// From header, verbatim, empty if absent
    pub from: String,
    /// Provider-generated plain-text snippet
    pub body_snippet: String,
}

impl SummaryDocument {
    pub fn new(
        subject: impl Into<String>,
        from: impl Into<String>,
        body_snippet: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            from: from.into(),
            body_snippet: body_snippet.into(),
        }
    }
}

/// A stored summary as read back from the document store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    /// Gmail message ID; also the document key
    pub id: MessageId,
    pub subject: String,
    pub from: String,
    pub body_snippet: String,
    /// Server timestamp assigned at commit time
    pub received_at: DateTime<Utc>,
}

impl MessageSummary {
    /// Materialize a stored summary from its written fields and commit time
    pub fn from_document(id: MessageId, doc: SummaryDocument, received_at: DateTime<Utc>) -> Self {
        Self {
            id,
            subject: doc.subject,
            from: doc.from,
            body_snippet: doc.body_snippet,
            received_at,
        }
    }
}
