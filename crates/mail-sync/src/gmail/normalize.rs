//! Gmail metadata normalization
//!
//! Converts metadata responses into the summary documents that get stored.

use super::api::{GmailMessage, MessagePayload};
use crate::models::{MessageId, SummaryDocument};

pub const SUBJECT_HEADER: &str = "Subject";
pub const FROM_HEADER: &str = "From";

/// Headers requested for every summary, in request order
pub const SUMMARY_HEADERS: [&str; 2] = [SUBJECT_HEADER, FROM_HEADER];

/// Extract a header value by exact name; the first match wins
pub fn extract_header<'a>(payload: &'a MessagePayload, name: &str) -> Option<&'a str> {
    payload
        .headers
        .as_ref()?
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.as_str())
}

/// Build the stored summary for a fetched message.
///
/// Missing headers (or a missing payload) become empty strings, and the
/// snippet is copied verbatim.
pub fn summarize_message(message: GmailMessage) -> (MessageId, SummaryDocument) {
    let header = |name: &str| {
        message
            .payload
            .as_ref()
            .and_then(|p| extract_header(p, name))
            .unwrap_or_default()
            .to_string()
    };

    let doc = SummaryDocument {
        subject: header(SUBJECT_HEADER),
        from: header(FROM_HEADER),
        body_snippet: message.snippet,
    };
    (MessageId::new(message.id), doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmail::api::Header;

    fn make_payload(headers: Vec<(&str, &str)>) -> MessagePayload {
        MessagePayload {
            headers: Some(
                headers
                    .into_iter()
                    .map(|(n, v)| Header {
                        name: n.to_string(),
                        value: v.to_string(),
                    })
                    .collect(),
            ),
        }
    }

    fn make_message(id: &str, payload: Option<MessagePayload>, snippet: &str) -> GmailMessage {
        GmailMessage {
            id: id.to_string(),
            snippet: snippet.to_string(),
            payload,
        }
    }

    #[test]
    fn test_extract_header() {
        let payload = make_payload(vec![("From", "test@example.com"), ("Subject", "Test Subject")]);

        assert_eq!(extract_header(&payload, "From"), Some("test@example.com"));
        assert_eq!(extract_header(&payload, "Subject"), Some("Test Subject"));
        assert_eq!(extract_header(&payload, "Cc"), None);
    }

    #[test]
    fn test_extract_header_is_case_sensitive() {
        let payload = make_payload(vec![("SUBJECT", "Shouting")]);
        assert_eq!(extract_header(&payload, "Subject"), None);
    }

    #[test]
    fn test_extract_header_first_match_wins() {
        let payload = make_payload(vec![("Subject", "first"), ("Subject", "second")]);
        assert_eq!(extract_header(&payload, "Subject"), Some("first"));
    }

    #[test]
    fn test_summarize_message() {
        let message = make_message(
            "m1",
            Some(make_payload(vec![
                ("Subject", "Quarterly report"),
                ("From", "Grace <grace@example.com>"),
            ])),
            "Numbers are in &amp; look good",
        );

        let (id, doc) = summarize_message(message);
        assert_eq!(id.as_str(), "m1");
        assert_eq!(doc.subject, "Quarterly report");
        assert_eq!(doc.from, "Grace <grace@example.com>");
        // Snippets are stored exactly as Gmail returns them
        assert_eq!(doc.body_snippet, "Numbers are in &amp; look good");
    }

    #[test]
    fn test_summary_reads_every_requested_header() {
        let headers: Vec<(&str, &str)> = SUMMARY_HEADERS.iter().map(|&name| (name, name)).collect();
        let (_, doc) = summarize_message(make_message("m1", Some(make_payload(headers)), ""));

        assert_eq!(doc.subject, SUBJECT_HEADER);
        assert_eq!(doc.from, FROM_HEADER);
    }

    #[test]
    fn test_summarize_message_missing_headers() {
        let (_, doc) = summarize_message(make_message("m2", Some(make_payload(vec![])), "body"));
        assert_eq!(doc.subject, "");
        assert_eq!(doc.from, "");

        let (_, doc) = summarize_message(make_message("m3", None, ""));
        assert_eq!(doc, SummaryDocument::default());
    }
}
