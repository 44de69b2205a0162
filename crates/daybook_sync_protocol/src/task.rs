//! The server-side task shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outbound task fields, as carried in a push operation's payload.
///
/// This is the lossy direction of the record-task mapping: local-only
/// fields (tags, precise planned-start) have no wire representation in
/// this version of the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    /// Task title.
    pub title: String,
    /// Task status, as a wire string.
    pub status: String,
    /// Due date, when the record has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    /// Attachment identifiers, when the record has any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_ids: Option<Vec<String>>,
}

impl TaskPayload {
    /// Creates a payload with a title and status and nothing else.
    pub fn new(title: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: status.into(),
            due_at: None,
            attachment_ids: None,
        }
    }
}

/// Inbound task fields, as delivered in a pull change's snapshot.
///
/// Every field is optional because the server's serializer and the
/// client's expectations have drifted before; missing or malformed
/// values are resolved to defaults by the change mapper, not here.
/// `DueAt` stays a raw string so an unparseable date can degrade to
/// "no due date" instead of failing the whole change.
///
/// Attachment identifiers have been observed under two key spellings;
/// both are accepted here so the tolerance lives in exactly one place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSnapshot {
    /// Entity identifier.
    #[serde(rename = "ID")]
    pub id: Option<String>,
    /// Task title.
    #[serde(rename = "Title")]
    pub title: Option<String>,
    /// Task status, as a wire string.
    #[serde(rename = "Status")]
    pub status: Option<String>,
    /// Due date as an RFC 3339 string, possibly malformed.
    #[serde(rename = "DueAt")]
    pub due_at: Option<String>,
    /// Server revision of the entity.
    #[serde(rename = "Version")]
    pub version: Option<i64>,
    /// Attachment identifiers.
    #[serde(rename = "AttachmentIDs", alias = "attachment_ids")]
    pub attachment_ids: Option<Vec<String>>,
}

impl TaskSnapshot {
    /// Creates a snapshot with just an identifier, for building up in tests.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn payload_omits_absent_fields() {
        let payload = TaskPayload::new("Untitled", "pending");
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("due_at"));
        assert!(!json.contains("attachment_ids"));
    }

    #[test]
    fn payload_serializes_due_at_as_rfc3339() {
        let mut payload = TaskPayload::new("t", "pending");
        payload.due_at = Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("2024-03-01T12:00:00Z"));
    }

    #[test]
    fn snapshot_accepts_pascal_case_keys() {
        let json = r#"{"ID":"r1","Title":"hello","Status":"completed","Version":7}"#;
        let snapshot: TaskSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.id.as_deref(), Some("r1"));
        assert_eq!(snapshot.title.as_deref(), Some("hello"));
        assert_eq!(snapshot.version, Some(7));
        assert_eq!(snapshot.attachment_ids, None);
    }

    #[test]
    fn snapshot_accepts_both_attachment_spellings() {
        let pascal = r#"{"ID":"r1","AttachmentIDs":["f1","f2"]}"#;
        let snake = r#"{"ID":"r1","attachment_ids":["f1","f2"]}"#;

        let a: TaskSnapshot = serde_json::from_str(pascal).unwrap();
        let b: TaskSnapshot = serde_json::from_str(snake).unwrap();
        assert_eq!(a.attachment_ids, Some(vec!["f1".into(), "f2".into()]));
        assert_eq!(a, b);
    }

    #[test]
    fn snapshot_tolerates_empty_object() {
        let snapshot: TaskSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot, TaskSnapshot::default());
    }

    #[test]
    fn snapshot_keeps_malformed_due_at_as_text() {
        let json = r#"{"ID":"r2","DueAt":"not-a-date"}"#;
        let snapshot: TaskSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.due_at.as_deref(), Some("not-a-date"));
    }
}
