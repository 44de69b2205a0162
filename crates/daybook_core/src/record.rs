//! The Daybook record entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Workflow status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Not started yet.
    #[default]
    Pending,
    /// Currently being worked on.
    InProgress,
    /// Finished.
    Completed,
}

impl RecordStatus {
    /// Returns the wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::InProgress => "in_progress",
            RecordStatus::Completed => "completed",
        }
    }

    /// Parses a wire status string.
    ///
    /// Values outside the known set map to [`RecordStatus::Pending`].
    pub fn parse_or_default(value: &str) -> Self {
        match value {
            "pending" => RecordStatus::Pending,
            "in_progress" => RecordStatus::InProgress,
            "completed" => RecordStatus::Completed,
            _ => RecordStatus::Pending,
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tracked record.
///
/// Records are created and mutated locally; the `version` field is the last
/// revision confirmed by the server. It is only ever advanced from server
/// responses (push acknowledgement or pull snapshot), never incremented by
/// local edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Globally unique, client-generated identifier.
    pub id: String,
    /// Free-form textual content.
    #[serde(default)]
    pub content: String,
    /// Duplicate-free tag set.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Workflow status.
    #[serde(default)]
    pub status: RecordStatus,
    /// Planned start time, if scheduled.
    #[serde(default)]
    pub planned_start: Option<DateTime<Utc>>,
    /// Planned end time, if scheduled.
    #[serde(default)]
    pub planned_end: Option<DateTime<Utc>>,
    /// Actual start time, once work began.
    #[serde(default)]
    pub actual_start: Option<DateTime<Utc>>,
    /// Actual end time, once work finished.
    #[serde(default)]
    pub actual_end: Option<DateTime<Utc>>,
    /// Ordered list of opaque file-storage keys.
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Last server revision known for this record.
    #[serde(default = "default_version")]
    pub version: u64,
    /// Owning user, when known.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last local update time.
    pub updated_at: DateTime<Utc>,
}

fn default_version() -> u64 {
    1
}

impl Record {
    /// Creates a new record with a generated identifier and current
    /// timestamps.
    pub fn new(content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            tags: BTreeSet::new(),
            status: RecordStatus::Pending,
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            attachments: Vec::new(),
            version: 1,
            user_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the planned end time.
    pub fn with_planned_end(mut self, planned_end: DateTime<Utc>) -> Self {
        self.planned_end = Some(planned_end);
        self
    }

    /// Sets the owning user.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_roundtrip() {
        assert_eq!(RecordStatus::parse_or_default("pending"), RecordStatus::Pending);
        assert_eq!(
            RecordStatus::parse_or_default("in_progress"),
            RecordStatus::InProgress
        );
        assert_eq!(
            RecordStatus::parse_or_default("completed"),
            RecordStatus::Completed
        );
        assert_eq!(RecordStatus::Pending.as_str(), "pending");
        assert_eq!(RecordStatus::InProgress.as_str(), "in_progress");
    }

    #[test]
    fn unknown_status_defaults_to_pending() {
        assert_eq!(RecordStatus::parse_or_default("bogus"), RecordStatus::Pending);
        assert_eq!(RecordStatus::parse_or_default(""), RecordStatus::Pending);
    }

    #[test]
    fn new_record_has_unique_id() {
        let a = Record::new("one");
        let b = Record::new("two");
        assert_ne!(a.id, b.id);
        assert_eq!(a.version, 1);
        assert_eq!(a.status, RecordStatus::Pending);
    }

    #[test]
    fn record_serde_roundtrip() {
        let record = Record::new("write report")
            .with_status(RecordStatus::InProgress)
            .with_user_id("u1");
        let json = serde_json::to_string(&record).unwrap();
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn missing_version_defaults_to_one() {
        let json = r#"{
            "id": "r1",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.status, RecordStatus::Pending);
        assert!(record.tags.is_empty());
    }
}
