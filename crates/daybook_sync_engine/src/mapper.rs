//! Translation between the local record shape and the wire task shape.
//!
//! The outbound direction is lossy: tags and the precise planned-start
//! time have no wire representation in this version of the contract. The
//! inbound direction is tolerant: malformed snapshot fields degrade to
//! safe defaults instead of failing a whole pull batch.

use chrono::{DateTime, Utc};
use daybook_core::{Record, RecordStatus};
use daybook_sync_protocol::{TaskPayload, TaskSnapshot};
use std::collections::BTreeSet;

/// Title used when a record's content is empty or whitespace.
const DEFAULT_TITLE: &str = "Untitled";

/// Produces the server-shape task payload for a record.
///
/// The due date is the planned end falling back to the planned start;
/// attachment identifiers are carried only when the record has any.
pub fn record_to_payload(record: &Record) -> TaskPayload {
    let title = if record.content.trim().is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        record.content.clone()
    };
    let due_at = record.planned_end.or(record.planned_start);
    let attachment_ids = if record.attachments.is_empty() {
        None
    } else {
        Some(record.attachments.clone())
    };

    TaskPayload {
        title,
        status: record.status.as_str().to_string(),
        due_at,
        attachment_ids,
    }
}

/// Partial record produced from a server snapshot.
///
/// Fields absent here (planned start, actual start/end) are preserved
/// from the existing local record during the merge; fields present here
/// replace the local values. Tags are always empty because they are not
/// on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPatch {
    /// Entity identifier; always valid and non-empty.
    pub id: String,
    /// Textual content from the snapshot title.
    pub content: String,
    /// Status, defaulting to pending for unknown wire values.
    pub status: RecordStatus,
    /// Attachment identifiers, normalized from either key spelling.
    pub attachments: Vec<String>,
    /// Tags; empty, the wire does not carry them.
    pub tags: BTreeSet<String>,
    /// Planned end, when the snapshot carried a parseable due date.
    pub planned_end: Option<DateTime<Utc>>,
    /// Server revision, at least 1.
    pub version: u64,
    /// Owning user, when the caller supplied one.
    pub user_id: Option<String>,
    /// Time the patch was produced.
    pub updated_at: DateTime<Utc>,
}

/// Maps a pull-change snapshot to a partial record.
///
/// Returns `None` when the snapshot is absent or lacks a usable
/// identifier; callers skip such changes. Unknown statuses read as
/// pending, an unparseable due date reads as "no due date", and a
/// missing or non-positive version reads as 1.
pub fn snapshot_to_patch(snapshot: Option<&TaskSnapshot>, user_id: Option<&str>) -> Option<RecordPatch> {
    let snapshot = snapshot?;
    let id = snapshot
        .id
        .as_deref()
        .filter(|id| !id.is_empty())?
        .to_string();

    let content = snapshot.title.clone().unwrap_or_default();
    let status = snapshot
        .status
        .as_deref()
        .map(RecordStatus::parse_or_default)
        .unwrap_or_default();
    let planned_end = snapshot
        .due_at
        .as_deref()
        .filter(|s| !s.is_empty())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    let version = match snapshot.version {
        Some(v) if v > 0 => v as u64,
        _ => 1,
    };
    let attachments = snapshot.attachment_ids.clone().unwrap_or_default();

    Some(RecordPatch {
        id,
        content,
        status,
        attachments,
        tags: BTreeSet::new(),
        planned_end,
        version,
        user_id: user_id.map(str::to_string),
        updated_at: Utc::now(),
    })
}
