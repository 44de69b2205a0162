//! Applies pulled remote changes to the local record store.

use crate::error::SyncResult;
use crate::mapper::{snapshot_to_patch, RecordPatch};
use chrono::Utc;
use daybook_core::{Record, RecordStore};
use daybook_sync_protocol::PullChange;
use std::sync::Arc;
use tracing::debug;

/// Merges incoming change-feed entries into the local store.
///
/// Writes go directly through the [`RecordStore`], never through the
/// operation queue. That is what prevents pulled changes from being
/// echoed back to the server as if they were local edits.
pub struct PullApplier {
    store: Arc<dyn RecordStore>,
}

impl PullApplier {
    /// Creates an applier writing into the given record store.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Applies a pull batch sequentially, in feed order.
    ///
    /// Deletions of unknown entities are no-ops; changes without a usable
    /// snapshot identifier are skipped. Either way the rest of the batch
    /// still applies.
    pub fn apply(&self, changes: &[PullChange], user_id: Option<&str>) -> SyncResult<()> {
        for change in changes {
            if change.deleted {
                self.store.delete(&change.entity_id)?;
                continue;
            }

            let Some(patch) = snapshot_to_patch(change.snapshot.as_ref(), user_id) else {
                debug!(entity_id = %change.entity_id, "skipping change without usable snapshot");
                continue;
            };

            let existing = self.store.get(&patch.id)?;
            self.store.upsert(merge(existing.as_ref(), patch))?;
        }
        Ok(())
    }
}

/// Merges a snapshot patch over the existing local record.
///
/// Fields the patch carries replace the local values; fields it does not
/// carry (planned start, actual start/end) are preserved. `created_at`
/// is never regressed once a local record exists.
fn merge(existing: Option<&Record>, patch: RecordPatch) -> Record {
    let now = Utc::now();
    Record {
        id: patch.id,
        content: patch.content,
        tags: patch.tags,
        status: patch.status,
        planned_start: existing.and_then(|r| r.planned_start),
        planned_end: patch
            .planned_end
            .or_else(|| existing.and_then(|r| r.planned_end)),
        actual_start: existing.and_then(|r| r.actual_start),
        actual_end: existing.and_then(|r| r.actual_end),
        attachments: patch.attachments,
        version: patch.version,
        user_id: patch
            .user_id
            .or_else(|| existing.and_then(|r| r.user_id.clone())),
        created_at: existing.map(|r| r.created_at).unwrap_or(now),
        updated_at: patch.updated_at,
    }
}
