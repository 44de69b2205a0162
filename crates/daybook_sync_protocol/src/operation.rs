//! Queued local mutations.

use crate::task::TaskPayload;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of local mutation carried by a [`SyncOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// The entity was created locally.
    Create,
    /// The entity was updated locally.
    Update,
    /// The entity was deleted locally.
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Generates a fresh operation idempotency key.
pub fn new_op_id() -> String {
    Uuid::new_v4().to_string()
}

/// One not-yet-confirmed local mutation.
///
/// The `op_id` is a client-generated idempotency key: the queue holds at
/// most one entry per `op_id`, and the server deduplicates on it when a
/// batch is retried. `base_version` is the record revision the client
/// believed current when the edit was made; the server uses it for
/// conflict detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOperation {
    /// Client-generated idempotency key.
    pub op_id: String,
    /// Identifier of the affected entity.
    pub entity_id: String,
    /// Kind of mutation.
    pub operation: OperationKind,
    /// Record revision the client believed current when editing.
    #[serde(default)]
    pub base_version: u64,
    /// Wire-shape fields being written (absent for deletes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<TaskPayload>,
}

impl SyncOperation {
    /// Creates a `create` operation with a fresh `op_id`.
    pub fn create(entity_id: impl Into<String>, payload: TaskPayload) -> Self {
        Self {
            op_id: new_op_id(),
            entity_id: entity_id.into(),
            operation: OperationKind::Create,
            base_version: 0,
            payload: Some(payload),
        }
    }

    /// Creates an `update` operation with a fresh `op_id`.
    pub fn update(entity_id: impl Into<String>, base_version: u64, payload: TaskPayload) -> Self {
        Self {
            op_id: new_op_id(),
            entity_id: entity_id.into(),
            operation: OperationKind::Update,
            base_version,
            payload: Some(payload),
        }
    }

    /// Creates a `delete` operation with a fresh `op_id`.
    pub fn delete(entity_id: impl Into<String>, base_version: u64) -> Self {
        Self {
            op_id: new_op_id(),
            entity_id: entity_id.into(),
            operation: OperationKind::Delete,
            base_version,
            payload: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&OperationKind::Create).unwrap(),
            "\"create\""
        );
        assert_eq!(
            serde_json::to_string(&OperationKind::Delete).unwrap(),
            "\"delete\""
        );
        let kind: OperationKind = serde_json::from_str("\"update\"").unwrap();
        assert_eq!(kind, OperationKind::Update);
    }

    #[test]
    fn delete_omits_payload() {
        let op = SyncOperation::delete("r1", 3);
        let json = serde_json::to_string(&op).unwrap();
        assert!(!json.contains("payload"));
        assert!(json.contains("\"base_version\":3"));
    }

    #[test]
    fn constructors_assign_distinct_op_ids() {
        let a = SyncOperation::delete("r1", 1);
        let b = SyncOperation::delete("r1", 1);
        assert_ne!(a.op_id, b.op_id);
    }

    #[test]
    fn operation_json_roundtrip() {
        let op = SyncOperation::create("r1", TaskPayload::new("buy milk", "pending"));
        let json = serde_json::to_string(&op).unwrap();
        let back: SyncOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }
}
