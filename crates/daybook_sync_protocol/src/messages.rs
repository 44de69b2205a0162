//! Request and response messages for the sync and auth endpoints.

use crate::conflict::Conflict;
use crate::operation::SyncOperation;
use crate::task::TaskSnapshot;
use serde::{Deserialize, Serialize};

/// Body of `POST /sync/push`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    /// The full pending batch, in queue order.
    pub operations: Vec<SyncOperation>,
}

impl PushRequest {
    /// Creates a push request from a pending batch.
    pub fn new(operations: Vec<SyncOperation>) -> Self {
        Self { operations }
    }
}

/// Response of `POST /sync/push`.
///
/// Push acknowledgements are cursor-bearing because push and pull share
/// one monotonic feed position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushResponse {
    /// Idempotency keys of operations the server applied.
    pub applied: Vec<String>,
    /// Version mismatches, one per rejected operation.
    pub conflicts: Vec<Conflict>,
    /// Feed position after this push.
    pub new_cursor: String,
}

impl PushResponse {
    /// Creates a response acknowledging the given operations.
    pub fn applied(op_ids: &[&str], new_cursor: impl Into<String>) -> Self {
        Self {
            applied: op_ids.iter().map(|s| s.to_string()).collect(),
            conflicts: Vec::new(),
            new_cursor: new_cursor.into(),
        }
    }
}

/// A single entry in the change feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullChange {
    /// Feed position of this change.
    pub cursor: String,
    /// Identifier of the changed entity.
    pub entity_id: String,
    /// Server-side operation name, informational.
    pub operation: String,
    /// The server's current field values, absent for deletes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<TaskSnapshot>,
    /// True when the entity was deleted on the server.
    pub deleted: bool,
}

impl PullChange {
    /// Creates a deletion change.
    pub fn deletion(entity_id: impl Into<String>, cursor: impl Into<String>) -> Self {
        Self {
            cursor: cursor.into(),
            entity_id: entity_id.into(),
            operation: "delete".to_string(),
            snapshot: None,
            deleted: true,
        }
    }

    /// Creates an upsert change carrying a snapshot.
    pub fn upsert(
        entity_id: impl Into<String>,
        cursor: impl Into<String>,
        snapshot: TaskSnapshot,
    ) -> Self {
        Self {
            cursor: cursor.into(),
            entity_id: entity_id.into(),
            operation: "upsert".to_string(),
            snapshot: Some(snapshot),
            deleted: false,
        }
    }
}

/// Response of `GET /sync/pull`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullResponse {
    /// Changes since the requested cursor, in feed order.
    pub changes: Vec<PullChange>,
    /// Feed position after these changes.
    pub next_cursor: String,
}

/// Body of `POST /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// The stored refresh token.
    pub refresh_token: String,
}

/// A bearer credential pair.
///
/// Doubles as the success response of `POST /auth/refresh` and as the
/// persisted session state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionTokens {
    /// Short-lived access token sent as the bearer credential.
    pub access_token: String,
    /// Long-lived token used to mint a new pair.
    pub refresh_token: String,
}

impl SessionTokens {
    /// Creates a token pair.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Returns true when both tokens are present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_response_tolerates_missing_fields() {
        let response: PushResponse = serde_json::from_str("{}").unwrap();
        assert!(response.applied.is_empty());
        assert!(response.conflicts.is_empty());
        assert_eq!(response.new_cursor, "");
    }

    #[test]
    fn push_response_full_shape() {
        let json = r#"{
            "applied": ["op1", "op2"],
            "conflicts": [{"op_id": "op3", "latest": {"Version": 4}}],
            "new_cursor": "17"
        }"#;
        let response: PushResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.applied, vec!["op1", "op2"]);
        assert_eq!(response.conflicts[0].latest_version(), Some(4));
        assert_eq!(response.new_cursor, "17");
    }

    #[test]
    fn pull_change_deleted_defaults_false() {
        let json = r#"{"cursor":"6","entity_id":"r1","operation":"upsert"}"#;
        let change: PullChange = serde_json::from_str(json).unwrap();
        assert!(!change.deleted);
        assert!(change.snapshot.is_none());
    }

    #[test]
    fn pull_response_roundtrip() {
        let response = PullResponse {
            changes: vec![PullChange::deletion("r1", "6")],
            next_cursor: "6".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        let back: PullResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn session_tokens_completeness() {
        assert!(SessionTokens::new("a", "r").is_complete());
        assert!(!SessionTokens::new("", "r").is_complete());
        assert!(!SessionTokens::default().is_complete());
    }
}
