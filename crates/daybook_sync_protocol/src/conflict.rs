//! Conflict reports from the push endpoint.

use serde::{Deserialize, Serialize};

/// A version mismatch reported by the server for one pushed operation.
///
/// A conflict is a first-class outcome, not an error: the operation stays
/// queued and the client updates its version bookmark from `latest`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conflict {
    /// Idempotency key of the rejected operation, when the server names it.
    pub op_id: Option<String>,
    /// The server's current view of the entity.
    pub latest: Option<ConflictLatest>,
}

impl Conflict {
    /// Creates a conflict naming an operation and the server-side version.
    pub fn new(op_id: impl Into<String>, version: i64) -> Self {
        Self {
            op_id: Some(op_id.into()),
            latest: Some(ConflictLatest {
                version: Some(version),
            }),
        }
    }

    /// Returns the server-side version carried by this conflict, if any.
    pub fn latest_version(&self) -> Option<i64> {
        self.latest.as_ref().and_then(|l| l.version)
    }
}

/// The server's current entity state attached to a conflict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictLatest {
    /// Current server revision of the entity.
    #[serde(rename = "Version")]
    pub version: Option<i64>,
}
