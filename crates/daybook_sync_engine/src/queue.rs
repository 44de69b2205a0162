//! Durable queue of not-yet-acknowledged local mutations.

use daybook_core::KeyValueStore;
use daybook_sync_protocol::SyncOperation;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Storage key for the serialized queue.
const QUEUE_KEY: &str = "daybook_sync_queue";

/// Ordered, idempotent queue of pending [`SyncOperation`]s.
///
/// The full queue is serialized as one JSON unit on every mutation; op
/// counts are small and mutations are infrequent relative to poll
/// intervals, so whole-queue writes are acceptable. Order is insertion
/// order and survives process restarts.
///
/// Unparseable persisted state reads as an empty queue rather than an
/// error, matching the fail-closed policy of the other persisted keys.
pub struct OperationQueue {
    kv: Arc<dyn KeyValueStore>,
    /// Serializes load-modify-save sequences across the two loops.
    guard: Mutex<()>,
}

impl OperationQueue {
    /// Creates a queue on top of the given key-value storage.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            guard: Mutex::new(()),
        }
    }

    fn load(&self) -> Vec<SyncOperation> {
        let Some(raw) = self.kv.get(QUEUE_KEY).ok().flatten() else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    fn save(&self, operations: &[SyncOperation]) {
        match serde_json::to_string(operations) {
            Ok(raw) => {
                if let Err(e) = self.kv.set(QUEUE_KEY, &raw) {
                    warn!(error = %e, "failed to persist operation queue");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize operation queue"),
        }
    }

    /// Appends an operation unless its `op_id` is already queued.
    pub fn add(&self, operation: SyncOperation) {
        let _guard = self.guard.lock();
        let mut queue = self.load();
        if queue.iter().any(|op| op.op_id == operation.op_id) {
            return;
        }
        queue.push(operation);
        self.save(&queue);
    }

    /// Returns all pending operations in insertion order.
    pub fn pending(&self) -> Vec<SyncOperation> {
        let _guard = self.guard.lock();
        self.load()
    }

    /// Removes the operations whose `op_id` the server acknowledged.
    pub fn mark_applied(&self, op_ids: &[String]) {
        if op_ids.is_empty() {
            return;
        }
        let _guard = self.guard.lock();
        let applied: HashSet<&str> = op_ids.iter().map(String::as_str).collect();
        let queue: Vec<SyncOperation> = self
            .load()
            .into_iter()
            .filter(|op| !applied.contains(op.op_id.as_str()))
            .collect();
        self.save(&queue);
    }

    /// Removes every queued operation.
    pub fn clear(&self) {
        let _guard = self.guard.lock();
        self.save(&[]);
    }

    /// Returns the number of pending operations.
    pub fn len(&self) -> usize {
        self.pending().len()
    }

    /// Returns true when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending().is_empty()
    }
}
