//! Change-feed cursor persistence.

use daybook_core::KeyValueStore;
use std::sync::Arc;
use tracing::warn;

/// Storage key for the cursor.
const CURSOR_KEY: &str = "daybook_sync_cursor";

/// Initial feed position before any sync has happened.
const INITIAL_CURSOR: &str = "0";

/// Persists the opaque change-feed watermark.
///
/// Push and pull share one monotonic feed position, so both loops read
/// and write through this store. The cursor is advanced only from server
/// responses; this type does not interpret its contents.
#[derive(Clone)]
pub struct CursorStore {
    kv: Arc<dyn KeyValueStore>,
}

impl CursorStore {
    /// Creates a cursor store on top of the given key-value storage.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Returns the persisted cursor, or `"0"` when none is stored.
    pub fn get(&self) -> String {
        self.kv
            .get(CURSOR_KEY)
            .ok()
            .flatten()
            .unwrap_or_else(|| INITIAL_CURSOR.to_string())
    }

    /// Persists a new cursor position.
    pub fn set(&self, cursor: &str) {
        if let Err(e) = self.kv.set(CURSOR_KEY, cursor) {
            warn!(error = %e, "failed to persist sync cursor");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_core::MemoryKeyValueStore;

    #[test]
    fn defaults_to_zero() {
        let cursor = CursorStore::new(Arc::new(MemoryKeyValueStore::new()));
        assert_eq!(cursor.get(), "0");
    }

    #[test]
    fn set_then_get() {
        let cursor = CursorStore::new(Arc::new(MemoryKeyValueStore::new()));
        cursor.set("17");
        assert_eq!(cursor.get(), "17");
        cursor.set("42");
        assert_eq!(cursor.get(), "42");
    }
}
