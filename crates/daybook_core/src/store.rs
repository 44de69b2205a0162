//! Local record store.

use crate::error::CoreResult;
use crate::record::Record;
use parking_lot::RwLock;
use std::collections::HashMap;

/// The host application's local record table.
///
/// The sync layer reads and writes records through this trait only; it never
/// assumes anything about the backing storage. Implementations must be
/// thread-safe because the push and pull loops run concurrently.
pub trait RecordStore: Send + Sync {
    /// Returns the record with the given identifier, if present.
    fn get(&self, id: &str) -> CoreResult<Option<Record>>;

    /// Inserts or replaces a record.
    fn upsert(&self, record: Record) -> CoreResult<()>;

    /// Removes a record.
    ///
    /// Removing a record that does not exist is not an error.
    fn delete(&self, id: &str) -> CoreResult<()>;

    /// Returns all records, in unspecified order.
    fn list(&self) -> CoreResult<Vec<Record>>;
}

/// An in-memory record store.
///
/// Suitable for tests and for hosts that persist records themselves.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, Record>>,
}

impl MemoryRecordStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records in the store.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, id: &str) -> CoreResult<Option<Record>> {
        Ok(self.records.read().get(id).cloned())
    }

    fn upsert(&self, record: Record) -> CoreResult<()> {
        self.records.write().insert(record.id.clone(), record);
        Ok(())
    }

    fn delete(&self, id: &str) -> CoreResult<()> {
        self.records.write().remove(id);
        Ok(())
    }

    fn list(&self) -> CoreResult<Vec<Record>> {
        Ok(self.records.read().values().cloned().collect())
    }
}
