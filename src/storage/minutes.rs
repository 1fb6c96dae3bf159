//! Pending Minutes Repository
//!
//! Append-only store of minutes-analysis runs awaiting approval.

use todo_tracker_core::PendingMinutes;

use super::database::DocumentStore;
use crate::utils::error::AppResult;

/// Collection holding pending minutes records
pub const PENDING_MINUTES_COLLECTION: &str = "pendingMinutes";

/// Repository over the `pendingMinutes` collection
#[derive(Clone)]
pub struct PendingMinutesRepository {
    store: DocumentStore,
}

impl PendingMinutesRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Insert a record under a generated id and return the id.
    pub fn insert(&self, record: &PendingMinutes) -> AppResult<String> {
        let data = serde_json::to_value(record)?;
        self.store.insert(PENDING_MINUTES_COLLECTION, &data)
    }

    /// Read one record by id.
    pub fn get(&self, id: &str) -> AppResult<Option<PendingMinutes>> {
        match self.store.get(PENDING_MINUTES_COLLECTION, id)? {
            None => Ok(None),
            Some(data) => {
                let mut record: PendingMinutes = serde_json::from_value(data)?;
                record.id = id.to_string();
                Ok(Some(record))
            }
        }
    }

    pub fn count(&self) -> AppResult<usize> {
        self.store.count(PENDING_MINUTES_COLLECTION)
    }
}
