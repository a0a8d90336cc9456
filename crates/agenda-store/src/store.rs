use tracing::debug;

use agenda_shared::{Record, RecordId};

use crate::error::{Result, StoreError};

/// Ordered collection of records keyed by id.
///
/// Insertion order is kept; an update replaces the record in place so the
/// rendered list does not jump around.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: RecordId) -> Result<&Record> {
        self.position(id)
            .map(|i| &self.records[i])
            .ok_or(StoreError::NotFound(id))
    }

    /// Replace the record with the same id in place, or append it.
    pub fn upsert(&mut self, record: Record) -> Result<()> {
        let id = record.id.ok_or(StoreError::MissingId)?;
        match self.position(id) {
            Some(i) => {
                debug!(record_id = %id, "Replacing cached record");
                self.records[i] = record;
            }
            None => {
                debug!(record_id = %id, "Caching new record");
                self.records.push(record);
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, id: RecordId) -> Result<Record> {
        let i = self.position(id).ok_or(StoreError::NotFound(id))?;
        Ok(self.records.remove(i))
    }

    /// Swap in a freshly fetched collection wholesale.  Records without an id
    /// are dropped.  Returns whether the contents changed.
    pub fn replace_all(&mut self, records: Vec<Record>) -> bool {
        let records: Vec<Record> = records.into_iter().filter(|r| r.id.is_some()).collect();
        if records == self.records {
            return false;
        }
        debug!(count = records.len(), "Replacing record cache");
        self.records = records;
        true
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id == Some(id))
    }
}
