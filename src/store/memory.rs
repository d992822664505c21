//! Content-addressed in-memory table store.

use std::sync::{Arc, RwLock};

use arrow::record_batch::RecordBatch;
use hashbrown::HashMap;

use super::{content_locator, TableArtifact, TableRef, TableStore};
use crate::config::StoreConfig;
use crate::error::{DownholeError, Result};

/// Keeps artifact bytes in a map keyed by their SHA-256 locator.
#[derive(Debug, Default)]
pub struct MemoryStore {
    config: StoreConfig,
    blobs: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl MemoryStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of distinct payloads held.
    pub fn len(&self) -> Result<usize> {
        Ok(self.blobs.read().map_err(|_| DownholeError::LockPoisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Raw artifact bytes stored under `locator`.
    pub fn get(&self, locator: &str) -> Result<Arc<[u8]>> {
        let blobs = self.blobs.read().map_err(|_| DownholeError::LockPoisoned)?;
        blobs
            .get(locator)
            .cloned()
            .ok_or_else(|| DownholeError::MissingTable(locator.to_string()))
    }

    /// Decodes the table behind `reference`.
    pub fn load(&self, reference: &TableRef) -> Result<RecordBatch> {
        let bytes = self.get(&reference.data)?;
        TableArtifact::from_bytes(&bytes)?.to_batch()
    }
}

impl TableStore for MemoryStore {
    fn save(&self, table: &RecordBatch) -> Result<TableRef> {
        let bytes = TableArtifact::from_batch(table, self.config.compression_level)?.to_bytes()?;
        let locator = content_locator(&bytes);
        {
            let mut blobs = self.blobs.write().map_err(|_| DownholeError::LockPoisoned)?;
            blobs
                .entry(locator.clone())
                .or_insert_with(|| Arc::from(bytes));
        }
        log::debug!("Stored {} rows in memory under {}", table.num_rows(), locator);
        TableRef::describe(locator, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::schema::COORDINATES;
    use arrow::array::Float64Array;

    fn coordinates(x: f64) -> RecordBatch {
        RecordBatch::try_new(
            COORDINATES.to_arrow_schema(false),
            vec![
                Arc::new(Float64Array::from(vec![x, x + 1.0])),
                Arc::new(Float64Array::from(vec![500.0, 501.0])),
                Arc::new(Float64Array::from(vec![1.5, 1.5])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::default();
        let table = coordinates(100.0);
        let reference = store.save(&table).unwrap();
        assert_eq!(reference.length, 2);
        assert_eq!(reference.data.len(), 64);
        assert_eq!(store.load(&reference).unwrap(), table);
    }

    #[test]
    fn test_identical_tables_share_a_locator() {
        let store = MemoryStore::default();
        let a = store.save(&coordinates(1.0)).unwrap();
        let b = store.save(&coordinates(1.0)).unwrap();
        let c = store.save(&coordinates(2.0)).unwrap();
        assert_eq!(a.data, b.data);
        assert_ne!(a.data, c.data);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_unknown_locator_is_missing_table() {
        let store = MemoryStore::default();
        assert!(store.is_empty().unwrap());
        assert!(matches!(
            store.get("nope"),
            Err(DownholeError::MissingTable(locator)) if locator == "nope"
        ));
    }
}
