//! A table store backed by a local directory.
//!
//! Each artifact is written to `<root>/<sha256 hex>`. The locator is derived from
//! the artifact bytes, so a file that already exists already holds exactly those
//! bytes and is left untouched.

use std::fs;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;

use super::{content_locator, TableArtifact, TableRef, TableStore};
use crate::config::StoreConfig;
use crate::error::{DownholeError, Result};

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    config: StoreConfig,
}

impl DirectoryStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>, config: StoreConfig) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the artifact stored under `locator`.
    pub fn path_for(&self, locator: &str) -> PathBuf {
        self.root.join(locator)
    }

    /// Scratch file an artifact is written to before it is moved under `locator`.
    /// Unique per process and thread.
    fn temp_path_for(&self, locator: &str) -> PathBuf {
        self.root.join(format!(
            ".{}.{}.{:?}.tmp",
            locator,
            std::process::id(),
            std::thread::current().id()
        ))
    }

    /// Reads and decodes the table behind `reference`.
    pub fn load(&self, reference: &TableRef) -> Result<RecordBatch> {
        let path = self.path_for(&reference.data);
        if !path.is_file() {
            return Err(DownholeError::MissingTable(reference.data.clone()));
        }
        let bytes = fs::read(&path)?;
        TableArtifact::from_bytes(&bytes)?.to_batch()
    }
}

/// Writes `bytes` to `tmp` and renames it to `path`, so a reader never sees a
/// partial artifact under the final name. `tmp` is removed if either step fails.
fn write_via_temp(tmp: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let written = fs::write(tmp, bytes).and_then(|()| fs::rename(tmp, path));
    if let Err(e) = written {
        let _ = fs::remove_file(tmp);
        return Err(e.into());
    }
    Ok(())
}

impl TableStore for DirectoryStore {
    fn save(&self, table: &RecordBatch) -> Result<TableRef> {
        let bytes = TableArtifact::from_batch(table, self.config.compression_level)?.to_bytes()?;
        let locator = content_locator(&bytes);
        let path = self.path_for(&locator);

        if path.exists() {
            log::debug!("Artifact {} already present, skipping write", locator);
        } else {
            write_via_temp(&self.temp_path_for(&locator), &path, &bytes)?;
            log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        }

        TableRef::describe(locator, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::schema::ATTRIBUTE;
    use arrow::array::Float64Array;
    use std::sync::Arc;

    fn attribute(values: Vec<f64>) -> RecordBatch {
        RecordBatch::try_new(
            ATTRIBUTE.to_arrow_schema(true),
            vec![Arc::new(Float64Array::from(values))],
        )
        .unwrap()
    }

    #[test]
    fn test_save_writes_one_file_per_payload() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::open(dir.path().join("data"), StoreConfig::default()).unwrap();

        let table = attribute(vec![1.0, 2.5, -9999.0]);
        let first = store.save(&table).unwrap();
        let second = store.save(&table).unwrap();
        assert_eq!(first, second);
        assert!(store.path_for(&first.data).is_file());

        let files = fs::read_dir(store.root()).unwrap().count();
        assert_eq!(files, 1);
        assert_eq!(store.load(&first).unwrap(), table);
    }

    #[test]
    fn test_existing_artifact_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::open(dir.path(), StoreConfig::default()).unwrap();
        let reference = store.save(&attribute(vec![0.5])).unwrap();

        let path = store.path_for(&reference.data);
        let modified = fs::metadata(&path).unwrap().modified().unwrap();
        store.save(&attribute(vec![0.5])).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::open(dir.path(), StoreConfig::default()).unwrap();

        // A non-empty directory under the final name makes the rename fail.
        let target = store.path_for("occupied");
        fs::create_dir_all(target.join("inner")).unwrap();
        let tmp = store.temp_path_for("occupied");
        assert!(tmp
            .to_string_lossy()
            .contains(&std::process::id().to_string()));

        assert!(write_via_temp(&tmp, &target, b"payload").is_err());
        assert!(!tmp.exists());
        assert!(target.is_dir());
    }

    #[test]
    fn test_load_of_unknown_reference_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::open(dir.path(), StoreConfig::default()).unwrap();
        let mut reference = store.save(&attribute(vec![0.5])).unwrap();
        reference.data = "0".repeat(64);
        assert!(matches!(
            store.load(&reference),
            Err(DownholeError::MissingTable(_))
        ));
    }
}
