//! # redb-backed Dialog Storage
//!
//! A disk-backed dialog store using the redb embedded database:
//! - ACID transactions, one per save or delete
//! - Crash safety (copy-on-write B-trees)
//! - One database file for every document of a data source
//!
//! Documents are stored in the same JSON encoding as the file store, so a
//! document can move between backends unchanged.

use crate::formats::{dialog_from_bytes, dialog_to_bytes, document_key};
use crate::store::DialogStore;
use crate::types::{Dialog, DialogError};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for documents: `"{ds}.{object}"` -> JSON bytes
const DIALOGS: TableDefinition<&str, &[u8]> = TableDefinition::new("dialogs");

/// Table for companion artifacts: `"{ds}.{object}"` -> source text
const ARTIFACTS: TableDefinition<&str, &str> = TableDefinition::new("artifacts");

fn io(e: impl std::fmt::Display) -> DialogError {
    DialogError::Io(e.to_string())
}

/// A disk-backed dialog store using redb.
pub struct RedbDialogStore {
    /// The redb database handle.
    db: Database,
    data_source: String,
}

impl std::fmt::Debug for RedbDialogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbDialogStore")
            .field("data_source", &self.data_source)
            .finish_non_exhaustive()
    }
}

impl RedbDialogStore {
    /// Open or create a dialog database at the given path.
    pub fn open(path: impl AsRef<Path>, data_source: impl Into<String>) -> Result<Self, DialogError> {
        let db = Database::create(path.as_ref()).map_err(io)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io)?;
            let _ = write_txn.open_table(DIALOGS).map_err(io)?;
            let _ = write_txn.open_table(ARTIFACTS).map_err(io)?;
            write_txn.commit().map_err(io)?;
        }

        Ok(Self {
            db,
            data_source: data_source.into(),
        })
    }

    fn key(&self, object: &str) -> String {
        document_key(&self.data_source, object)
    }

    /// Objects of this data source with a persisted dialog, ordered by name.
    pub fn objects(&self) -> Result<Vec<String>, DialogError> {
        let prefix = format!("{}.", self.data_source);
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(DIALOGS).map_err(io)?;
        let mut objects = Vec::new();
        for entry in table.iter().map_err(io)? {
            let (key, _) = entry.map_err(io)?;
            if let Some(object) = key.value().strip_prefix(&prefix) {
                objects.push(object.to_string());
            }
        }
        Ok(objects)
    }
}

impl DialogStore for RedbDialogStore {
    fn data_source(&self) -> &str {
        &self.data_source
    }

    fn load(&self, object: &str) -> Result<Dialog, DialogError> {
        let key = self.key(object);
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(DIALOGS).map_err(io)?;
        let bytes = table
            .get(key.as_str())
            .map_err(io)?
            .map(|v| v.value().to_vec())
            .ok_or_else(|| self.not_found(object))?;
        dialog_from_bytes(&bytes)
    }

    fn save(&mut self, dialog: &Dialog) -> Result<(), DialogError> {
        let key = self.key(&dialog.object_name);
        let bytes = dialog_to_bytes(dialog)?;
        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = write_txn.open_table(DIALOGS).map_err(io)?;
            table.insert(key.as_str(), bytes.as_slice()).map_err(io)?;
        }
        write_txn.commit().map_err(io)
    }

    fn exists(&self, object: &str) -> Result<bool, DialogError> {
        let key = self.key(object);
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(DIALOGS).map_err(io)?;
        Ok(table.get(key.as_str()).map_err(io)?.is_some())
    }

    fn delete(&mut self, object: &str) -> Result<(), DialogError> {
        let key = self.key(object);
        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let mut dialogs = write_txn.open_table(DIALOGS).map_err(io)?;
            let _ = dialogs.remove(key.as_str()).map_err(io)?;
            let mut artifacts = write_txn.open_table(ARTIFACTS).map_err(io)?;
            let _ = artifacts.remove(key.as_str()).map_err(io)?;
        }
        write_txn.commit().map_err(io)
    }

    fn save_artifact(&mut self, object: &str, source: &str) -> Result<(), DialogError> {
        let key = self.key(object);
        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = write_txn.open_table(ARTIFACTS).map_err(io)?;
            table.insert(key.as_str(), source).map_err(io)?;
        }
        write_txn.commit().map_err(io)
    }

    fn load_artifact(&self, object: &str) -> Result<Option<String>, DialogError> {
        let key = self.key(object);
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(ARTIFACTS).map_err(io)?;
        Ok(table
            .get(key.as_str())
            .map_err(io)?
            .map(|v| v.value().to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
