//! # Dialog Store
//!
//! Persistence boundary for dialog documents and their companion code
//! artifacts. A store is bound to one data source; documents are keyed by
//! `(data_source, object)`.
//!
//! Backends:
//! - [`MemoryDialogStore`]: volatile, for tests and dry runs
//! - [`FileDialogStore`]: `{root}/{ds}.{object}.dialog.json` plus `{root}/{ds}.{object}.rs`
//! - [`RedbDialogStore`](crate::storage::RedbDialogStore): redb embedded database

use crate::formats::{
    ARTIFACT_EXTENSION, DOCUMENT_EXTENSION, dialog_from_bytes, dialog_to_bytes, document_key,
};
use crate::storage::RedbDialogStore;
use crate::types::{Dialog, DialogError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// DIALOG STORE TRAIT
// =============================================================================

pub trait DialogStore {
    /// Data source every document of this store belongs to.
    fn data_source(&self) -> &str;

    /// Load a dialog; `DialogNotFound` when absent.
    fn load(&self, object: &str) -> Result<Dialog, DialogError>;

    /// Write a dialog, overwriting any previous version.
    fn save(&mut self, dialog: &Dialog) -> Result<(), DialogError>;

    fn exists(&self, object: &str) -> Result<bool, DialogError>;

    /// Delete the document and its companion artifact. Missing entries count as deleted.
    fn delete(&mut self, object: &str) -> Result<(), DialogError>;

    fn save_artifact(&mut self, object: &str, source: &str) -> Result<(), DialogError>;

    fn load_artifact(&self, object: &str) -> Result<Option<String>, DialogError>;

    /// Load a dialog if one is persisted.
    fn try_load(&self, object: &str) -> Result<Option<Dialog>, DialogError> {
        if self.exists(object)? {
            self.load(object).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Build the not-found error for `object`.
    fn not_found(&self, object: &str) -> DialogError {
        DialogError::DialogNotFound {
            data_source: self.data_source().to_string(),
            object: object.to_string(),
        }
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Volatile store holding serialized documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryDialogStore {
    data_source: String,
    documents: BTreeMap<String, Vec<u8>>,
    artifacts: BTreeMap<String, String>,
}

impl MemoryDialogStore {
    #[must_use]
    pub fn new(data_source: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            ..Self::default()
        }
    }

    /// Raw persisted bytes of a document.
    #[must_use]
    pub fn document_bytes(&self, object: &str) -> Option<&[u8]> {
        self.documents.get(object).map(Vec::as_slice)
    }

    /// Objects with a persisted dialog, ordered by name.
    #[must_use]
    pub fn objects(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }
}

impl DialogStore for MemoryDialogStore {
    fn data_source(&self) -> &str {
        &self.data_source
    }

    fn load(&self, object: &str) -> Result<Dialog, DialogError> {
        let bytes = self
            .documents
            .get(object)
            .ok_or_else(|| self.not_found(object))?;
        dialog_from_bytes(bytes)
    }

    fn save(&mut self, dialog: &Dialog) -> Result<(), DialogError> {
        let bytes = dialog_to_bytes(dialog)?;
        self.documents.insert(dialog.object_name.clone(), bytes);
        Ok(())
    }

    fn exists(&self, object: &str) -> Result<bool, DialogError> {
        Ok(self.documents.contains_key(object))
    }

    fn delete(&mut self, object: &str) -> Result<(), DialogError> {
        self.documents.remove(object);
        self.artifacts.remove(object);
        Ok(())
    }

    fn save_artifact(&mut self, object: &str, source: &str) -> Result<(), DialogError> {
        self.artifacts.insert(object.to_string(), source.to_string());
        Ok(())
    }

    fn load_artifact(&self, object: &str) -> Result<Option<String>, DialogError> {
        Ok(self.artifacts.get(object).cloned())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// Documents and artifacts as files under one directory.
#[derive(Debug, Clone)]
pub struct FileDialogStore {
    root: PathBuf,
    data_source: String,
}

impl FileDialogStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, data_source: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            data_source: data_source.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn document_path(&self, object: &str) -> PathBuf {
        self.root.join(format!(
            "{}.{}",
            document_key(&self.data_source, object),
            DOCUMENT_EXTENSION
        ))
    }

    #[must_use]
    pub fn artifact_path(&self, object: &str) -> PathBuf {
        self.root.join(format!(
            "{}.{}",
            document_key(&self.data_source, object),
            ARTIFACT_EXTENSION
        ))
    }

    fn ensure_root(&self) -> Result<(), DialogError> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            DialogError::Io(format!("Create {}: {}", self.root.display(), e))
        })
    }
}

fn remove_if_present(path: &Path) -> Result<(), DialogError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DialogError::Io(format!("Remove {}: {}", path.display(), e))),
    }
}

impl DialogStore for FileDialogStore {
    fn data_source(&self) -> &str {
        &self.data_source
    }

    fn load(&self, object: &str) -> Result<Dialog, DialogError> {
        let path = self.document_path(object);
        if !path.is_file() {
            return Err(self.not_found(object));
        }
        let bytes = std::fs::read(&path)
            .map_err(|e| DialogError::Io(format!("Read {}: {}", path.display(), e)))?;
        dialog_from_bytes(&bytes)
    }

    fn save(&mut self, dialog: &Dialog) -> Result<(), DialogError> {
        self.ensure_root()?;
        let path = self.document_path(&dialog.object_name);
        let bytes = dialog_to_bytes(dialog)?;
        std::fs::write(&path, bytes)
            .map_err(|e| DialogError::Io(format!("Write {}: {}", path.display(), e)))
    }

    fn exists(&self, object: &str) -> Result<bool, DialogError> {
        Ok(self.document_path(object).is_file())
    }

    fn delete(&mut self, object: &str) -> Result<(), DialogError> {
        remove_if_present(&self.document_path(object))?;
        remove_if_present(&self.artifact_path(object))
    }

    fn save_artifact(&mut self, object: &str, source: &str) -> Result<(), DialogError> {
        self.ensure_root()?;
        let path = self.artifact_path(object);
        std::fs::write(&path, source)
            .map_err(|e| DialogError::Io(format!("Write {}: {}", path.display(), e)))
    }

    fn load_artifact(&self, object: &str) -> Result<Option<String>, DialogError> {
        let path = self.artifact_path(object);
        if !path.is_file() {
            return Ok(None);
        }
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| DialogError::Io(format!("Read {}: {}", path.display(), e)))
    }
}

// =============================================================================
// STORE BACKEND (runtime selection)
// =============================================================================

/// A store chosen at runtime.
#[derive(Debug)]
pub enum StoreBackend {
    /// Volatile documents.
    Memory(MemoryDialogStore),
    /// JSON files on disk.
    File(FileDialogStore),
    /// redb embedded database (ACID, persistent).
    Redb(RedbDialogStore),
}

impl StoreBackend {
    fn inner(&self) -> &dyn DialogStore {
        match self {
            Self::Memory(s) => s,
            Self::File(s) => s,
            Self::Redb(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn DialogStore {
        match self {
            Self::Memory(s) => s,
            Self::File(s) => s,
            Self::Redb(s) => s,
        }
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        !matches!(self, Self::Memory(_))
    }
}

impl DialogStore for StoreBackend {
    fn data_source(&self) -> &str {
        self.inner().data_source()
    }

    fn load(&self, object: &str) -> Result<Dialog, DialogError> {
        self.inner().load(object)
    }

    fn save(&mut self, dialog: &Dialog) -> Result<(), DialogError> {
        self.inner_mut().save(dialog)
    }

    fn exists(&self, object: &str) -> Result<bool, DialogError> {
        self.inner().exists(object)
    }

    fn delete(&mut self, object: &str) -> Result<(), DialogError> {
        self.inner_mut().delete(object)
    }

    fn save_artifact(&mut self, object: &str, source: &str) -> Result<(), DialogError> {
        self.inner_mut().save_artifact(object, source)
    }

    fn load_artifact(&self, object: &str) -> Result<Option<String>, DialogError> {
        self.inner().load_artifact(object)
    }
}

// =============================================================================
// TESTS
// =============================================================================
