//! # Dialog Document Format
//!
//! Dialogs persist as pretty-printed JSON. Absent optional fields are
//! skipped, so `save -> load -> save` yields identical bytes.

use crate::types::{Dialog, DialogError};

/// Refuse to parse documents larger than this (16 MB).
pub const MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// File extension of dialog documents.
pub const DOCUMENT_EXTENSION: &str = "dialog.json";

/// File extension of companion code artifacts.
pub const ARTIFACT_EXTENSION: &str = "rs";

/// Storage key of a dialog: `{data_source}.{object}`.
#[must_use]
pub fn document_key(data_source: &str, object: &str) -> String {
    format!("{}.{}", data_source, object)
}

/// Serialize a dialog to document bytes (trailing newline included).
pub fn dialog_to_bytes(dialog: &Dialog) -> Result<Vec<u8>, DialogError> {
    let mut bytes =
        serde_json::to_vec_pretty(dialog).map_err(|e| DialogError::Serialization(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse document bytes into a dialog.
pub fn dialog_from_bytes(bytes: &[u8]) -> Result<Dialog, DialogError> {
    if bytes.len() > MAX_DOCUMENT_SIZE {
        return Err(DialogError::Deserialization(format!(
            "document of {} bytes exceeds maximum of {} bytes",
            bytes.len(),
            MAX_DOCUMENT_SIZE
        )));
    }
    serde_json::from_slice(bytes).map_err(|e| DialogError::Deserialization(e.to_string()))
}

/// BLAKE3 fingerprint (hex) of the serialized document.
#[cfg(feature = "crypto-hash")]
pub fn document_fingerprint(dialog: &Dialog) -> Result<String, DialogError> {
    let bytes = dialog_to_bytes(dialog)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// =============================================================================
// TESTS
// =============================================================================
