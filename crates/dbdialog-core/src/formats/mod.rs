//! # Formats
//!
//! Serialization of persisted documents.

pub mod document;

pub use document::{
    ARTIFACT_EXTENSION, DOCUMENT_EXTENSION, MAX_DOCUMENT_SIZE, dialog_from_bytes,
    dialog_to_bytes, document_key,
};

#[cfg(feature = "crypto-hash")]
pub use document::document_fingerprint;
