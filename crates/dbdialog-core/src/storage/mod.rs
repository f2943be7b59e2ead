//! # Storage Module
//!
//! Persistent storage backends for dialog documents.

mod redb_store;

pub use redb_store::RedbDialogStore;
