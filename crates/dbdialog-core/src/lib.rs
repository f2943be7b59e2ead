//! # dbdialog-core
//!
//! The dialog compiler for dbdialog - THE LOGIC.
//!
//! This crate turns live database schema facts into "dialogs": persisted
//! descriptors of the CRUD and routine operations of one schema object,
//! together with its relations, UI bindings and audit metadata.
//!
//! ## Layout
//!
//! - `types`: the dialog document model and `DialogError`
//! - `conventions`, `classifier`: naming rules and per-column decisions
//! - `relations`, `synthesis`, `client_ui`, `history`: dialog construction
//! - `orchestrator`, `sync`: the workflows callers run
//! - `facts`, `codegen`, `store`: collaborator seams and their reference implementations
//! - `formats`, `storage`: persisted document encoding and the redb backend
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Talks to databases, compilers and storage only through traits
//! - Is deterministic: the same schema facts always produce the same bytes
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod classifier;
pub mod client_ui;
pub mod codegen;
pub mod conventions;
pub mod facts;
pub mod formats;
pub mod history;
pub mod orchestrator;
pub mod relations;
pub mod storage;
pub mod store;
pub mod sync;
pub mod synthesis;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ClientUi, Column, DbObject, Dialog, DialogError, ForeignKey, ObjectType, Param, Query,
    QueryColumn, QueryType, Relation, RelationType, RelationUiWidget, UiProps, UiWidget,
    ValueExpression,
};

// =============================================================================
// RE-EXPORTS: Compiler
// =============================================================================

pub use classifier::Classification;
pub use orchestrator::{OrchestratorOptions, PartialUpdateRequest, ServerObjectOrchestrator};
pub use sync::SyncReport;
pub use synthesis::UpdateSpec;

// =============================================================================
// RE-EXPORTS: Collaborators
// =============================================================================

pub use codegen::{CodeArtifactGenerator, StubGenerator};
pub use facts::{MemorySchema, SchemaFacts, TableColumnSpec, TableSpec};
pub use storage::RedbDialogStore;
pub use store::{DialogStore, FileDialogStore, MemoryDialogStore, StoreBackend};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{dialog_from_bytes, dialog_to_bytes, document_key};

#[cfg(feature = "crypto-hash")]
pub use formats::document_fingerprint;
