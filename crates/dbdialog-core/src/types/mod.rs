//! # Core Type Definitions
//!
//! This module contains the data model of a dialog document:
//! - Schema objects (`ObjectType`, `DbObject`)
//! - Columns and their UI properties (`Column`, `ForeignKey`, `UiProps`)
//! - Operation specifications (`Query`, `QueryType`, `Param`, `Where`)
//! - The document itself (`Dialog`, `Relation`, `ClientUi`)
//! - Error types (`DialogError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Keep declaration order in `Vec` fields (columns, queries, params)
//! - Skip absent optional fields when serialized, so documents round-trip byte-for-byte
//! - Contain no floating-point fields

mod column;
mod dialog;
mod query;

pub use column::{Column, ForeignKey, SearchType, UiProps, UiWidget};
pub use dialog::{ClientUi, Dialog, Relation, RelationType, RelationUiWidget};
pub use query::{
    Aggregation, CompareOperator, ComparePhrase, Param, Query, QueryColumn, QueryType, RefTo,
    ValueExpression, Where,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// SCHEMA OBJECTS
// =============================================================================

/// Kind of schema object a dialog describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Table,
    View,
    Procedure,
    TableFunction,
    ScalarFunction,
}

impl ObjectType {
    /// Every object type, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Table,
        Self::View,
        Self::Procedure,
        Self::TableFunction,
        Self::ScalarFunction,
    ];

    /// Canonical name of the object type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "Table",
            Self::View => "View",
            Self::Procedure => "Procedure",
            Self::TableFunction => "TableFunction",
            Self::ScalarFunction => "ScalarFunction",
        }
    }

    /// Parse an object type name (case-insensitive).
    pub fn parse(name: &str) -> Result<Self, DialogError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| DialogError::UnsupportedObjectType(name.to_string()))
    }

    /// Tables and views expose columns; routines expose parameters.
    #[must_use]
    pub const fn has_columns(self) -> bool {
        matches!(self, Self::Table | Self::View)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schema object as reported by the schema facts provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DbObject {
    /// Object name (table, view or routine).
    pub name: String,
    /// Object kind.
    pub object_type: ObjectType,
}

impl DbObject {
    /// Create a new object reference.
    #[must_use]
    pub fn new(name: impl Into<String>, object_type: ObjectType) -> Self {
        Self {
            name: name.into(),
            object_type,
        }
    }

    /// Shorthand for a table reference.
    #[must_use]
    pub fn table(name: impl Into<String>) -> Self {
        Self::new(name, ObjectType::Table)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while compiling or maintaining dialogs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogError {
    /// An operation-type keyword is unknown or not allowed at the call site.
    #[error("Unsupported query type '{query_type}' in {site}")]
    UnsupportedQueryType { query_type: String, site: String },

    /// An object-type name is unknown.
    #[error("Unsupported object type '{0}'")]
    UnsupportedObjectType(String),

    /// A partial update was requested without any column.
    #[error("Partial update for '{object}' requires at least one column")]
    EmptyUpdateColumns { object: String },

    /// No dialog is persisted for the object.
    #[error("Dialog not found: {data_source}.{object}")]
    DialogNotFound { data_source: String, object: String },

    /// The dialog has no query with the given name.
    #[error("Query '{query}' not found on '{object}'")]
    QueryNotFound { object: String, query: String },

    /// The dialog has no column with the given name.
    #[error("Column '{column}' not found on '{object}'")]
    ColumnNotFound { object: String, column: String },

    /// The schema has no object with the given name.
    #[error("Schema object not found: {0}")]
    ObjectNotFound(String),

    /// A query with the given name already exists.
    #[error("Query '{query}' already exists on '{object}'")]
    DuplicateQuery { object: String, query: String },

    /// A keyed operation was requested on an object without primary key.
    #[error("Object '{0}' has no primary key")]
    MissingPrimaryKey(String),

    /// A query copy could not be reconstructed from its serialized form.
    #[error("Query '{query}' on '{object}' does not survive a JSON round trip")]
    RoundTrip { object: String, query: String },

    /// A dialog document breaks one of its structural invariants.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The schema facts provider failed.
    #[error("Schema error: {0}")]
    Schema(String),

    /// The code artifact generator failed.
    #[error("Code generation error: {0}")]
    CodeGen(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// Host configuration is malformed.
    #[error("Configuration error: {0}")]
    Config(String),
}

// =============================================================================
// TESTS
// =============================================================================
