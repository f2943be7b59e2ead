//! # Schema Facts
//!
//! The boundary to schema introspection and DDL execution. The core never
//! talks to a database; it reads and changes the schema through
//! [`SchemaFacts`].
//!
//! [`MemorySchema`] is an in-memory implementation. It is serde-serializable
//! so a JSON snapshot of a schema can stand in for a live database.

use crate::types::{Column, DbObject, DialogError, ForeignKey, ObjectType, Param};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// TABLE SPECIFICATION (DDL input)
// =============================================================================

/// One column of a table to create or alter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumnSpec {
    pub name: String,
    pub db_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub allow_null: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_identity: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fk: Option<ForeignKey>,
}

impl TableColumnSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, db_type: impl Into<String>, allow_null: bool) -> Self {
        Self {
            name: name.into(),
            db_type: db_type.into(),
            size: None,
            allow_null,
            is_primary_key: false,
            is_identity: false,
            identity_start: None,
            identity_step: None,
            fk: None,
        }
    }

    /// The column as schema introspection would report it.
    #[must_use]
    pub fn to_column(&self) -> Column {
        let mut column = Column::new(&self.name, &self.db_type);
        column.size.clone_from(&self.size);
        column.allow_null = self.allow_null;
        column.is_primary_key = self.is_primary_key;
        column.is_identity = self.is_identity;
        column.fk.clone_from(&self.fk);
        column
    }
}

/// A table to create, or to extend with missing columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<TableColumnSpec>,
}

impl TableSpec {
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

// =============================================================================
// SCHEMA FACTS TRAIT
// =============================================================================

/// Read and change the live schema.
pub trait SchemaFacts {
    /// All tables a relation may come from.
    fn list_tables(&self) -> Result<Vec<DbObject>, DialogError>;

    /// Resolve an object by name; `None` when it does not exist.
    fn get_object(&self, name: &str) -> Result<Option<DbObject>, DialogError>;

    /// Columns of a table or view, in declaration order.
    fn get_columns(&self, object: &str) -> Result<Vec<Column>, DialogError>;

    /// Parameters of a procedure or function.
    fn get_parameters(&self, object: &str) -> Result<Vec<Param>, DialogError>;

    /// Add a column to an existing table.
    fn create_column(
        &mut self,
        table: &str,
        name: &str,
        db_type: &str,
        nullable: bool,
    ) -> Result<(), DialogError>;

    /// Create the table, or add the columns it lacks.
    fn create_or_alter_table(&mut self, spec: &TableSpec) -> Result<(), DialogError>;

    fn drop_table(&mut self, name: &str) -> Result<(), DialogError>;
}

// =============================================================================
// IN-MEMORY SCHEMA
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaObject {
    pub object_type: ObjectType,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
}

/// Schema held in memory, keyed by object name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySchema {
    #[serde(default)]
    objects: BTreeMap<String, SchemaObject>,
}

impl MemorySchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a table.
    #[must_use]
    pub fn with_table(mut self, name: impl Into<String>, columns: Vec<Column>) -> Self {
        self.insert_object(name, ObjectType::Table, columns, Vec::new());
        self
    }

    /// Builder: add a view.
    #[must_use]
    pub fn with_view(mut self, name: impl Into<String>, columns: Vec<Column>) -> Self {
        self.insert_object(name, ObjectType::View, columns, Vec::new());
        self
    }

    /// Builder: add a procedure or function.
    #[must_use]
    pub fn with_routine(
        mut self,
        name: impl Into<String>,
        object_type: ObjectType,
        params: Vec<Param>,
    ) -> Self {
        self.insert_object(name, object_type, Vec::new(), params);
        self
    }

    pub fn insert_object(
        &mut self,
        name: impl Into<String>,
        object_type: ObjectType,
        columns: Vec<Column>,
        params: Vec<Param>,
    ) {
        self.objects.insert(
            name.into(),
            SchemaObject {
                object_type,
                columns,
                params,
            },
        );
    }

    /// Remove a column, as an external schema change would.
    pub fn drop_column(&mut self, table: &str, column: &str) -> Result<(), DialogError> {
        let object = self.object_mut(table)?;
        let before = object.columns.len();
        object.columns.retain(|c| c.name != column);
        if object.columns.len() == before {
            return Err(DialogError::Schema(format!(
                "column {}.{} does not exist",
                table, column
            )));
        }
        Ok(())
    }

    /// Append a column, as an external schema change would.
    pub fn add_column(&mut self, table: &str, column: Column) -> Result<(), DialogError> {
        self.object_mut(table)?.columns.push(column);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Every object, ordered by name.
    #[must_use]
    pub fn objects(&self) -> Vec<DbObject> {
        self.objects
            .iter()
            .map(|(name, o)| DbObject::new(name, o.object_type))
            .collect()
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, DialogError> {
        serde_json::from_slice(bytes).map_err(|e| DialogError::Deserialization(e.to_string()))
    }

    pub fn to_json(&self) -> Result<Vec<u8>, DialogError> {
        serde_json::to_vec_pretty(self).map_err(|e| DialogError::Serialization(e.to_string()))
    }

    fn object(&self, name: &str) -> Result<&SchemaObject, DialogError> {
        self.objects
            .get(name)
            .ok_or_else(|| DialogError::ObjectNotFound(name.to_string()))
    }

    fn object_mut(&mut self, name: &str) -> Result<&mut SchemaObject, DialogError> {
        self.objects
            .get_mut(name)
            .ok_or_else(|| DialogError::ObjectNotFound(name.to_string()))
    }
}

impl SchemaFacts for MemorySchema {
    fn list_tables(&self) -> Result<Vec<DbObject>, DialogError> {
        Ok(self
            .objects
            .iter()
            .filter(|(_, o)| o.object_type == ObjectType::Table)
            .map(|(name, o)| DbObject::new(name, o.object_type))
            .collect())
    }

    fn get_object(&self, name: &str) -> Result<Option<DbObject>, DialogError> {
        Ok(self
            .objects
            .get(name)
            .map(|o| DbObject::new(name, o.object_type)))
    }

    fn get_columns(&self, object: &str) -> Result<Vec<Column>, DialogError> {
        Ok(self.object(object)?.columns.clone())
    }

    fn get_parameters(&self, object: &str) -> Result<Vec<Param>, DialogError> {
        Ok(self.object(object)?.params.clone())
    }

    fn create_column(
        &mut self,
        table: &str,
        name: &str,
        db_type: &str,
        nullable: bool,
    ) -> Result<(), DialogError> {
        let object = self.object_mut(table)?;
        if object.columns.iter().any(|c| c.name == name) {
            return Err(DialogError::Schema(format!(
                "column {}.{} already exists",
                table, name
            )));
        }
        let mut column = Column::new(name, db_type);
        column.allow_null = nullable;
        object.columns.push(column);
        Ok(())
    }

    fn create_or_alter_table(&mut self, spec: &TableSpec) -> Result<(), DialogError> {
        match self.objects.get_mut(&spec.name) {
            Some(existing) => {
                if existing.object_type != ObjectType::Table {
                    return Err(DialogError::Schema(format!(
                        "{} is a {}, not a table",
                        spec.name, existing.object_type
                    )));
                }
                for column in &spec.columns {
                    if !existing.columns.iter().any(|c| c.name == column.name) {
                        existing.columns.push(column.to_column());
                    }
                }
            }
            None => {
                let columns = spec.columns.iter().map(TableColumnSpec::to_column).collect();
                self.insert_object(&spec.name, ObjectType::Table, columns, Vec::new());
            }
        }
        Ok(())
    }

    fn drop_table(&mut self, name: &str) -> Result<(), DialogError> {
        self.objects
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| DialogError::ObjectNotFound(name.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
