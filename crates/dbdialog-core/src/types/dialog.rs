//! The dialog document and its relations and UI bindings.

use super::{Column, DialogError, ObjectType, Query, QueryType};
use crate::conventions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

fn is_false(value: &bool) -> bool {
    !*value
}

// =============================================================================
// RELATION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    OneToMany,
    ManyToMany,
}

/// Widget hint for editing the related rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationUiWidget {
    Grid,
    Cards,
    CheckboxList,
    AddableList,
}

/// An association inferred from a foreign key in another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Deterministic name: `{relation_table}_{fk_column}`.
    pub relation_name: String,
    pub relation_table: String,
    pub relation_pk_column: String,
    pub relation_fk_column: String,
    pub relation_type: RelationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linking_target_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linking_column: Option<String>,
    pub relation_ui_widget: RelationUiWidget,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_file_centric: bool,
    pub create_query: String,
    pub read_list_query: String,
    pub update_by_key_query: String,
    pub delete_query: String,
    pub delete_by_key_query: String,
}

impl Relation {
    /// A one-to-many relation exposing the related side's standard queries.
    #[must_use]
    pub fn one_to_many(
        relation_table: impl Into<String>,
        relation_pk_column: impl Into<String>,
        relation_fk_column: impl Into<String>,
    ) -> Self {
        let relation_table = relation_table.into();
        let relation_fk_column = relation_fk_column.into();
        Self {
            relation_name: format!("{}_{}", relation_table, relation_fk_column),
            relation_table,
            relation_pk_column: relation_pk_column.into(),
            relation_fk_column,
            relation_type: RelationType::OneToMany,
            linking_target_table: None,
            linking_column: None,
            relation_ui_widget: RelationUiWidget::Grid,
            is_file_centric: false,
            create_query: QueryType::Create.default_name().to_string(),
            read_list_query: QueryType::ReadList.default_name().to_string(),
            update_by_key_query: QueryType::UpdateByKey.default_name().to_string(),
            delete_query: QueryType::Delete.default_name().to_string(),
            delete_by_key_query: QueryType::DeleteByKey.default_name().to_string(),
        }
    }

    #[must_use]
    pub fn is_many_to_many(&self) -> bool {
        self.relation_type == RelationType::ManyToMany
    }
}

// =============================================================================
// CLIENT UI
// =============================================================================

/// UI component binding for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientUi {
    pub file_name: String,
    pub template_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_api: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_api: Option<String>,
}

// =============================================================================
// DIALOG
// =============================================================================

/// The persisted API descriptor of one schema object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    pub data_source: String,
    pub object_name: String,
    pub object_type: ObjectType,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub queries: Vec<Query>,
    /// `None` means "not computed", distinct from an empty list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Vec<Relation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_uis: Option<Vec<ClientUi>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub open_create_update_inline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_order_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_color_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_icon_column: Option<String>,
}

impl Dialog {
    /// Create an empty dialog shell.
    #[must_use]
    pub fn new(
        data_source: impl Into<String>,
        object_name: impl Into<String>,
        object_type: ObjectType,
    ) -> Self {
        Self {
            data_source: data_source.into(),
            object_name: object_name.into(),
            object_type,
            columns: Vec::new(),
            queries: Vec::new(),
            relations: None,
            client_uis: None,
            open_create_update_inline: false,
            object_icon: None,
            note_column: None,
            view_order_column: None,
            ui_color_column: None,
            ui_icon_column: None,
        }
    }

    // -------------------------------------------------------------------------
    // Columns
    // -------------------------------------------------------------------------

    /// Column by exact name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Column by case-insensitive name.
    #[must_use]
    pub fn column_ignore_case(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// The primary-key column.
    pub fn primary_key(&self) -> Result<&Column, DialogError> {
        self.columns
            .iter()
            .find(|c| c.is_primary_key)
            .ok_or_else(|| DialogError::MissingPrimaryKey(self.object_name.clone()))
    }

    /// Self-referencing through a `ParentId` column.
    #[must_use]
    pub fn is_tree(&self) -> bool {
        self.columns.iter().any(|c| {
            c.name.eq_ignore_ascii_case(conventions::TREE_PARENT_COLUMN)
                && c
                    .fk
                    .as_ref()
                    .is_some_and(|fk| fk.target_table == self.object_name)
        })
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn query(&self, name: &str) -> Option<&Query> {
        self.queries.iter().find(|q| q.name == name)
    }

    pub fn query_mut(&mut self, name: &str) -> Option<&mut Query> {
        self.queries.iter_mut().find(|q| q.name == name)
    }

    #[must_use]
    pub fn query_ignore_case(&self, name: &str) -> Option<&Query> {
        self.queries
            .iter()
            .find(|q| q.name.eq_ignore_ascii_case(name))
    }

    pub fn query_ignore_case_mut(&mut self, name: &str) -> Option<&mut Query> {
        self.queries
            .iter_mut()
            .find(|q| q.name.eq_ignore_ascii_case(name))
    }

    /// Append a query; fails if the name is taken in any letter case.
    pub fn add_query(&mut self, query: Query) -> Result<(), DialogError> {
        if self.query_ignore_case(&query.name).is_some() {
            return Err(DialogError::DuplicateQuery {
                object: self.object_name.clone(),
                query: query.name,
            });
        }
        self.queries.push(query);
        Ok(())
    }

    /// Replace the query with the same (case-insensitive) name in place, or append it.
    pub fn upsert_query(&mut self, query: Query) {
        match self
            .queries
            .iter()
            .position(|q| q.name.eq_ignore_ascii_case(&query.name))
        {
            Some(index) => self.queries[index] = query,
            None => self.queries.push(query),
        }
    }

    pub fn remove_query(&mut self, name: &str) -> Option<Query> {
        let index = self.queries.iter().position(|q| q.name == name)?;
        Some(self.queries.remove(index))
    }

    /// Method names exposed by the companion artifact.
    #[must_use]
    pub fn method_names(&self) -> Vec<String> {
        self.queries.iter().map(|q| q.name.clone()).collect()
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations
            .as_deref()
            .and_then(|rels| rels.iter().find(|r| r.relation_name == name))
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Check the structural invariants, reporting the first violation.
    pub fn validate(&self) -> Result<(), DialogError> {
        let violation = |msg: String| {
            Err(DialogError::InvariantViolation(format!(
                "{}.{}: {}",
                self.data_source, self.object_name, msg
            )))
        };

        let mut seen = BTreeSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return violation(format!("duplicate column '{}'", column.name));
            }
        }

        let mut seen = BTreeSet::new();
        for query in &self.queries {
            if !seen.insert(query.name.to_ascii_lowercase()) {
                return violation(format!("duplicate query '{}'", query.name));
            }
        }

        let mut seen = BTreeSet::new();
        for ui in self.client_uis.iter().flatten() {
            if !seen.insert(ui.file_name.to_ascii_lowercase()) {
                return violation(format!("duplicate client UI '{}'", ui.file_name));
            }
        }

        let keys = self.columns.iter().filter(|c| c.is_primary_key).count();
        if self.object_type == ObjectType::Table && keys != 1 {
            return violation(format!("table has {} primary-key columns", keys));
        }
        if keys > 1 {
            return violation(format!("{} primary-key columns", keys));
        }

        for column in &self.columns {
            if let Some(group) = column.update_group.as_deref() {
                let owner = self.query(group);
                if !owner.is_some_and(|q| q.query_type == QueryType::UpdateByKey) {
                    return violation(format!(
                        "column '{}' belongs to missing update query '{}'",
                        column.name, group
                    ));
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
