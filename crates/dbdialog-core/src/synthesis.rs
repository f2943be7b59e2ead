//! # Query Synthesis
//!
//! One builder per operation kind, selected by [`build_query`]. Builders
//! read the dialog (and, for reference expansion, the dialogs of foreign-key
//! targets) and return a new [`Query`]; they never write to the dialog.
//! Update-group ownership is applied separately by [`assign_update_group`].
//!
//! ## Reference expansion
//!
//! A foreign-key column whose target already has a dialog is projected into
//! the target's display columns, aliased `{column}_{targetColumn}`. Only the
//! target's own columns are consulted, never its expansions, so mutually
//! referencing objects cannot recurse.

use crate::classifier;
use crate::conventions::{
    self, ACTOR_TYPE, CONTEXT_USER_ID, COUNT_AGGREGATION, COUNT_PHRASE, CREATED_BY, CREATED_ON,
    MAIN_UPDATE_QUERY, PAGINATION_MAX_SIZE, THUMBNAIL_SIZE, UPDATED_BY, UPDATED_ON,
};
use crate::facts::SchemaFacts;
use crate::store::DialogStore;
use crate::types::{
    Aggregation, Column, Dialog, DialogError, ForeignKey, Param, Query, QueryColumn, QueryType,
    RefTo, ValueExpression, Where,
};
use tracing::debug;

// =============================================================================
// UPDATE MODES
// =============================================================================

/// Which columns an UpdateByKey query writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateSpec {
    /// Every update-eligible column not owned by another update query,
    /// with the conventional `UpdatedBy`/`UpdatedOn` audit pair.
    Main,
    /// Exactly the named columns, with an optional custom audit pair.
    Partial {
        columns: Vec<String>,
        by_column: Option<String>,
        on_column: Option<String>,
    },
}

impl UpdateSpec {
    /// Recover the partial spec of an existing update query.
    #[must_use]
    pub fn partial_from(query: &Query) -> Self {
        let by_column = query
            .param_with(|e| matches!(e, ValueExpression::Context { .. }))
            .map(|p| p.name.clone());
        let on_column = query
            .param_with(|e| matches!(e, ValueExpression::Now))
            .map(|p| p.name.clone());
        Self::Partial {
            columns: query.columns.iter().map(|c| c.name.clone()).collect(),
            by_column,
            on_column,
        }
    }

    /// Mode of an existing update query, told apart by name.
    #[must_use]
    pub fn for_existing(query: &Query) -> Self {
        if query.name.eq_ignore_ascii_case(MAIN_UPDATE_QUERY) {
            Self::Main
        } else {
            Self::partial_from(query)
        }
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Build a query of `query_type` named `name`.
pub fn build_query<S: SchemaFacts, D: DialogStore>(
    query_type: QueryType,
    name: &str,
    dialog: &Dialog,
    update: &UpdateSpec,
    schema: &S,
    store: &D,
) -> Result<Query, DialogError> {
    debug!("Building {} {} for {}", query_type, name, dialog.object_name);
    let mut query = match query_type {
        QueryType::Create => build_create(dialog),
        QueryType::ReadList => build_read_list(dialog, store)?,
        QueryType::AggregatedReadList => build_aggregated_read_list(dialog, store)?,
        QueryType::ReadByKey => build_read_by_key(dialog, store)?,
        QueryType::UpdateByKey => build_update_by_key(dialog, name, update)?,
        QueryType::Delete => build_delete(dialog),
        QueryType::DeleteByKey => build_delete_by_key(dialog)?,
        QueryType::Procedure => build_exec(dialog, schema)?,
        QueryType::TableFunction => build_table_function(dialog, schema)?,
        QueryType::ScalarFunction => build_scalar_function(dialog, schema)?,
    };
    query.name = name.to_string();
    Ok(query)
}

// =============================================================================
// BUILDERS
// =============================================================================

pub fn build_create(dialog: &Dialog) -> Query {
    let mut query = Query::new(QueryType::Create.default_name(), QueryType::Create);
    for column in dialog.columns.iter().filter(|c| classifier::in_create(c)) {
        query.columns.push(QueryColumn::new(&column.name));
        if conventions::is_thumbnail(&column.name) {
            query.params.push(resize_param(column));
        } else if column.name == CREATED_BY {
            query.params.push(actor_param(column));
        } else if column.name == CREATED_ON {
            query.params.push(now_param(column));
        }
    }
    query.relations = exposed_relations(dialog, QueryType::Create);
    query
}

pub fn build_read_list<D: DialogStore>(dialog: &Dialog, store: &D) -> Result<Query, DialogError> {
    let mut query = list_query(dialog, store, QueryType::ReadList)?;
    query.relations = exposed_relations(dialog, QueryType::ReadList);
    Ok(query)
}

pub fn build_aggregated_read_list<D: DialogStore>(
    dialog: &Dialog,
    store: &D,
) -> Result<Query, DialogError> {
    list_query(dialog, store, QueryType::AggregatedReadList)
}

fn list_query<D: DialogStore>(
    dialog: &Dialog,
    store: &D,
    query_type: QueryType,
) -> Result<Query, DialogError> {
    let mut query = Query::new(query_type.default_name(), query_type);
    for column in dialog.columns.iter().filter(|c| classifier::in_read_list(c)) {
        query.columns.push(project(column, dialog, store)?);
    }
    query.aggregations = Some(vec![Aggregation {
        name: COUNT_AGGREGATION.to_string(),
        phrase: COUNT_PHRASE.to_string(),
    }]);
    query.pagination_max_size = Some(PAGINATION_MAX_SIZE);
    Ok(query)
}

pub fn build_read_by_key<D: DialogStore>(
    dialog: &Dialog,
    store: &D,
) -> Result<Query, DialogError> {
    let pk = dialog.primary_key()?;
    let mut query = Query::new(QueryType::ReadByKey.default_name(), QueryType::ReadByKey);
    for column in &dialog.columns {
        query.columns.push(project(column, dialog, store)?);
    }
    query.where_clause = Some(Where::by_key(&dialog.object_name, &pk.name));
    query.relations = exposed_relations(dialog, QueryType::ReadByKey);
    Ok(query)
}

/// Build an update query, reusing the existing one with the same name.
///
/// A reused query keeps its `log_table`; columns, params, WHERE and
/// relations are rebuilt.
pub fn build_update_by_key(
    dialog: &Dialog,
    name: &str,
    spec: &UpdateSpec,
) -> Result<Query, DialogError> {
    let pk = dialog.primary_key()?;
    let mut query = match dialog.query_ignore_case(name) {
        Some(existing) if existing.query_type != QueryType::UpdateByKey => {
            return Err(DialogError::DuplicateQuery {
                object: dialog.object_name.clone(),
                query: name.to_string(),
            });
        }
        Some(existing) => existing.clone(),
        None => Query::new(name, QueryType::UpdateByKey),
    };
    query.columns.clear();
    query.params.clear();

    match spec {
        UpdateSpec::Main => {
            for column in dialog.columns.iter().filter(|c| {
                classifier::in_update_by_key(c)
                    && (c.is_primary_key
                        || c
                            .update_group
                            .as_deref()
                            .is_none_or(|g| g.eq_ignore_ascii_case(name)))
            }) {
                query.columns.push(QueryColumn::new(&column.name));
                if conventions::is_thumbnail(&column.name) {
                    query.params.push(resize_param(column));
                } else if column.name == UPDATED_BY {
                    query.params.push(actor_param(column));
                } else if column.name == UPDATED_ON {
                    query.params.push(now_param(column));
                }
            }
            query.relations = exposed_relations(dialog, QueryType::UpdateByKey);
        }
        UpdateSpec::Partial {
            columns,
            by_column,
            on_column,
        } => {
            let is = |column: &Column, wanted: Option<&String>| {
                wanted.is_some_and(|w| w.eq_ignore_ascii_case(&column.name))
            };
            for column in dialog.columns.iter().filter(|c| {
                c.is_primary_key
                    || columns.iter().any(|n| n.eq_ignore_ascii_case(&c.name))
                    || is(c, by_column.as_ref())
                    || is(c, on_column.as_ref())
            }) {
                query.columns.push(QueryColumn::new(&column.name));
                if conventions::is_thumbnail(&column.name) {
                    query.params.push(resize_param(column));
                } else if is(column, by_column.as_ref()) {
                    query.params.push(actor_param(column));
                } else if is(column, on_column.as_ref()) {
                    query.params.push(now_param(column));
                }
            }
            query.relations = None;
        }
    }

    query.where_clause = Some(Where::by_key(&dialog.object_name, &pk.name));
    Ok(query)
}

pub fn build_delete(dialog: &Dialog) -> Query {
    let mut query = Query::new(QueryType::Delete.default_name(), QueryType::Delete);
    for column in dialog.columns.iter().filter(|c| classifier::classify(c).in_delete) {
        query.columns.push(QueryColumn::new(&column.name));
    }
    query
}

pub fn build_delete_by_key(dialog: &Dialog) -> Result<Query, DialogError> {
    let pk = dialog.primary_key()?;
    let mut query = Query::new(QueryType::DeleteByKey.default_name(), QueryType::DeleteByKey);
    query.columns.push(QueryColumn::new(&pk.name));
    query.where_clause = Some(Where::by_key(&dialog.object_name, &pk.name));
    query.relations = exposed_relations(dialog, QueryType::DeleteByKey);
    Ok(query)
}

pub fn build_exec<S: SchemaFacts>(dialog: &Dialog, schema: &S) -> Result<Query, DialogError> {
    routine_query(dialog, schema, QueryType::Procedure)
}

pub fn build_table_function<S: SchemaFacts>(
    dialog: &Dialog,
    schema: &S,
) -> Result<Query, DialogError> {
    routine_query(dialog, schema, QueryType::TableFunction)
}

pub fn build_scalar_function<S: SchemaFacts>(
    dialog: &Dialog,
    schema: &S,
) -> Result<Query, DialogError> {
    routine_query(dialog, schema, QueryType::ScalarFunction)
}

fn routine_query<S: SchemaFacts>(
    dialog: &Dialog,
    schema: &S,
    query_type: QueryType,
) -> Result<Query, DialogError> {
    let mut query = Query::new(query_type.default_name(), query_type);
    query.params = schema.get_parameters(&dialog.object_name)?;
    Ok(query)
}

// =============================================================================
// UPDATE GROUPS
// =============================================================================

/// Make `query` the owner of every non-key column it writes, and release
/// the columns it owned but no longer writes.
pub fn assign_update_group(dialog: &mut Dialog, query: &Query) {
    for column in &mut dialog.columns {
        let owned = column
            .update_group
            .as_deref()
            .is_some_and(|g| g.eq_ignore_ascii_case(&query.name));
        if owned && !query.has_column(&column.name) {
            column.update_group = None;
        }
    }
    for query_column in &query.columns {
        if let Some(column) = dialog.column_mut(&query_column.name) {
            if !column.is_primary_key {
                column.update_group = Some(query.name.clone());
            }
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Relation names a query of `query_type` exposes.
#[must_use]
pub fn exposed_relations(dialog: &Dialog, query_type: QueryType) -> Option<Vec<String>> {
    let relations = dialog.relations.as_deref()?;
    match query_type {
        QueryType::Create
        | QueryType::ReadByKey
        | QueryType::UpdateByKey
        | QueryType::DeleteByKey => Some(
            relations
                .iter()
                .map(|r| r.relation_name.clone())
                .collect(),
        ),
        QueryType::ReadList => Some(
            relations
                .iter()
                .filter(|r| r.is_many_to_many())
                .map(|r| r.relation_name.clone())
                .collect(),
        ),
        QueryType::AggregatedReadList
        | QueryType::Delete
        | QueryType::Procedure
        | QueryType::TableFunction
        | QueryType::ScalarFunction => None,
    }
}

/// Select a column, expanding foreign keys into their target's display columns.
fn project<D: DialogStore>(
    column: &Column,
    dialog: &Dialog,
    store: &D,
) -> Result<QueryColumn, DialogError> {
    let mut query_column = QueryColumn::new(&column.name);
    let Some(fk) = &column.fk else {
        return Ok(query_column);
    };
    query_column.ref_to = if fk.target_table == dialog.object_name {
        reference_projection(column, fk, dialog)
    } else {
        store
            .try_load(&fk.target_table)?
            .and_then(|target| reference_projection(column, fk, &target))
    };
    Ok(query_column)
}

/// Display columns of `target` as seen through `column`.
#[must_use]
pub fn reference_projection(column: &Column, fk: &ForeignKey, target: &Dialog) -> Option<RefTo> {
    let aliased = |c: &Column| QueryColumn::aliased(&c.name, format!("{}_{}", column.name, c.name));

    let mut columns: Vec<QueryColumn> = target
        .columns
        .iter()
        .filter(|c| conventions::is_display_name(&c.name))
        .map(aliased)
        .collect();
    if columns.is_empty() {
        columns.push(target.columns.iter().find(|c| !c.is_primary_key).map(aliased)?);
    }

    Some(RefTo {
        target_table: fk.target_table.clone(),
        target_column: fk.target_column.clone(),
        columns,
    })
}

fn param_for(column: &Column, expression: ValueExpression) -> Param {
    Param {
        name: column.name.clone(),
        db_type: column.db_type.clone(),
        size: column.size.clone(),
        allow_null: column.allow_null,
        value_expression: Some(expression),
    }
}

fn resize_param(column: &Column) -> Param {
    param_for(
        column,
        ValueExpression::Resize {
            source: conventions::thumbnail_source(&column.name).to_string(),
            size: THUMBNAIL_SIZE,
        },
    )
}

fn actor_param(column: &Column) -> Param {
    let mut param = param_for(
        column,
        ValueExpression::Context {
            key: CONTEXT_USER_ID.to_string(),
        },
    );
    param.db_type = ACTOR_TYPE.to_string();
    param.size = None;
    param
}

fn now_param(column: &Column) -> Param {
    param_for(column, ValueExpression::Now)
}

// =============================================================================
// TESTS
// =============================================================================
