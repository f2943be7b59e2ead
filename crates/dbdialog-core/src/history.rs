//! # History Tables
//!
//! A partial update can keep a change log. The log table references the
//! source row, mirrors every non-key column the update writes and records
//! who changed it and when.

use crate::conventions::{
    ACTOR_TYPE, CREATED_BY, CREATED_ON, IDENTITY_TYPE, LOG_ID_COLUMN, LOG_MASTER_COLUMN,
    LOG_TABLE_IDENTITY_START, LOG_TABLE_IDENTITY_STEP, TIMESTAMP_TYPE,
};
use crate::facts::{TableColumnSpec, TableSpec};
use crate::types::{Column, Dialog, DialogError, ForeignKey, Query};

/// `{table}{query}Log`.
#[must_use]
pub fn log_table_name(table: &str, query: &str) -> String {
    format!("{}{}Log", table, query)
}

/// Table specification of the change log of `update_query`.
pub fn plan_log_table(
    dialog: &Dialog,
    update_query: &Query,
    log_table: &str,
) -> Result<TableSpec, DialogError> {
    let pk = dialog.primary_key()?;

    let mut id = TableColumnSpec::new(LOG_ID_COLUMN, IDENTITY_TYPE, false);
    id.is_primary_key = true;
    id.is_identity = true;
    id.identity_start = Some(LOG_TABLE_IDENTITY_START.to_string());
    id.identity_step = Some(LOG_TABLE_IDENTITY_STEP.to_string());

    let mut master = TableColumnSpec::new(LOG_MASTER_COLUMN, &pk.db_type, false);
    master.size.clone_from(&pk.size);
    master.fk = Some(ForeignKey::new(
        format!("FK_{}_{}", log_table, dialog.object_name),
        &dialog.object_name,
        &pk.name,
    ));

    let mut columns = vec![id, master];
    for query_column in &update_query.columns {
        let column = dialog
            .column(&query_column.name)
            .ok_or_else(|| DialogError::ColumnNotFound {
                object: dialog.object_name.clone(),
                column: query_column.name.clone(),
            })?;
        if column.is_primary_key || columns.iter().any(|c| c.name == column.name) {
            continue;
        }
        columns.push(mirror(column));
    }

    columns.retain(|c| c.name != CREATED_BY && c.name != CREATED_ON);
    columns.push(TableColumnSpec::new(CREATED_BY, ACTOR_TYPE, false));
    columns.push(TableColumnSpec::new(CREATED_ON, TIMESTAMP_TYPE, false));

    Ok(TableSpec {
        name: log_table.to_string(),
        columns,
    })
}

fn mirror(column: &Column) -> TableColumnSpec {
    let mut spec = TableColumnSpec::new(&column.name, &column.db_type, column.allow_null);
    spec.size.clone_from(&column.size);
    spec
}

/// Planned columns absent from an existing log table.
#[must_use]
pub fn missing_columns(spec: &TableSpec, existing: &[Column]) -> Vec<String> {
    spec.columns
        .iter()
        .filter(|planned| !existing.iter().any(|c| c.name == planned.name))
        .map(|planned| planned.name.clone())
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
