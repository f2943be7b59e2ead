//! # Relation Inference
//!
//! Scans every table for a foreign key back to the dialog's object and
//! classifies what it finds:
//! - a referencing table with exactly three non-audit columns whose third
//!   column is a foreign key is a linking table (many-to-many)
//! - anything else is one-to-many, shown as cards when the child rows are
//!   mostly files, else as a grid
//!
//! Objects with a base-info name are never given relations.

use crate::conventions;
use crate::facts::SchemaFacts;
use crate::types::{Column, Dialog, DialogError, Relation, RelationType, RelationUiWidget};
use std::collections::BTreeSet;
use tracing::debug;

/// Number of columns of a linking table: own key, back-reference, link.
const LINKING_TABLE_WIDTH: usize = 3;

/// Infer the relations of `dialog` from the schema.
///
/// Returns `Ok(None)` when no relation qualifies, so a persisted document
/// can tell "none found" apart from an empty list the user edited.
pub fn infer<S: SchemaFacts>(
    dialog: &Dialog,
    schema: &S,
) -> Result<Option<Vec<Relation>>, DialogError> {
    if conventions::is_base_info(&dialog.object_name) {
        debug!("Skipping relations of base-info object {}", dialog.object_name);
        return Ok(None);
    }

    let mut relations = Vec::new();
    for table in schema.list_tables()? {
        if table.name == dialog.object_name {
            continue;
        }
        let columns: Vec<Column> = schema
            .get_columns(&table.name)?
            .into_iter()
            .filter(|c| !conventions::is_audit_column(&c.name))
            .collect();
        if let Some(relation) = relation_from(&dialog.object_name, &table.name, &columns) {
            debug!(
                "Inferred {:?} relation {} for {}",
                relation.relation_type, relation.relation_name, dialog.object_name
            );
            relations.push(relation);
        }
    }

    Ok((!relations.is_empty()).then_some(relations))
}

/// Relation from `table` (audit columns already removed) to `object`, if any.
#[must_use]
pub fn relation_from(object: &str, table: &str, columns: &[Column]) -> Option<Relation> {
    let pk = columns.iter().find(|c| c.is_primary_key)?;
    let back_reference = columns.iter().find(|c| {
        c.fk
            .as_ref()
            .is_some_and(|fk| fk.target_table == object)
    })?;

    let mut relation = Relation::one_to_many(table, &pk.name, &back_reference.name);
    relation.is_file_centric = is_file_centric(columns);

    let link = (columns.len() == LINKING_TABLE_WIDTH)
        .then(|| {
            columns
                .iter()
                .find(|c| c.name != pk.name && c.name != back_reference.name)
        })
        .flatten()
        .and_then(|c| c.fk.as_ref().map(|fk| (c, fk)));

    match link {
        Some((column, fk)) => {
            relation.relation_type = RelationType::ManyToMany;
            relation.linking_target_table = Some(fk.target_table.clone());
            relation.linking_column = Some(column.name.clone());
            relation.relation_ui_widget = if conventions::is_tagging(&fk.target_table) {
                RelationUiWidget::AddableList
            } else {
                RelationUiWidget::CheckboxList
            };
        }
        None => {
            relation.relation_ui_widget = if relation.is_file_centric {
                RelationUiWidget::Cards
            } else {
                RelationUiWidget::Grid
            };
        }
    }
    Some(relation)
}

/// Child rows that are mostly files: at least one binary column, and
/// binary or file-meta columns make up half of the payload columns.
#[must_use]
pub fn is_file_centric(columns: &[Column]) -> bool {
    let payload: Vec<&Column> = columns
        .iter()
        .filter(|c| !c.is_primary_key && c.fk.is_none())
        .collect();
    let binary = payload.iter().filter(|c| c.is_binary()).count();
    if binary == 0 {
        return false;
    }
    let file_like = payload
        .iter()
        .filter(|c| c.is_binary() || conventions::is_file_meta(&c.name))
        .count();
    file_like * 2 >= payload.len()
}

/// Remove query references to relations the dialog no longer has.
///
/// Returns the number of references removed.
pub fn prune_relation_refs(dialog: &mut Dialog) -> usize {
    let live: BTreeSet<String> = dialog
        .relations
        .iter()
        .flatten()
        .map(|r| r.relation_name.clone())
        .collect();

    let mut removed = 0;
    for query in &mut dialog.queries {
        if let Some(names) = query.relations.as_mut() {
            let before = names.len();
            names.retain(|n| live.contains(n));
            removed += before - names.len();
        }
    }
    if removed > 0 {
        debug!(
            "Pruned {} dangling relation references from {}",
            removed, dialog.object_name
        );
    }
    removed
}

// =============================================================================
// TESTS
// =============================================================================
