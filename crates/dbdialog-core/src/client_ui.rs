//! # Client UI Binding
//!
//! A query that a form or list renders gets a UI component binding named
//! `{ds}_{object}_{query}`. The name is the only dedup key: binding a
//! query twice reuses the existing entry.

use crate::conventions::TREE_LIST_TEMPLATE;
use crate::types::{ClientUi, Dialog, Query, QueryType};

/// Component name of a query's UI.
#[must_use]
pub fn component_name(data_source: &str, object: &str, query: &str) -> String {
    format!("{}_{}_{}", data_source, object, query)
}

/// Only list, create and update queries get a UI.
#[must_use]
pub const fn is_eligible(query_type: QueryType) -> bool {
    matches!(
        query_type,
        QueryType::ReadList | QueryType::AggregatedReadList | QueryType::Create | QueryType::UpdateByKey
    )
}

#[must_use]
pub fn template_name(dialog: &Dialog, query: &Query) -> String {
    if query.query_type == QueryType::ReadList && dialog.is_tree() {
        TREE_LIST_TEMPLATE.to_string()
    } else {
        query.query_type.as_str().to_string()
    }
}

/// Build the binding of `query`, reusing the existing one with the same name.
///
/// The boolean reports whether a binding already existed.
#[must_use]
pub fn bind_or_reuse(dialog: &Dialog, query: &Query, read_by_key_api: &str) -> (ClientUi, bool) {
    let file_name = component_name(&dialog.data_source, &dialog.object_name, &query.name);
    let existing = dialog
        .client_uis
        .iter()
        .flatten()
        .find(|ui| ui.file_name.eq_ignore_ascii_case(&file_name))
        .cloned();
    let existed = existing.is_some();
    let mut ui = existing.unwrap_or_else(|| ClientUi {
        file_name,
        template_name: String::new(),
        load_api: None,
        submit_api: None,
    });

    ui.template_name = template_name(dialog, query);
    match query.query_type {
        QueryType::Create => {
            ui.submit_api = Some(query.name.clone());
            ui.load_api = None;
        }
        QueryType::UpdateByKey => {
            ui.submit_api = Some(query.name.clone());
            ui.load_api = Some(read_by_key_api.to_string());
        }
        _ => {
            ui.load_api = Some(query.name.clone());
            ui.submit_api = None;
        }
    }
    (ui, existed)
}

/// Store a binding: replace the existing entry in place or append.
pub fn upsert(dialog: &mut Dialog, ui: ClientUi, existed: bool) {
    let uis = dialog.client_uis.get_or_insert_with(Vec::new);
    let position = existed
        .then(|| {
            uis.iter()
                .position(|u| u.file_name.eq_ignore_ascii_case(&ui.file_name))
        })
        .flatten();
    match position {
        Some(index) => uis[index] = ui,
        None => uis.push(ui),
    }
}

/// Bind an eligible query. Returns whether a binding was written.
pub fn attach(dialog: &mut Dialog, query: &Query, read_by_key_api: &str) -> bool {
    if !is_eligible(query.query_type) {
        return false;
    }
    let (ui, existed) = bind_or_reuse(dialog, query, read_by_key_api);
    upsert(dialog, ui, existed);
    true
}

/// Remove the binding of a removed query. Returns whether one was removed.
pub fn unbind(dialog: &mut Dialog, query: &str) -> bool {
    let file_name = component_name(&dialog.data_source, &dialog.object_name, query);
    let Some(uis) = dialog.client_uis.as_mut() else {
        return false;
    };
    let before = uis.len();
    uis.retain(|u| !u.file_name.eq_ignore_ascii_case(&file_name));
    before != uis.len()
}

// =============================================================================
// TESTS
// =============================================================================
