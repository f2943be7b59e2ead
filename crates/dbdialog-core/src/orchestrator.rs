//! # Server Object Orchestration
//!
//! The workflows another layer calls: generating every server object of a
//! schema object, adding and removing queries, partial updates with history
//! tables, logical foreign keys, and reconciliation with the schema.
//!
//! ## Mutation discipline
//!
//! Every workflow loads the dialog once, changes the loaded working copy and
//! persists it once. An error before the save leaves the persisted document
//! untouched. DDL issued through [`SchemaFacts`] is not rolled back; rerunning
//! the same workflow (or [`ServerObjectOrchestrator::sync`]) recovers.

use crate::client_ui;
use crate::codegen::CodeArtifactGenerator;
use crate::conventions::{
    self, ACTOR_TYPE, DEFAULT_SETTLE_DELAY_MS, ICON_LIST, ICON_TREE, MAIN_UPDATE_QUERY,
    READ_BY_KEY_QUERY, TIMESTAMP_TYPE,
};
use crate::facts::SchemaFacts;
use crate::history;
use crate::relations;
use crate::store::DialogStore;
use crate::sync::{self, SyncReport};
use crate::synthesis::{self, UpdateSpec};
use crate::types::{
    Column, DbObject, Dialog, DialogError, ForeignKey, ObjectType, Query, QueryColumn, QueryType,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Standard query set of a table, in generation order.
pub const TABLE_QUERY_SET: [QueryType; 6] = [
    QueryType::Create,
    QueryType::ReadByKey,
    QueryType::ReadList,
    QueryType::UpdateByKey,
    QueryType::Delete,
    QueryType::DeleteByKey,
];

// =============================================================================
// OPTIONS & REQUESTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Data source every dialog belongs to.
    pub data_source: String,
    /// Pause after DDL before schema facts are re-read.
    pub settle_delay: Duration,
}

impl OrchestratorOptions {
    #[must_use]
    pub fn new(data_source: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
        }
    }

    #[must_use]
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }
}

/// A partial UpdateByKey over an explicit column subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialUpdateRequest {
    pub object: String,
    pub name: String,
    pub columns: Vec<String>,
    /// ReadByKey query the update form loads from.
    pub read_by_key_api: String,
    /// Custom "changed by" column, created when absent.
    pub by_column: Option<String>,
    /// Custom "changed on" column, created when absent.
    pub on_column: Option<String>,
    /// Change-log table to keep.
    pub history_table: Option<String>,
}

impl PartialUpdateRequest {
    #[must_use]
    pub fn new(object: impl Into<String>, name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            object: object.into(),
            name: name.into(),
            columns,
            read_by_key_api: READ_BY_KEY_QUERY.to_string(),
            by_column: None,
            on_column: None,
            history_table: None,
        }
    }

    #[must_use]
    pub fn with_by(mut self, column: impl Into<String>) -> Self {
        self.by_column = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_on(mut self, column: impl Into<String>) -> Self {
        self.on_column = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_history(mut self, table: impl Into<String>) -> Self {
        self.history_table = Some(table.into());
        self
    }

    #[must_use]
    pub fn with_read_by_key_api(mut self, name: impl Into<String>) -> Self {
        self.read_by_key_api = name.into();
        self
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// Drives schema facts, code generation and dialog storage.
#[derive(Debug)]
pub struct ServerObjectOrchestrator<S, G, D> {
    schema: S,
    generator: G,
    store: D,
    options: OrchestratorOptions,
}

impl<S: SchemaFacts, G: CodeArtifactGenerator, D: DialogStore> ServerObjectOrchestrator<S, G, D> {
    #[must_use]
    pub fn new(schema: S, generator: G, store: D, options: OrchestratorOptions) -> Self {
        Self {
            schema,
            generator,
            store,
            options,
        }
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut S {
        &mut self.schema
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Load a persisted dialog.
    pub fn dialog(&self, object: &str) -> Result<Dialog, DialogError> {
        self.store.load(object)
    }

    fn qualified(&self, object: &str) -> String {
        format!("{}.{}", self.options.data_source, object)
    }

    fn persist(&mut self, dialog: &Dialog) -> Result<(), DialogError> {
        self.store.save(dialog)?;
        debug!("Saved dialog {}.{}", dialog.data_source, dialog.object_name);
        Ok(())
    }

    /// Regenerate the companion artifact from the dialog's method list.
    fn write_artifact(&mut self, dialog: &Dialog) -> Result<(), DialogError> {
        let source = self
            .generator
            .generate(&dialog.object_name, &dialog.method_names())?;
        self.store.save_artifact(&dialog.object_name, &source)
    }

    fn register_method(&mut self, dialog: &Dialog, method: &str) -> Result<(), DialogError> {
        self.generator
            .add_method(&self.qualified(&dialog.object_name), method)?;
        self.generator.refresh()?;
        self.write_artifact(dialog)
    }

    fn settle(&self) {
        if !self.options.settle_delay.is_zero() {
            std::thread::sleep(self.options.settle_delay);
        }
    }

    fn bind_ui(dialog: &mut Dialog, query: &Query, read_by_key_api: &str) {
        if client_ui::attach(dialog, query, read_by_key_api) {
            debug!("Bound client UI of {}.{}", dialog.object_name, query.name);
        }
    }

    // -------------------------------------------------------------------------
    // Logical foreign keys
    // -------------------------------------------------------------------------

    /// Declare a foreign key the database does not enforce.
    pub fn create_logical_fk(
        &mut self,
        fk_name: &str,
        base_table: &str,
        base_column: &str,
        target_table: &str,
        target_column: &str,
    ) -> Result<(), DialogError> {
        let mut dialog = self.store.load(base_table)?;
        let column = find_column_mut(&mut dialog, base_table, base_column)?;
        column.fk = Some(ForeignKey::logical(fk_name, target_table, target_column));
        crate::classifier::apply(column);
        self.persist(&dialog)?;
        info!(
            "Created logical FK {} ({}.{} -> {}.{})",
            fk_name, base_table, base_column, target_table, target_column
        );
        Ok(())
    }

    pub fn remove_logical_fk(
        &mut self,
        base_table: &str,
        base_column: &str,
    ) -> Result<(), DialogError> {
        let mut dialog = self.store.load(base_table)?;
        let column = find_column_mut(&mut dialog, base_table, base_column)?;
        column.fk = None;
        crate::classifier::apply(column);
        self.persist(&dialog)?;
        info!("Removed FK of {}.{}", base_table, base_column);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Add a query of the given type keyword to an existing dialog.
    pub fn create_query(
        &mut self,
        object: &str,
        type_keyword: &str,
        name: &str,
    ) -> Result<Query, DialogError> {
        const SITE: &str = "create_query";
        let query_type = QueryType::parse(type_keyword, SITE)?;
        if !query_type.is_creatable() {
            return Err(DialogError::UnsupportedQueryType {
                query_type: type_keyword.to_string(),
                site: SITE.to_string(),
            });
        }

        let mut dialog = self.store.load(object)?;
        if dialog.query_ignore_case(name).is_some() {
            return Err(DialogError::DuplicateQuery {
                object: object.to_string(),
                query: name.to_string(),
            });
        }

        let query = synthesis::build_query(
            query_type,
            name,
            &dialog,
            &UpdateSpec::Main,
            &self.schema,
            &self.store,
        )?;
        if query_type == QueryType::UpdateByKey {
            synthesis::assign_update_group(&mut dialog, &query);
        }
        dialog.add_query(query.clone())?;
        Self::bind_ui(&mut dialog, &query, READ_BY_KEY_QUERY);
        self.persist(&dialog)?;
        self.register_method(&dialog, name)?;
        info!("Created {} query {}.{}", query_type, object, name);
        Ok(query)
    }

    /// Create (or rebuild) a partial UpdateByKey query.
    pub fn create_partial_update(
        &mut self,
        request: &PartialUpdateRequest,
    ) -> Result<Query, DialogError> {
        let object = request.object.as_str();
        if request.columns.is_empty() {
            return Err(DialogError::EmptyUpdateColumns {
                object: object.to_string(),
            });
        }

        let mut dialog = self.store.load(object)?;
        if dialog
            .query_ignore_case(&request.name)
            .is_some_and(|q| q.query_type != QueryType::UpdateByKey)
        {
            return Err(DialogError::DuplicateQuery {
                object: object.to_string(),
                query: request.name.clone(),
            });
        }
        let pk = dialog.primary_key()?.name.clone();
        let mut columns = Vec::with_capacity(request.columns.len());
        for name in &request.columns {
            let column = dialog
                .column_ignore_case(name)
                .ok_or_else(|| DialogError::ColumnNotFound {
                    object: object.to_string(),
                    column: name.clone(),
                })?;
            columns.push(column.name.clone());
        }

        let by = non_empty(request.by_column.as_ref());
        let on = non_empty(request.on_column.as_ref());
        for (audit, db_type) in [(by, ACTOR_TYPE), (on, TIMESTAMP_TYPE)] {
            let Some(audit) = audit else { continue };
            if dialog.column_ignore_case(audit).is_none() {
                self.schema.create_column(object, audit, db_type, true)?;
                let mut column = Column::new(audit, db_type);
                crate::classifier::apply(&mut column);
                dialog.columns.push(column);
                info!("Created audit column {}.{}", object, audit);
            }
        }

        let released: Vec<&str> = columns
            .iter()
            .map(String::as_str)
            .chain(by)
            .chain(on)
            .filter(|c| !c.eq_ignore_ascii_case(&pk))
            .collect();
        if let Some(main) = dialog.query_ignore_case_mut(MAIN_UPDATE_QUERY) {
            for name in &released {
                main.remove_column(name);
            }
        }
        if let Some(read_by_key) = dialog.query_mut(&request.read_by_key_api) {
            for name in &columns {
                if !read_by_key.has_column(name) {
                    read_by_key.columns.push(QueryColumn::new(name));
                }
            }
        }

        let spec = UpdateSpec::Partial {
            columns,
            by_column: by.map(str::to_string),
            on_column: on.map(str::to_string),
        };
        let mut query = synthesis::build_update_by_key(&dialog, &request.name, &spec)?;
        if let Some(history) = non_empty(request.history_table.as_ref()) {
            query.log_table = Some(history.to_string());
        }
        dialog.upsert_query(query.clone());
        synthesis::assign_update_group(&mut dialog, &query);
        Self::bind_ui(&mut dialog, &query, &request.read_by_key_api);
        self.persist(&dialog)?;
        self.register_method(&dialog, &query.name)?;
        info!(
            "Created partial update {}.{} over {:?}",
            object,
            query.name,
            query.column_names()
        );

        if let Some(history) = query.log_table.clone() {
            self.ensure_log_table(object, &query.name, &history)?;
        }
        Ok(query)
    }

    /// Make sure the change-log table of `update_query` exists and is complete.
    pub fn ensure_log_table(
        &mut self,
        object: &str,
        update_query: &str,
        log_table: &str,
    ) -> Result<(), DialogError> {
        let dialog = self.store.load(object)?;
        let Some(query) = dialog.query(update_query) else {
            debug!("No update query {}.{}, skipping log table", object, update_query);
            return Ok(());
        };
        let spec = history::plan_log_table(&dialog, query, log_table)?;

        let log_object = match self.schema.get_object(log_table)? {
            None => {
                self.schema.create_or_alter_table(&spec)?;
                info!("Created log table {}", log_table);
                self.settle();
                self.schema.get_object(log_table)?.ok_or_else(|| {
                    DialogError::Schema(format!("log table {} not visible after creation", log_table))
                })?
            }
            Some(existing) => {
                let live = self.schema.get_columns(log_table)?;
                let missing = history::missing_columns(&spec, &live);
                if !missing.is_empty() {
                    self.schema.create_or_alter_table(&spec)?;
                    info!("Added {:?} to log table {}", missing, log_table);
                    self.settle();
                }
                existing
            }
        };

        if !self.store.exists(&log_object.name)? {
            self.create_server_objects(&log_object)?;
        }
        Ok(())
    }

    /// Copy a query under a new name.
    pub fn duplicate_query(
        &mut self,
        object: &str,
        name: &str,
        copy_name: &str,
    ) -> Result<Query, DialogError> {
        let mut dialog = self.store.load(object)?;
        let source = dialog
            .query(name)
            .ok_or_else(|| DialogError::QueryNotFound {
                object: object.to_string(),
                query: name.to_string(),
            })?;
        if dialog.query_ignore_case(copy_name).is_some() {
            return Err(DialogError::DuplicateQuery {
                object: object.to_string(),
                query: copy_name.to_string(),
            });
        }

        let round_trip = || DialogError::RoundTrip {
            object: object.to_string(),
            query: name.to_string(),
        };
        let text = serde_json::to_string(source).map_err(|_| round_trip())?;
        let mut copy: Query = serde_json::from_str(&text).map_err(|_| round_trip())?;
        copy.name = copy_name.to_string();

        dialog.add_query(copy.clone())?;
        self.persist(&dialog)?;
        self.register_method(&dialog, copy_name)?;
        info!("Duplicated {}.{} as {}", object, name, copy_name);
        Ok(copy)
    }

    /// Remove a query with its UI binding, update groups and change log.
    pub fn remove_query(&mut self, object: &str, name: &str) -> Result<(), DialogError> {
        let mut dialog = self.store.load(object)?;
        let query = dialog
            .remove_query(name)
            .ok_or_else(|| DialogError::QueryNotFound {
                object: object.to_string(),
                query: name.to_string(),
            })?;

        for column in &mut dialog.columns {
            if column.update_group.as_deref() == Some(name) {
                column.update_group = None;
            }
        }

        let log_table = non_empty(query.log_table.as_ref());
        let shared = log_table.is_some_and(|log| {
            dialog
                .queries
                .iter()
                .any(|q| q.log_table.as_deref().is_some_and(|t| t.eq_ignore_ascii_case(log)))
        });
        if shared {
            debug!(
                "Log table of {}.{} is still used by another query, keeping it",
                object, name
            );
        } else if let Some(log_table) = log_table {
            self.remove_server_objects(log_table)?;
            if self.schema.get_object(log_table)?.is_some() {
                self.schema.drop_table(log_table)?;
                info!("Dropped log table {}", log_table);
            }
        }

        client_ui::unbind(&mut dialog, name);
        self.persist(&dialog)?;
        self.generator
            .remove_method(&format!("{}.{}", self.qualified(object), name))?;
        self.generator.refresh()?;
        self.write_artifact(&dialog)?;
        info!("Removed query {}.{}", object, name);
        Ok(())
    }

    /// Rebuild one query in place.
    pub fn recreate_query(&mut self, object: &str, name: &str) -> Result<Query, DialogError> {
        let mut dialog = self.store.load(object)?;
        let existing = dialog
            .query(name)
            .cloned()
            .ok_or_else(|| DialogError::QueryNotFound {
                object: object.to_string(),
                query: name.to_string(),
            })?;

        let spec = if existing.query_type == QueryType::UpdateByKey {
            UpdateSpec::for_existing(&existing)
        } else {
            UpdateSpec::Main
        };
        let mut query = synthesis::build_query(
            existing.query_type,
            name,
            &dialog,
            &spec,
            &self.schema,
            &self.store,
        )?;
        query.log_table = existing.log_table;
        dialog.upsert_query(query.clone());
        if query.query_type == QueryType::UpdateByKey {
            synthesis::assign_update_group(&mut dialog, &query);
        }
        Self::bind_ui(&mut dialog, &query, READ_BY_KEY_QUERY);
        self.persist(&dialog)?;
        info!("Recreated query {}.{}", object, name);
        Ok(query)
    }

    // -------------------------------------------------------------------------
    // Relations & sync
    // -------------------------------------------------------------------------

    /// Re-infer relations and drop references to relations that vanished.
    pub fn refresh_relations(&mut self, object: &str) -> Result<Dialog, DialogError> {
        let mut dialog = self.store.load(object)?;
        dialog.relations = relations::infer(&dialog, &self.schema)?;
        relations::prune_relation_refs(&mut dialog);
        self.persist(&dialog)?;
        info!("Refreshed relations of {}", object);
        Ok(dialog)
    }

    /// Drop dangling relation references. A missing dialog is a no-op.
    pub fn prune_relations(&mut self, object: &str) -> Result<usize, DialogError> {
        let Some(mut dialog) = self.store.try_load(object)? else {
            warn!("No dialog for {}, nothing to prune", object);
            return Ok(0);
        };
        let removed = relations::prune_relation_refs(&mut dialog);
        self.persist(&dialog)?;
        Ok(removed)
    }

    /// Reconcile a dialog with the live schema. A missing dialog is a no-op.
    pub fn sync(&mut self, object: &str) -> Result<Option<SyncReport>, DialogError> {
        let Some(mut dialog) = self.store.try_load(object)? else {
            warn!("No dialog for {}, nothing to sync", object);
            return Ok(None);
        };
        let live = self.schema.get_columns(object)?;
        let report = sync::reconcile(&mut dialog, &live);
        self.persist(&dialog)?;
        info!(
            "Synced {} (+{} -{})",
            object,
            report.added.len(),
            report.removed.len()
        );
        Ok(Some(report))
    }

    // -------------------------------------------------------------------------
    // Server objects
    // -------------------------------------------------------------------------

    /// Generate the dialog, queries, UI bindings and artifact of an object.
    pub fn create_server_objects(&mut self, object: &DbObject) -> Result<Dialog, DialogError> {
        let name = object.name.as_str();
        let mut dialog = Dialog::new(&self.options.data_source, name, object.object_type);

        if object.object_type.has_columns() {
            let mut columns = self.schema.get_columns(name)?;
            for column in &mut columns {
                column.is_human_id = crate::classifier::is_display_column(column);
                crate::classifier::apply(column);
            }
            dialog.columns = columns;
            dialog.relations = relations::infer(&dialog, &self.schema)?;
            apply_display_metadata(&mut dialog);
        }

        let query_types: &[QueryType] = match object.object_type {
            ObjectType::Table => &TABLE_QUERY_SET,
            ObjectType::View => &[QueryType::ReadList],
            ObjectType::Procedure => &[QueryType::Procedure],
            ObjectType::TableFunction => &[QueryType::TableFunction],
            ObjectType::ScalarFunction => &[QueryType::ScalarFunction],
        };
        for &query_type in query_types {
            let query = synthesis::build_query(
                query_type,
                query_type.default_name(),
                &dialog,
                &UpdateSpec::Main,
                &self.schema,
                &self.store,
            )?;
            if query_type == QueryType::UpdateByKey {
                synthesis::assign_update_group(&mut dialog, &query);
            }
            dialog.add_query(query)?;
        }

        let queries = dialog.queries.clone();
        for query in &queries {
            Self::bind_ui(&mut dialog, query, READ_BY_KEY_QUERY);
        }

        self.persist(&dialog)?;
        self.generator.refresh()?;
        self.write_artifact(&dialog)?;
        info!(
            "Created server objects of {} {} ({} queries)",
            object.object_type,
            name,
            dialog.queries.len()
        );

        if object.object_type == ObjectType::Table {
            for request in auxiliary_updates(&dialog) {
                self.create_partial_update(&request)?;
            }
        }

        self.store.load(name)
    }

    /// Delete the dialog and artifact of an object.
    pub fn remove_server_objects(&mut self, object: &str) -> Result<(), DialogError> {
        self.store.delete(object)?;
        self.generator.refresh()?;
        info!("Removed server objects of {}", object);
        Ok(())
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn find_column_mut<'a>(
    dialog: &'a mut Dialog,
    object: &str,
    column: &str,
) -> Result<&'a mut Column, DialogError> {
    dialog
        .column_mut(column)
        .ok_or_else(|| DialogError::ColumnNotFound {
            object: object.to_string(),
            column: column.to_string(),
        })
}

/// Icon and display-column references from naming conventions.
pub fn apply_display_metadata(dialog: &mut Dialog) {
    use conventions::ConventionRole;

    let icon = if dialog.is_tree() { ICON_TREE } else { ICON_LIST };
    dialog.open_create_update_inline = true;
    dialog.object_icon = Some(icon.to_string());
    dialog.note_column = role_column(dialog, ConventionRole::NoteColumn);
    dialog.view_order_column = role_column(dialog, ConventionRole::ViewOrderColumn);
    dialog.ui_color_column = role_column(dialog, ConventionRole::UiColorColumn);
    dialog.ui_icon_column = role_column(dialog, ConventionRole::UiIconColumn);
}

fn role_column(dialog: &Dialog, role: conventions::ConventionRole) -> Option<String> {
    dialog
        .columns
        .iter()
        .find(|c| conventions::has_role(&c.name, role))
        .map(|c| c.name.clone())
}

/// Single-column partial updates for columns with their own audit pair.
#[must_use]
pub fn auxiliary_updates(dialog: &Dialog) -> Vec<PartialUpdateRequest> {
    let lookup = |candidates: &[String; 2]| {
        candidates
            .iter()
            .find_map(|c| dialog.column(c))
            .map(|c| c.name.clone())
    };

    dialog
        .columns
        .iter()
        .filter(|c| !c.is_primary_key && !c.is_identity)
        .filter_map(|column| {
            let (by_candidates, on_candidates) =
                conventions::auxiliary_audit_candidates(&column.name);
            let by = lookup(&by_candidates);
            let on = lookup(&on_candidates);
            if by.is_none() && on.is_none() {
                return None;
            }
            let mut request = PartialUpdateRequest::new(
                &dialog.object_name,
                conventions::auxiliary_update_name(&column.name),
                vec![column.name.clone()],
            );
            request.by_column = by;
            request.on_column = on;
            Some(request)
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::StubGenerator;
    use crate::facts::MemorySchema;
    use crate::store::MemoryDialogStore;

    type Orchestrator = ServerObjectOrchestrator<MemorySchema, StubGenerator, MemoryDialogStore>;

    fn orchestrator(schema: MemorySchema) -> Orchestrator {
        ServerObjectOrchestrator::new(
            schema,
            StubGenerator::new("Shop"),
            MemoryDialogStore::new("Shop"),
            OrchestratorOptions::new("Shop").with_settle_delay(Duration::ZERO),
        )
    }

    fn products() -> MemorySchema {
        MemorySchema::new().with_table(
            "Products",
            vec![
                Column::new("Id", "int").primary_key().identity(),
                Column::new("ProductName", "nvarchar").with_size("100").not_null(),
                Column::new("Price", "decimal"),
                Column::new("PriceUpdatedBy", "int"),
                Column::new("Note", "nvarchar").with_size("MAX"),
                Column::new("UpdatedBy", "int"),
                Column::new("UpdatedOn", "datetime"),
            ],
        )
    }

    #[test]
    fn table_gets_standard_queries_and_auxiliary_update() {
        let mut orch = orchestrator(products());
        let dialog = orch
            .create_server_objects(&DbObject::table("Products"))
            .expect("create");

        assert_eq!(
            dialog.method_names(),
            vec![
                "Create",
                "ReadByKey",
                "ReadList",
                "UpdateByKey",
                "Delete",
                "DeleteByKey",
                "PriceUpdate"
            ]
        );
        let main = dialog.query("UpdateByKey").expect("main");
        assert!(!main.has_column("Price"));
        assert!(!main.has_column("PriceUpdatedBy"));
        assert!(main.has_column("ProductName"));

        let price = dialog.query("PriceUpdate").expect("price update");
        assert_eq!(price.column_names(), vec!["Id", "Price", "PriceUpdatedBy"]);
        assert_eq!(
            dialog.column("Price").and_then(|c| c.update_group.as_deref()),
            Some("PriceUpdate")
        );
        assert!(dialog.validate().is_ok());
    }

    #[test]
    fn display_metadata_follows_conventions() {
        let mut orch = orchestrator(products());
        let dialog = orch
            .create_server_objects(&DbObject::table("Products"))
            .expect("create");
        assert!(dialog.open_create_update_inline);
        assert_eq!(dialog.object_icon.as_deref(), Some("fa-list"));
        assert_eq!(dialog.note_column.as_deref(), Some("Note"));
        assert!(dialog.column("ProductName").is_some_and(|c| c.is_human_id));
    }

    #[test]
    fn artifact_lists_generated_methods() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");
        let artifact = orch
            .store()
            .load_artifact("Products")
            .expect("load")
            .expect("artifact");
        assert!(artifact.contains("pub fn price_update("));
        assert_eq!(
            orch.generator().methods("Shop.Products"),
            vec!["PriceUpdate".to_string()]
        );
    }

    #[test]
    fn create_query_rejects_unsupported_types() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");

        for keyword in ["Delete", "Merge"] {
            let err = orch
                .create_query("Products", keyword, "Other")
                .expect_err("unsupported");
            assert_eq!(
                err,
                DialogError::UnsupportedQueryType {
                    query_type: keyword.to_string(),
                    site: "create_query".to_string(),
                }
            );
        }
    }

    #[test]
    fn create_query_adds_named_query_with_ui() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");

        let query = orch
            .create_query("Products", "aggregatedreadlist", "Stats")
            .expect("create query");
        assert_eq!(query.name, "Stats");
        assert_eq!(query.query_type, QueryType::AggregatedReadList);

        let dialog = orch.dialog("Products").expect("load");
        assert!(dialog
            .client_uis
            .iter()
            .flatten()
            .any(|u| u.file_name == "Shop_Products_Stats"));
        assert!(matches!(
            orch.create_query("Products", "ReadList", "Stats"),
            Err(DialogError::DuplicateQuery { .. })
        ));
    }

    #[test]
    fn partial_update_creates_missing_audit_columns() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");

        let request = PartialUpdateRequest::new("Products", "NameUpdate", vec!["ProductName".to_string()])
            .with_by("NameChangedBy")
            .with_on("NameChangedOn");
        let query = orch.create_partial_update(&request).expect("partial");
        assert_eq!(
            query.column_names(),
            vec!["Id", "ProductName", "NameChangedBy", "NameChangedOn"]
        );

        let live = orch.schema().get_columns("Products").expect("columns");
        let created: Vec<&Column> = live
            .iter()
            .filter(|c| c.name.starts_with("NameChanged"))
            .collect();
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|c| c.allow_null));
        assert_eq!(created[0].db_type, "INT");
        assert_eq!(created[1].db_type, "DATETIME");
    }

    #[test]
    fn partial_update_rejects_unknown_columns() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");
        let request = PartialUpdateRequest::new("Products", "GhostUpdate", vec!["Ghost".to_string()]);
        assert!(matches!(
            orch.create_partial_update(&request),
            Err(DialogError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn recreate_keeps_partial_column_subset() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");
        let rebuilt = orch.recreate_query("Products", "PriceUpdate").expect("recreate");
        assert_eq!(rebuilt.column_names(), vec!["Id", "Price", "PriceUpdatedBy"]);
        assert_eq!(rebuilt.params.len(), 1);
    }

    #[test]
    fn recreate_unknown_query_fails() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");
        assert!(matches!(
            orch.recreate_query("Products", "Nope"),
            Err(DialogError::QueryNotFound { .. })
        ));
    }

    #[test]
    fn logical_fk_round_trip() {
        let schema = products().with_table(
            "Categories",
            vec![
                Column::new("Id", "int").primary_key().identity(),
                Column::new("Title", "nvarchar"),
            ],
        );
        let mut schema = schema;
        schema
            .add_column("Products", Column::new("CategoryId", "int"))
            .expect("add");
        let mut orch = orchestrator(schema);
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");

        orch.create_logical_fk("LFK_Products_Categories", "Products", "CategoryId", "Categories", "Id")
            .expect("create fk");
        let dialog = orch.dialog("Products").expect("load");
        let column = dialog.column("CategoryId").expect("column");
        assert!(column.fk.as_ref().is_some_and(ForeignKey::is_logical));
        assert_eq!(
            column.ui_props.as_ref().map(|p| p.ui_widget),
            Some(crate::types::UiWidget::Combo)
        );

        orch.remove_logical_fk("Products", "CategoryId").expect("remove fk");
        let dialog = orch.dialog("Products").expect("load");
        assert_eq!(dialog.column("CategoryId").and_then(|c| c.fk.clone()), None);

        assert!(matches!(
            orch.remove_logical_fk("Products", "Ghost"),
            Err(DialogError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn routines_get_single_exec_query() {
        let schema = MemorySchema::new().with_routine(
            "GetTotals",
            ObjectType::Procedure,
            vec![crate::types::Param::new("@From", "date")],
        );
        let mut orch = orchestrator(schema);
        let dialog = orch
            .create_server_objects(&DbObject::new("GetTotals", ObjectType::Procedure))
            .expect("create");
        assert_eq!(dialog.method_names(), vec!["Exec"]);
        assert_eq!(dialog.queries[0].params.len(), 1);
        assert_eq!(dialog.client_uis, None);
    }

    #[test]
    fn views_get_read_list_only() {
        let schema = MemorySchema::new().with_view(
            "ProductSummary",
            vec![Column::new("ProductName", "nvarchar"), Column::new("Total", "int")],
        );
        let mut orch = orchestrator(schema);
        let dialog = orch
            .create_server_objects(&DbObject::new("ProductSummary", ObjectType::View))
            .expect("create");
        assert_eq!(dialog.method_names(), vec!["ReadList"]);
        assert_eq!(dialog.client_uis.map(|u| u.len()), Some(1));
    }

    #[test]
    fn auxiliary_updates_detect_short_pairs() {
        let mut dialog = Dialog::new("Shop", "Tasks", ObjectType::Table);
        dialog.columns.push(Column::new("Id", "int").primary_key());
        dialog.columns.push(Column::new("Status", "int"));
        dialog.columns.push(Column::new("StatusOn", "datetime"));
        let requests = auxiliary_updates(&dialog);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].name, "StatusUpdate");
        assert_eq!(requests[0].by_column, None);
        assert_eq!(requests[0].on_column.as_deref(), Some("StatusOn"));
    }
}
