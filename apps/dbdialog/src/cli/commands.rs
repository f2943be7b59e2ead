//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config::{AppConfig, Backend};
use dbdialog_core::{
    DbObject, DialogError, DialogStore, FileDialogStore, MemorySchema, ObjectType,
    OrchestratorOptions, PartialUpdateRequest, QueryType, RedbDialogStore, SchemaFacts,
    ServerObjectOrchestrator, StoreBackend, StubGenerator, document_fingerprint, history,
};
use std::path::Path;

type Orchestrator = ServerObjectOrchestrator<MemorySchema, StubGenerator, StoreBackend>;

/// Maximum schema snapshot size (64 MB).
const MAX_SCHEMA_FILE_SIZE: u64 = 64 * 1024 * 1024;

// =============================================================================
// SESSION HELPERS
// =============================================================================

fn load_schema(path: &Path) -> Result<MemorySchema, DialogError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        DialogError::Io(format!("Cannot read schema snapshot '{}': {}", path.display(), e))
    })?;
    if metadata.len() > MAX_SCHEMA_FILE_SIZE {
        return Err(DialogError::Deserialization(format!(
            "Schema snapshot size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_SCHEMA_FILE_SIZE
        )));
    }
    let bytes = std::fs::read(path)
        .map_err(|e| DialogError::Io(format!("Read {}: {}", path.display(), e)))?;
    MemorySchema::from_json(&bytes)
}

fn open_store(config: &AppConfig) -> Result<StoreBackend, DialogError> {
    match config.backend()? {
        Backend::File => Ok(StoreBackend::File(FileDialogStore::new(
            &config.server_objects_path,
            &config.data_source,
        ))),
        Backend::Redb => {
            std::fs::create_dir_all(&config.server_objects_path).map_err(|e| {
                DialogError::Io(format!(
                    "Create {}: {}",
                    config.server_objects_path.display(),
                    e
                ))
            })?;
            let path = config.redb_path();
            tracing::debug!("Opening redb store at {:?}", path);
            Ok(StoreBackend::Redb(RedbDialogStore::open(
                path,
                &config.data_source,
            )?))
        }
    }
}

fn open(config: &AppConfig) -> Result<Orchestrator, DialogError> {
    let schema = load_schema(&config.schema_snapshot)?;
    let store = open_store(config)?;
    Ok(ServerObjectOrchestrator::new(
        schema,
        StubGenerator::new(&config.data_source),
        store,
        OrchestratorOptions::new(&config.data_source).with_settle_delay(config.settle_delay()),
    ))
}

/// Run `f` against a fresh orchestrator, writing the schema snapshot back
/// when the operation changed it.
fn with_orchestrator<T>(
    config: &AppConfig,
    f: impl FnOnce(&mut Orchestrator) -> Result<T, DialogError>,
) -> Result<T, DialogError> {
    let mut orch = open(config)?;
    let before = orch.schema().clone();
    let value = f(&mut orch)?;

    if orch.schema() != &before {
        let bytes = orch.schema().to_json()?;
        std::fs::write(&config.schema_snapshot, bytes).map_err(|e| {
            DialogError::Io(format!(
                "Write {}: {}",
                config.schema_snapshot.display(),
                e
            ))
        })?;
        tracing::info!("Updated schema snapshot {:?}", config.schema_snapshot);
    }
    Ok(value)
}

fn print_json(output: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(output).unwrap_or_default()
    );
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Write the effective configuration to `path`.
pub fn cmd_init(path: &Path, config: &AppConfig, force: bool) -> Result<(), DialogError> {
    if path.exists() && !force {
        return Err(DialogError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let text = config.to_toml()?;
    std::fs::write(path, text)
        .map_err(|e| DialogError::Io(format!("Write {}: {}", path.display(), e)))?;
    std::fs::create_dir_all(&config.server_objects_path).map_err(|e| {
        DialogError::Io(format!(
            "Create {}: {}",
            config.server_objects_path.display(),
            e
        ))
    })?;

    println!("Wrote {}", path.display());
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show schema objects and whether they have a dialog.
pub fn cmd_status(config: &AppConfig, json_mode: bool) -> Result<(), DialogError> {
    let orch = open(config)?;

    let mut rows = Vec::new();
    for object in orch.schema().objects() {
        let queries = orch
            .store()
            .try_load(&object.name)?
            .map(|dialog| dialog.queries.len());
        rows.push((object, queries));
    }

    if json_mode {
        let objects: Vec<_> = rows
            .iter()
            .map(|(object, queries)| {
                serde_json::json!({
                    "name": object.name,
                    "type": object.object_type.as_str(),
                    "dialog": queries.is_some(),
                    "queries": queries.unwrap_or(0)
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "data_source": config.data_source,
            "backend": config.backend,
            "server_objects": config.server_objects_path.to_string_lossy(),
            "objects": objects
        }));
        return Ok(());
    }

    println!("dbdialog Status");
    println!("===============");
    println!("Data source:    {}", config.data_source);
    println!("Backend:        {}", config.backend);
    println!("Server objects: {:?}", config.server_objects_path);
    println!();
    for (object, queries) in &rows {
        match queries {
            Some(n) => println!(
                "  {:<32} {:<15} {} queries",
                object.name,
                object.object_type.as_str(),
                n
            ),
            None => println!("  {:<32} {:<15} -", object.name, object.object_type.as_str()),
        }
    }

    Ok(())
}

// =============================================================================
// SERVER OBJECT COMMANDS
// =============================================================================

/// Generate every server object of a schema object.
pub fn cmd_create(
    config: &AppConfig,
    json_mode: bool,
    object: &str,
    object_type: Option<&str>,
) -> Result<(), DialogError> {
    let dialog = with_orchestrator(config, |orch| {
        let target = match object_type {
            Some(name) => DbObject::new(object, ObjectType::parse(name)?),
            None => orch
                .schema()
                .get_object(object)?
                .ok_or_else(|| DialogError::ObjectNotFound(object.to_string()))?,
        };
        orch.create_server_objects(&target)
    })?;

    if json_mode {
        print_json(&serde_json::json!({
            "object": dialog.object_name,
            "type": dialog.object_type.as_str(),
            "columns": dialog.columns.len(),
            "queries": dialog.method_names(),
            "relations": dialog.relations.as_ref().map_or(0, Vec::len)
        }));
        return Ok(());
    }

    println!(
        "Created {} {} with {} queries:",
        dialog.object_type,
        dialog.object_name,
        dialog.queries.len()
    );
    for query in &dialog.queries {
        println!("  {:<24} {}", query.name, query.query_type);
    }
    Ok(())
}

/// Delete the dialog and artifact of an object.
pub fn cmd_remove(config: &AppConfig, object: &str) -> Result<(), DialogError> {
    with_orchestrator(config, |orch| orch.remove_server_objects(object))?;
    println!("Removed server objects of {}", object);
    Ok(())
}

/// Reconcile one dialog, or every dialog of a table or view.
pub fn cmd_sync(
    config: &AppConfig,
    json_mode: bool,
    object: Option<&str>,
) -> Result<(), DialogError> {
    let reports = with_orchestrator(config, |orch| {
        let targets: Vec<String> = match object {
            Some(name) => vec![name.to_string()],
            None => orch
                .schema()
                .objects()
                .into_iter()
                .filter(|o| o.object_type.has_columns())
                .map(|o| o.name)
                .collect(),
        };

        let mut reports = Vec::new();
        for name in targets {
            if let Some(report) = orch.sync(&name)? {
                reports.push((name, report));
            }
        }
        Ok(reports)
    })?;

    if json_mode {
        let output: Vec<_> = reports
            .iter()
            .map(|(name, report)| {
                serde_json::json!({
                    "object": name,
                    "added": report.added,
                    "removed": report.removed
                })
            })
            .collect();
        print_json(&serde_json::Value::Array(output));
        return Ok(());
    }

    if reports.is_empty() {
        println!("Nothing to sync");
    }
    for (name, report) in &reports {
        if report.is_unchanged() {
            println!("{}: up to date", name);
        } else {
            println!(
                "{}: added {:?}, removed {:?}",
                name, report.added, report.removed
            );
        }
    }
    Ok(())
}

/// Print a dialog document, or one of its queries.
pub fn cmd_show(config: &AppConfig, object: &str, query: Option<&str>) -> Result<(), DialogError> {
    let orch = open(config)?;
    let dialog = orch.dialog(object)?;

    let text = match query {
        Some(name) => {
            let query = dialog.query(name).ok_or_else(|| DialogError::QueryNotFound {
                object: object.to_string(),
                query: name.to_string(),
            })?;
            serde_json::to_string_pretty(query)
        }
        None => serde_json::to_string_pretty(&dialog),
    }
    .map_err(|e| DialogError::Serialization(e.to_string()))?;

    println!("{}", text);
    Ok(())
}

/// Validate a dialog's structural invariants.
pub fn cmd_check(config: &AppConfig, json_mode: bool, object: &str) -> Result<(), DialogError> {
    let orch = open(config)?;
    let dialog = orch.dialog(object)?;
    let result = dialog.validate();

    if json_mode {
        print_json(&serde_json::json!({
            "object": object,
            "valid": result.is_ok(),
            "error": result.as_ref().err().map(ToString::to_string)
        }));
    } else if result.is_ok() {
        println!("{}: OK", object);
    }
    result
}

/// Compute the BLAKE3 fingerprint of a dialog document.
pub fn cmd_hash(config: &AppConfig, json_mode: bool, object: &str) -> Result<(), DialogError> {
    let orch = open(config)?;
    let dialog = orch.dialog(object)?;
    let hash = document_fingerprint(&dialog)?;

    if json_mode {
        print_json(&serde_json::json!({
            "object": object,
            "algorithm": "blake3",
            "hash": hash
        }));
        return Ok(());
    }

    println!("BLAKE3: {}", hash);
    Ok(())
}

// =============================================================================
// QUERY COMMANDS
// =============================================================================

/// Add a query; the name defaults to the type's standard name.
pub fn cmd_query_create(
    config: &AppConfig,
    json_mode: bool,
    object: &str,
    query_type: &str,
    name: Option<&str>,
) -> Result<(), DialogError> {
    let name = match name {
        Some(name) => name.to_string(),
        None => QueryType::parse(query_type, "query create")?
            .default_name()
            .to_string(),
    };
    let query = with_orchestrator(config, |orch| {
        orch.create_query(object, query_type, &name)
    })?;

    if json_mode {
        print_json(&serde_json::json!({
            "object": object,
            "query": query.name,
            "type": query.query_type.as_str(),
            "columns": query.column_names()
        }));
        return Ok(());
    }

    println!("Created {} query {}.{}", query.query_type, object, query.name);
    Ok(())
}

pub fn cmd_query_duplicate(
    config: &AppConfig,
    object: &str,
    name: &str,
    copy: &str,
) -> Result<(), DialogError> {
    with_orchestrator(config, |orch| orch.duplicate_query(object, name, copy))?;
    println!("Copied {}.{} to {}", object, name, copy);
    Ok(())
}

pub fn cmd_query_remove(config: &AppConfig, object: &str, name: &str) -> Result<(), DialogError> {
    with_orchestrator(config, |orch| orch.remove_query(object, name))?;
    println!("Removed {}.{}", object, name);
    Ok(())
}

pub fn cmd_query_recreate(
    config: &AppConfig,
    json_mode: bool,
    object: &str,
    name: &str,
) -> Result<(), DialogError> {
    let query = with_orchestrator(config, |orch| orch.recreate_query(object, name))?;

    if json_mode {
        print_json(&serde_json::json!({
            "object": object,
            "query": query.name,
            "columns": query.column_names()
        }));
        return Ok(());
    }

    println!(
        "Recreated {}.{} ({} columns)",
        object,
        query.name,
        query.column_names().len()
    );
    Ok(())
}

// =============================================================================
// PARTIAL UPDATE COMMAND
// =============================================================================

/// Arguments of `dbdialog update`.
#[derive(Debug, Clone)]
pub struct UpdateArgs {
    pub object: String,
    pub name: String,
    pub columns: Vec<String>,
    pub by: Option<String>,
    pub on: Option<String>,
    /// Empty string selects the default log table name.
    pub history: Option<String>,
    pub read_by_key: String,
}

impl UpdateArgs {
    fn to_request(&self) -> PartialUpdateRequest {
        let mut request =
            PartialUpdateRequest::new(&self.object, &self.name, self.columns.clone())
                .with_read_by_key_api(&self.read_by_key);
        if let Some(by) = &self.by {
            request = request.with_by(by);
        }
        if let Some(on) = &self.on {
            request = request.with_on(on);
        }
        match self.history.as_deref() {
            Some("") => {
                request = request.with_history(history::log_table_name(&self.object, &self.name));
            }
            Some(table) => request = request.with_history(table),
            None => {}
        }
        request
    }
}

pub fn cmd_update(config: &AppConfig, json_mode: bool, args: UpdateArgs) -> Result<(), DialogError> {
    let request = args.to_request();
    let query = with_orchestrator(config, |orch| orch.create_partial_update(&request))?;

    if json_mode {
        print_json(&serde_json::json!({
            "object": request.object,
            "query": query.name,
            "columns": query.column_names(),
            "log_table": query.log_table
        }));
        return Ok(());
    }

    println!(
        "Created partial update {}.{} over {:?}",
        request.object,
        query.name,
        query.column_names()
    );
    if let Some(log_table) = &query.log_table {
        println!("Change log: {}", log_table);
    }
    Ok(())
}

// =============================================================================
// FOREIGN KEY & RELATION COMMANDS
// =============================================================================

pub fn cmd_fk_add(
    config: &AppConfig,
    name: &str,
    table: &str,
    column: &str,
    target_table: &str,
    target_column: &str,
) -> Result<(), DialogError> {
    with_orchestrator(config, |orch| {
        orch.create_logical_fk(name, table, column, target_table, target_column)
    })?;
    println!(
        "Created logical FK {} ({}.{} -> {}.{})",
        name, table, column, target_table, target_column
    );
    Ok(())
}

pub fn cmd_fk_remove(config: &AppConfig, table: &str, column: &str) -> Result<(), DialogError> {
    with_orchestrator(config, |orch| orch.remove_logical_fk(table, column))?;
    println!("Removed FK of {}.{}", table, column);
    Ok(())
}

pub fn cmd_relations_refresh(
    config: &AppConfig,
    json_mode: bool,
    object: &str,
) -> Result<(), DialogError> {
    let dialog = with_orchestrator(config, |orch| orch.refresh_relations(object))?;
    let names: Vec<&str> = dialog
        .relations
        .iter()
        .flatten()
        .map(|r| r.relation_name.as_str())
        .collect();

    if json_mode {
        print_json(&serde_json::json!({
            "object": object,
            "relations": names
        }));
        return Ok(());
    }

    println!("{} relations on {}", names.len(), object);
    for name in names {
        println!("  {}", name);
    }
    Ok(())
}

pub fn cmd_relations_prune(
    config: &AppConfig,
    json_mode: bool,
    object: &str,
) -> Result<(), DialogError> {
    let removed = with_orchestrator(config, |orch| orch.prune_relations(object))?;

    if json_mode {
        print_json(&serde_json::json!({
            "object": object,
            "removed": removed
        }));
        return Ok(());
    }

    println!("Pruned {} relation references from {}", removed, object);
    Ok(())
}
