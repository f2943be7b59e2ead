//! # Orchestration Scenarios
//!
//! End-to-end behavior of the dialog compiler against an in-memory schema.
//!
//! ## Groups
//! - Server object generation
//! - Query lifecycle (create, duplicate, remove, recreate)
//! - Partial updates and history tables
//! - Relations and reference expansion
//! - Sync and persistence

use dbdialog_core::{
    Column, DbObject, DialogError, DialogStore, FileDialogStore, ForeignKey, MemoryDialogStore,
    MemorySchema, ObjectType, OrchestratorOptions, PartialUpdateRequest, QueryType, RelationType,
    RelationUiWidget, SchemaFacts, ServerObjectOrchestrator, StoreBackend, StubGenerator,
    ValueExpression, dialog_to_bytes,
};
use std::time::Duration;

type Orchestrator = ServerObjectOrchestrator<MemorySchema, StubGenerator, MemoryDialogStore>;

fn orchestrator(schema: MemorySchema) -> Orchestrator {
    ServerObjectOrchestrator::new(
        schema,
        StubGenerator::new("Shop"),
        MemoryDialogStore::new("Shop"),
        OrchestratorOptions::new("Shop").with_settle_delay(Duration::ZERO),
    )
}

fn id() -> Column {
    Column::new("Id", "int").primary_key().identity()
}

fn people() -> MemorySchema {
    MemorySchema::new().with_table(
        "People",
        vec![
            id(),
            Column::new("Name", "nvarchar").with_size("100"),
            Column::new("CreatedBy", "int"),
            Column::new("CreatedOn", "datetime"),
        ],
    )
}

fn products() -> MemorySchema {
    MemorySchema::new().with_table(
        "Products",
        vec![
            id(),
            Column::new("ProductName", "nvarchar").with_size("100").not_null(),
            Column::new("Price", "decimal").with_size("18,2"),
            Column::new("Stock", "int"),
            Column::new("UpdatedBy", "int"),
            Column::new("UpdatedOn", "datetime"),
        ],
    )
}

fn blog() -> MemorySchema {
    MemorySchema::new()
        .with_table(
            "Posts",
            vec![id(), Column::new("Title", "nvarchar").with_size("200")],
        )
        .with_table(
            "Tags",
            vec![id(), Column::new("Title", "nvarchar").with_size("50")],
        )
        .with_table(
            "PostTags",
            vec![
                id(),
                Column::new("PostId", "int").with_fk(ForeignKey::new("FK_PostTags_Posts", "Posts", "Id")),
                Column::new("TagId", "int").with_fk(ForeignKey::new("FK_PostTags_Tags", "Tags", "Id")),
            ],
        )
        .with_table(
            "Comments",
            vec![
                id(),
                Column::new("PostId", "int").with_fk(ForeignKey::new("FK_Comments_Posts", "Posts", "Id")),
                Column::new("AuthorId", "int").with_fk(ForeignKey::new("FK_Comments_Tags", "Tags", "Id")),
                Column::new("Body", "nvarchar").with_size("MAX"),
            ],
        )
}

// =============================================================================
// SERVER OBJECT GENERATION
// =============================================================================

mod generation {
    use super::*;

    #[test]
    fn table_gets_six_crud_queries_with_audit_params() {
        let mut orch = orchestrator(people());
        let dialog = orch
            .create_server_objects(&DbObject::table("People"))
            .expect("create");

        assert_eq!(
            dialog.method_names(),
            vec!["Create", "ReadByKey", "ReadList", "UpdateByKey", "Delete", "DeleteByKey"]
        );

        let create = dialog.query("Create").expect("create query");
        let created_by = create
            .params
            .iter()
            .find(|p| p.name == "CreatedBy")
            .expect("CreatedBy param");
        assert!(matches!(
            created_by.value_expression,
            Some(ValueExpression::Context { .. })
        ));
        let created_on = create
            .params
            .iter()
            .find(|p| p.name == "CreatedOn")
            .expect("CreatedOn param");
        assert_eq!(created_on.value_expression, Some(ValueExpression::Now));
        assert!(!create.has_column("Id"));
    }

    #[test]
    fn generated_dialog_satisfies_invariants() {
        let mut orch = orchestrator(products());
        let dialog = orch
            .create_server_objects(&DbObject::table("Products"))
            .expect("create");
        dialog.validate().expect("valid dialog");
        assert!(orch.store().exists("Products").expect("exists"));
        assert!(orch
            .store()
            .load_artifact("Products")
            .expect("artifact")
            .is_some_and(|source| source.contains("pub struct Products;")));
    }

    #[test]
    fn list_queries_are_paginated_and_counted() {
        let mut orch = orchestrator(products());
        let dialog = orch
            .create_server_objects(&DbObject::table("Products"))
            .expect("create");
        let list = dialog.query("ReadList").expect("read list");
        assert_eq!(list.pagination_max_size, Some(100));
        assert_eq!(list.aggregations.as_ref().map(Vec::len), Some(1));
        assert!(list.where_clause.is_none());
    }

    #[test]
    fn unknown_object_surfaces_schema_failure() {
        let mut orch = orchestrator(products());
        assert!(orch
            .create_server_objects(&DbObject::table("Ghosts"))
            .is_err());
        assert!(!orch.store().exists("Ghosts").expect("exists"));
    }

    #[test]
    fn table_functions_get_select() {
        let schema = MemorySchema::new().with_routine(
            "TopProducts",
            ObjectType::TableFunction,
            vec![dbdialog_core::Param::new("@Count", "int")],
        );
        let mut orch = orchestrator(schema);
        let dialog = orch
            .create_server_objects(&DbObject::new("TopProducts", ObjectType::TableFunction))
            .expect("create");
        assert_eq!(dialog.method_names(), vec!["Select"]);
        assert_eq!(dialog.queries[0].query_type, QueryType::TableFunction);
    }
}

// =============================================================================
// QUERY LIFECYCLE
// =============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn duplicate_copies_everything_but_the_name() {
        let mut orch = orchestrator(blog());
        orch.create_server_objects(&DbObject::table("Posts"))
            .expect("create");

        let copy = orch
            .duplicate_query("Posts", "ReadByKey", "ReadByKeyV2")
            .expect("duplicate");
        let dialog = orch.dialog("Posts").expect("load");
        let original = dialog.query("ReadByKey").expect("original");

        assert_eq!(copy.name, "ReadByKeyV2");
        assert_eq!(copy.columns, original.columns);
        assert_eq!(copy.where_clause, original.where_clause);
        assert_eq!(copy.relations, original.relations);
        assert_eq!(original.name, "ReadByKey");
        assert_eq!(dialog.query("ReadByKeyV2"), Some(&copy));
    }

    #[test]
    fn duplicate_rejects_missing_source_and_taken_name() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");
        assert!(matches!(
            orch.duplicate_query("Products", "Nope", "Copy"),
            Err(DialogError::QueryNotFound { .. })
        ));
        assert!(matches!(
            orch.duplicate_query("Products", "ReadList", "Create"),
            Err(DialogError::DuplicateQuery { .. })
        ));
    }

    #[test]
    fn remove_query_drops_ui_and_method() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");
        orch.create_query("Products", "ReadList", "Catalog")
            .expect("create query");
        assert_eq!(orch.generator().methods("Shop.Products"), vec!["Catalog".to_string()]);

        orch.remove_query("Products", "Catalog").expect("remove");
        let dialog = orch.dialog("Products").expect("load");
        assert!(dialog.query("Catalog").is_none());
        assert!(!dialog
            .client_uis
            .iter()
            .flatten()
            .any(|ui| ui.file_name == "Shop_Products_Catalog"));
        assert!(orch.generator().methods("Shop.Products").is_empty());
        assert!(!orch
            .store()
            .load_artifact("Products")
            .expect("artifact")
            .is_some_and(|source| source.contains("fn catalog(")));
    }

    #[test]
    fn remove_unknown_query_fails_without_saving() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");
        let before = orch.store().document_bytes("Products").map(<[u8]>::to_vec);
        assert!(matches!(
            orch.remove_query("Products", "Nope"),
            Err(DialogError::QueryNotFound { .. })
        ));
        assert_eq!(orch.store().document_bytes("Products").map(<[u8]>::to_vec), before);
    }

    #[test]
    fn recreate_preserves_other_queries() {
        let mut orch = orchestrator(products());
        let before = orch
            .create_server_objects(&DbObject::table("Products"))
            .expect("create");
        let rebuilt = orch.recreate_query("Products", "ReadList").expect("recreate");
        let after = orch.dialog("Products").expect("load");

        assert_eq!(Some(&rebuilt), before.query("ReadList"));
        assert_eq!(before, after);
    }

    #[test]
    fn case_variant_names_do_not_share_a_binding() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");
        orch.create_query("Products", "ReadList", "Stats")
            .expect("create query");

        assert!(matches!(
            orch.create_query("Products", "ReadList", "stats"),
            Err(DialogError::DuplicateQuery { .. })
        ));
        assert!(matches!(
            orch.duplicate_query("Products", "ReadList", "STATS"),
            Err(DialogError::DuplicateQuery { .. })
        ));
        assert!(matches!(
            orch.remove_query("Products", "stats"),
            Err(DialogError::QueryNotFound { .. })
        ));

        let dialog = orch.dialog("Products").expect("load");
        assert!(dialog.query("Stats").is_some());
        assert!(dialog
            .client_uis
            .iter()
            .flatten()
            .any(|ui| ui.file_name == "Shop_Products_Stats"));
        dialog.validate().expect("valid dialog");
    }

    #[test]
    fn operations_on_missing_dialog_are_not_found() {
        let mut orch = orchestrator(products());
        assert!(matches!(
            orch.create_query("Products", "ReadList", "Catalog"),
            Err(DialogError::DialogNotFound { .. })
        ));
        assert!(matches!(
            orch.remove_query("Products", "ReadList"),
            Err(DialogError::DialogNotFound { .. })
        ));
    }
}

// =============================================================================
// PARTIAL UPDATES & HISTORY TABLES
// =============================================================================

mod partial_updates {
    use super::*;

    #[test]
    fn partial_update_takes_columns_from_main_update() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");

        let request = PartialUpdateRequest::new(
            "Products",
            "BulkUpdate",
            vec!["ProductName".to_string(), "Price".to_string()],
        );
        orch.create_partial_update(&request).expect("partial");

        let dialog = orch.dialog("Products").expect("load");
        let main = dialog.query("UpdateByKey").expect("main");
        assert!(!main.has_column("ProductName"));
        assert!(!main.has_column("Price"));
        assert!(main.has_column("Stock"));
        for name in ["ProductName", "Price"] {
            assert_eq!(
                dialog.column(name).and_then(|c| c.update_group.as_deref()),
                Some("BulkUpdate")
            );
        }
        let bulk = dialog.query("BulkUpdate").expect("bulk");
        assert_eq!(bulk.column_names(), vec!["Id", "ProductName", "Price"]);
        dialog.validate().expect("valid dialog");
    }

    #[test]
    fn empty_column_list_fails_without_persisting() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");
        let before = orch.store().document_bytes("Products").map(<[u8]>::to_vec);

        let request = PartialUpdateRequest::new("Products", "NothingUpdate", Vec::new());
        let err = orch.create_partial_update(&request).expect_err("empty");
        assert_eq!(
            err,
            DialogError::EmptyUpdateColumns {
                object: "Products".to_string()
            }
        );
        assert!(err.to_string().contains("Products"));
        assert_eq!(orch.store().document_bytes("Products").map(<[u8]>::to_vec), before);
    }

    #[test]
    fn recreating_main_update_reclaims_released_columns() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");
        let request = PartialUpdateRequest::new("Products", "StockUpdate", vec!["Stock".to_string()]);
        orch.create_partial_update(&request).expect("partial");
        orch.remove_query("Products", "StockUpdate").expect("remove");

        let main = orch.recreate_query("Products", "UpdateByKey").expect("recreate");
        assert!(main.has_column("Stock"));
        let dialog = orch.dialog("Products").expect("load");
        assert_eq!(
            dialog.column("Stock").and_then(|c| c.update_group.as_deref()),
            Some("UpdateByKey")
        );
    }

    #[test]
    fn shrinking_partial_update_releases_dropped_columns() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");

        let wide = PartialUpdateRequest::new(
            "Products",
            "Inventory",
            vec!["Price".to_string(), "Stock".to_string()],
        );
        orch.create_partial_update(&wide).expect("wide");
        let narrow = PartialUpdateRequest::new("Products", "Inventory", vec!["Price".to_string()]);
        let query = orch.create_partial_update(&narrow).expect("narrow");
        assert_eq!(query.column_names(), vec!["Id", "Price"]);

        let dialog = orch.dialog("Products").expect("load");
        assert_eq!(dialog.column("Stock").and_then(|c| c.update_group.clone()), None);
        assert_eq!(
            dialog.column("Price").and_then(|c| c.update_group.as_deref()),
            Some("Inventory")
        );

        let main = orch.recreate_query("Products", "UpdateByKey").expect("recreate");
        assert!(main.has_column("Stock"));
        assert!(!main.has_column("Price"));
        let dialog = orch.dialog("Products").expect("load");
        assert_eq!(
            dialog.column("Stock").and_then(|c| c.update_group.as_deref()),
            Some("UpdateByKey")
        );
        dialog.validate().expect("valid dialog");
    }

    fn with_history(orch: &mut Orchestrator) {
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");
        let request = PartialUpdateRequest::new("Products", "PriceUpdate", vec!["Price".to_string()])
            .with_by("PriceChangedBy")
            .with_on("PriceChangedOn")
            .with_history("ProductsPriceLog");
        orch.create_partial_update(&request).expect("partial");
    }

    #[test]
    fn history_table_is_created_with_its_own_dialog() {
        let mut orch = orchestrator(products());
        with_history(&mut orch);

        let log_columns = orch.schema().get_columns("ProductsPriceLog").expect("log table");
        let names: Vec<&str> = log_columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Id",
                "MasterId",
                "Price",
                "PriceChangedBy",
                "PriceChangedOn",
                "CreatedBy",
                "CreatedOn"
            ]
        );

        let log = orch.dialog("ProductsPriceLog").expect("log dialog");
        assert_eq!(log.queries.len(), 6);
        let query = orch.dialog("Products").expect("load");
        assert_eq!(
            query.query("PriceUpdate").and_then(|q| q.log_table.as_deref()),
            Some("ProductsPriceLog")
        );
    }

    #[test]
    fn ensure_log_table_is_idempotent() {
        let mut orch = orchestrator(products());
        with_history(&mut orch);
        let before = orch.schema().clone();
        orch.ensure_log_table("Products", "PriceUpdate", "ProductsPriceLog")
            .expect("ensure");
        assert_eq!(orch.schema(), &before);
        orch.ensure_log_table("Products", "NoSuchUpdate", "OtherLog")
            .expect("no-op");
        assert!(!orch.schema().contains("OtherLog"));
    }

    #[test]
    fn removing_a_copy_keeps_the_shared_log_table() {
        let mut orch = orchestrator(products());
        with_history(&mut orch);
        orch.duplicate_query("Products", "PriceUpdate", "PriceUpdateV2")
            .expect("duplicate");

        orch.remove_query("Products", "PriceUpdateV2").expect("remove copy");
        assert!(orch.schema().contains("ProductsPriceLog"));
        assert!(orch.store().exists("ProductsPriceLog").expect("exists"));
        let dialog = orch.dialog("Products").expect("load");
        assert_eq!(
            dialog.query("PriceUpdate").and_then(|q| q.log_table.as_deref()),
            Some("ProductsPriceLog")
        );

        orch.remove_query("Products", "PriceUpdate").expect("remove original");
        assert!(!orch.schema().contains("ProductsPriceLog"));
        assert!(!orch.store().exists("ProductsPriceLog").expect("exists"));
    }

    #[test]
    fn removing_history_update_tears_down_log_table() {
        let mut orch = orchestrator(products());
        with_history(&mut orch);

        orch.remove_query("Products", "PriceUpdate").expect("remove");
        assert!(!orch.schema().contains("ProductsPriceLog"));
        assert!(!orch.store().exists("ProductsPriceLog").expect("exists"));

        let dialog = orch.dialog("Products").expect("load");
        assert!(dialog.query("PriceUpdate").is_none());
        assert!(dialog
            .columns
            .iter()
            .all(|c| c.update_group.as_deref() != Some("PriceUpdate")));
    }
}

// =============================================================================
// RELATIONS & REFERENCE EXPANSION
// =============================================================================

mod relations {
    use super::*;

    #[test]
    fn three_column_linking_table_is_many_to_many() {
        let mut orch = orchestrator(blog());
        let posts = orch
            .create_server_objects(&DbObject::table("Posts"))
            .expect("create");
        let link = posts.relation("PostTags_PostId").expect("link relation");

        assert_eq!(link.relation_type, RelationType::ManyToMany);
        assert_eq!(link.linking_target_table.as_deref(), Some("Tags"));
        assert_eq!(link.linking_column.as_deref(), Some("TagId"));
        assert_eq!(link.relation_ui_widget, RelationUiWidget::AddableList);
    }

    #[test]
    fn four_column_child_table_is_one_to_many() {
        let mut orch = orchestrator(blog());
        let posts = orch
            .create_server_objects(&DbObject::table("Posts"))
            .expect("create");
        let comments = posts.relation("Comments_PostId").expect("comments");
        assert_eq!(comments.relation_type, RelationType::OneToMany);
        assert_eq!(comments.relation_ui_widget, RelationUiWidget::Grid);

        let list = posts.query("ReadList").expect("read list");
        assert_eq!(list.relations, Some(vec!["PostTags_PostId".to_string()]));
        let by_key = posts.query("ReadByKey").expect("read by key");
        assert_eq!(by_key.relations.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn dropped_relations_leave_no_references() {
        let mut orch = orchestrator(blog());
        orch.create_server_objects(&DbObject::table("Posts"))
            .expect("create");

        orch.schema_mut().drop_table("PostTags").expect("drop");
        let refreshed = orch.refresh_relations("Posts").expect("refresh");

        assert!(refreshed.relation("PostTags_PostId").is_none());
        assert!(refreshed
            .queries
            .iter()
            .filter_map(|q| q.relations.as_ref())
            .flatten()
            .all(|name| name != "PostTags_PostId"));
        assert_eq!(orch.prune_relations("Posts").expect("prune"), 0);
        assert_eq!(orch.prune_relations("Nothing").expect("prune"), 0);
    }

    #[test]
    fn foreign_keys_expand_to_target_title() {
        let mut orch = orchestrator(blog());
        orch.create_server_objects(&DbObject::table("Tags"))
            .expect("tags");
        orch.create_server_objects(&DbObject::table("PostTags"))
            .expect("post tags");
        orch.create_query("PostTags", "AggregatedReadList", "Stats")
            .expect("aggregated");

        let dialog = orch.dialog("PostTags").expect("load");
        for name in ["ReadList", "ReadByKey", "Stats"] {
            let query = dialog.query(name).expect("query");
            let tag = query
                .columns
                .iter()
                .find(|c| c.name == "TagId")
                .and_then(|c| c.ref_to.as_ref())
                .expect("expanded TagId");
            assert_eq!(tag.target_table, "Tags");
            assert!(tag
                .columns
                .iter()
                .any(|c| c.alias.as_deref() == Some("TagId_Title")));

            let post = query.columns.iter().find(|c| c.name == "PostId").expect("PostId");
            assert!(post.ref_to.is_none(), "Posts has no dialog yet");
        }
    }

    #[test]
    fn logical_fk_enables_expansion_on_recreate() {
        let schema = blog().with_table(
            "Ratings",
            vec![id(), Column::new("TagRef", "int"), Column::new("Score", "int")],
        );
        let mut orch = orchestrator(schema);
        orch.create_server_objects(&DbObject::table("Tags"))
            .expect("tags");
        orch.create_server_objects(&DbObject::table("Ratings"))
            .expect("ratings");

        orch.create_logical_fk("LFK_Ratings_Tags", "Ratings", "TagRef", "Tags", "Id")
            .expect("logical fk");
        let list = orch.recreate_query("Ratings", "ReadList").expect("recreate");
        let tag = list
            .columns
            .iter()
            .find(|c| c.name == "TagRef")
            .and_then(|c| c.ref_to.as_ref())
            .expect("expanded");
        assert_eq!(tag.columns[0].alias.as_deref(), Some("TagRef_Title"));
    }
}

// =============================================================================
// SYNC & PERSISTENCE
// =============================================================================

mod sync {
    use super::*;

    #[test]
    fn sync_twice_is_byte_identical() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");
        orch.schema_mut()
            .add_column("Products", Column::new("Barcode", "varchar").with_size("32"))
            .expect("add");

        let first = orch.sync("Products").expect("sync").expect("report");
        assert_eq!(first.added, vec!["Barcode".to_string()]);
        let after_first = orch.store().document_bytes("Products").map(<[u8]>::to_vec);

        let second = orch.sync("Products").expect("sync").expect("report");
        assert!(second.is_unchanged());
        let after_second = orch.store().document_bytes("Products").map(<[u8]>::to_vec);
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn sync_purges_dropped_columns_from_queries() {
        let mut orch = orchestrator(products());
        orch.create_server_objects(&DbObject::table("Products"))
            .expect("create");
        orch.schema_mut().drop_column("Products", "Stock").expect("drop");

        let report = orch.sync("Products").expect("sync").expect("report");
        assert_eq!(report.removed, vec!["Stock".to_string()]);
        let dialog = orch.dialog("Products").expect("load");
        assert!(dialog.queries.iter().all(|q| !q.has_column("Stock")));
        dialog.validate().expect("valid dialog");
    }

    #[test]
    fn sync_of_missing_dialog_is_a_no_op() {
        let mut orch = orchestrator(products());
        assert_eq!(orch.sync("Products").expect("sync"), None);
        assert!(!orch.store().exists("Products").expect("exists"));
    }

    #[test]
    fn file_store_round_trips_generated_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StoreBackend::File(FileDialogStore::new(dir.path(), "Shop"));
        let mut orch = ServerObjectOrchestrator::new(
            blog(),
            StubGenerator::new("Shop"),
            store,
            OrchestratorOptions::new("Shop").with_settle_delay(Duration::ZERO),
        );
        let created = orch
            .create_server_objects(&DbObject::table("Posts"))
            .expect("create");

        let on_disk = std::fs::read(dir.path().join("Shop.Posts.dialog.json")).expect("read");
        assert_eq!(on_disk, dialog_to_bytes(&created).expect("encode"));
        assert!(dir.path().join("Shop.Posts.rs").exists());

        orch.remove_server_objects("Posts").expect("remove");
        assert!(!dir.path().join("Shop.Posts.dialog.json").exists());
        assert!(!dir.path().join("Shop.Posts.rs").exists());
        orch.remove_server_objects("Posts").expect("idempotent remove");
    }
}
