//! # Synthesis Benchmarks
//!
//! Performance benchmarks for dialog construction and persistence.
//!
//! Run with: `cargo bench -p dbdialog-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dbdialog_core::orchestrator::OrchestratorOptions;
use dbdialog_core::{
    Column, DbObject, Dialog, ForeignKey, MemoryDialogStore, MemorySchema, ObjectType,
    ServerObjectOrchestrator, StubGenerator, classifier, dialog_to_bytes, relations, sync,
    synthesis,
};
use std::hint::black_box;
use std::time::Duration;

/// A table with `width` columns of mixed types, plus `children` tables
/// referencing it.
fn create_schema(width: usize, children: usize) -> MemorySchema {
    let mut columns = vec![Column::new("Id", "int").primary_key().identity()];
    let types = ["nvarchar", "int", "datetime", "bit", "decimal", "varbinary"];
    for i in 0..width {
        let db_type = types[i % types.len()];
        let mut column = Column::new(format!("Field{}", i), db_type);
        if db_type == "nvarchar" {
            column = column.with_size("100");
        }
        columns.push(column);
    }
    columns.push(Column::new("Title", "nvarchar").with_size("200"));
    columns.push(Column::new("UpdatedBy", "int"));
    columns.push(Column::new("UpdatedOn", "datetime"));

    let mut schema = MemorySchema::new().with_table("Items", columns);
    for i in 0..children {
        schema = schema.with_table(
            format!("Child{}", i),
            vec![
                Column::new("Id", "int").primary_key().identity(),
                Column::new("ItemId", "int")
                    .with_fk(ForeignKey::new(format!("FK_Child{}_Items", i), "Items", "Id")),
                Column::new("Label", "nvarchar").with_size("50"),
            ],
        );
    }
    schema
}

fn create_dialog(width: usize) -> Dialog {
    let schema = create_schema(width, 0);
    let mut dialog = Dialog::new("Bench", "Items", ObjectType::Table);
    dialog.columns = dbdialog_core::SchemaFacts::get_columns(&schema, "Items").expect("columns");
    for column in &mut dialog.columns {
        classifier::apply(column);
    }
    dialog
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    for width in [10, 100, 500].iter() {
        let dialog = create_dialog(*width);
        group.bench_with_input(BenchmarkId::from_parameter(width), width, |b, _| {
            b.iter(|| {
                for column in &dialog.columns {
                    black_box(classifier::classify(column));
                }
            });
        });
    }

    group.finish();
}

fn bench_build_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_queries");
    let store = MemoryDialogStore::new("Bench");

    for width in [10, 100, 500].iter() {
        let dialog = create_dialog(*width);
        group.bench_with_input(BenchmarkId::new("read_list", width), width, |b, _| {
            b.iter(|| black_box(synthesis::build_read_list(&dialog, &store)));
        });
        group.bench_with_input(BenchmarkId::new("update_by_key", width), width, |b, _| {
            b.iter(|| {
                black_box(synthesis::build_update_by_key(
                    &dialog,
                    "UpdateByKey",
                    &synthesis::UpdateSpec::Main,
                ))
            });
        });
    }

    group.finish();
}

fn bench_infer_relations(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer_relations");

    for children in [10, 100, 500].iter() {
        let schema = create_schema(10, *children);
        let dialog = Dialog::new("Bench", "Items", ObjectType::Table);
        group.bench_with_input(BenchmarkId::from_parameter(children), children, |b, _| {
            b.iter(|| black_box(relations::infer(&dialog, &schema)));
        });
    }

    group.finish();
}

fn bench_create_server_objects(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_server_objects");

    for width in [10, 100].iter() {
        let schema = create_schema(*width, 10);
        group.bench_with_input(BenchmarkId::from_parameter(width), width, |b, _| {
            b.iter(|| {
                let mut orchestrator = ServerObjectOrchestrator::new(
                    schema.clone(),
                    StubGenerator::new("Bench"),
                    MemoryDialogStore::new("Bench"),
                    OrchestratorOptions::new("Bench").with_settle_delay(Duration::ZERO),
                );
                black_box(orchestrator.create_server_objects(&DbObject::table("Items")))
            });
        });
    }

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    for width in [10, 100, 500].iter() {
        let dialog = create_dialog(*width);
        let live = dialog.columns.clone();
        group.bench_with_input(BenchmarkId::from_parameter(width), width, |b, _| {
            b.iter(|| {
                let mut working = dialog.clone();
                black_box(sync::reconcile(&mut working, &live))
            });
        });
    }

    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("dialog_to_bytes");

    for width in [10, 100, 500].iter() {
        let dialog = create_dialog(*width);
        group.bench_with_input(BenchmarkId::from_parameter(width), width, |b, _| {
            b.iter(|| black_box(dialog_to_bytes(&dialog)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_classify,
    bench_build_queries,
    bench_infer_relations,
    bench_create_server_objects,
    bench_reconcile,
    bench_serialize,
);
criterion_main!(benches);
