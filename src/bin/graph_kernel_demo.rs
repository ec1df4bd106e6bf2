//! Graph Kernel Demo Binary
//!
//! Builds a small program graph, derives a delta version, edits it and
//! merges it back, logging each step.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `GRAPH_NAME_PREFIX_LEN`: Name-index bucket prefix (default: 18)
//! - `GRAPH_DELTA_BATCH_SIZE`: Items per delta construction batch (default: 1000)
//! - `GRAPH_SLOW_INDEX_BUILD_MS`: Slow name-index build threshold (default: 250)
//! - `DEMO_CLASSES`: Number of generated classes (default: 5000)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! LOG_FORMAT=pretty cargo run --bin graph_kernel_demo
//! ```

use std::process::ExitCode;
use std::time::Instant;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use program_graph_kernel::{
    check_integrity, DeltaIndex, GraphError, IndexConfig, IndexSnapshot, ItemGraph, ItemId,
    ItemIndex, ItemType, Relation,
};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "graph_kernel_demo=info,program_graph_kernel=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).flatten_event(true))
            .init();
    }
}

fn populate(index: &mut ItemIndex, classes: usize) -> Result<(), GraphError> {
    let mut factory = index.factory();
    let project = factory.create_project("demo")?;
    let package = factory.create_package(Some(project), "demo:core")?;
    let int = factory.primitive("int")?;
    let object = factory.create_class(Some(package), "Object")?;

    let mut previous = object;
    for n in 0..classes {
        let class = factory.create_class(Some(package), &format!("Class{n}"))?;
        factory.create_method(class, "run", &[int])?;
        factory.create_field(class, "value")?;
        let graph = factory.graph_mut();
        graph.link(class, Relation::Superclass, object)?;
        graph.link(class, Relation::Dependencies, previous)?;
        previous = class;
    }
    Ok(())
}

/// Apply the demo edits to the `demo:core` package. Returns whether it was
/// found.
fn edit_demo_package(delta: &mut DeltaIndex<'_>) -> Result<bool, GraphError> {
    let Some(package) = delta.find_packages("demo:core").first().copied() else {
        warn!(
            version = %delta.version(),
            package = "demo:core",
            "Demo package missing, skipping delta edits"
        );
        return Ok(false);
    };
    edit_package(delta, package)?;
    Ok(true)
}

fn edit_package(delta: &mut DeltaIndex<'_>, package: ItemId) -> Result<(), GraphError> {
    if let Some(doomed) = delta.find_class(Some(package), "Class0") {
        delta.remove_item(doomed)?;
    }
    let added = delta.create_item(Some(package), "Added", ItemType::Class, true)?;
    if let Some(object) = delta.find_class(Some(package), "Object") {
        delta.link(added, Relation::Superclass, object)?;
    }
    if let Some(touched) = delta.find_class(Some(package), "Class1") {
        delta.link(touched, Relation::Dependencies, added)?;
        delta.revert_item(touched)?;
    }
    Ok(())
}

fn run(classes: usize) -> Result<(), GraphError> {
    let config = IndexConfig::from_env()?;
    let mut base = ItemIndex::with_config("v1", config)?;

    let start = Instant::now();
    populate(&mut base, classes)?;
    info!(
        version = %base.version(),
        items = base.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Populated base version"
    );

    let mut delta = DeltaIndex::new(&base, "v2");
    edit_demo_package(&mut delta)?;
    info!(
        version = %delta.version(),
        changes = delta.changes().len(),
        violations = check_integrity(&delta).len(),
        "Edited delta version"
    );

    let changes = delta.into_changes();
    let report = base.merge(changes)?;
    let snapshot = IndexSnapshot::capture(&base);
    info!(
        report = %report,
        items = snapshot.item_count(),
        edges = snapshot.edge_count(),
        fingerprint = %snapshot.fingerprint()?,
        violations = check_integrity(&base).len(),
        "Merged delta"
    );

    let remap = base.consolidate_ids();
    info!(items = remap.len(), identity = remap.is_identity(), "Consolidated");
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    let classes = std::env::var("DEMO_CLASSES")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(5_000);

    match run(classes) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Demo failed");
            ExitCode::FAILURE
        }
    }
}
