//! # program-graph-kernel
//!
//! Versioned, bidirectionally-linked program-entity graph.
//!
//! The kernel stores projects, packages, classes, methods and fields as
//! items addressed by dense integer IDs, connected by containment,
//! dependency and a fixed vocabulary of type-level relations (superclass,
//! parameter types, array element type, ...). Every relation is kept
//! bidirectional, including under cascade removal.
//!
//! ## Core Contract
//!
//! 1. Populate a version through the find-or-create [`ItemFactory`]
//! 2. Derive a [`DeltaIndex`] from an [`ItemIndex`] without copying items
//! 3. Mutate the delta independently, then merge its change log back
//!
//! ## Architecture
//!
//! ```text
//! ItemFactory → ItemGraph (ItemIndex | DeltaIndex) → Item / DeltaItem → Links
//!                    ↓                                      ↓
//!               NameCache (prefix buckets)          Relation / Field visitors
//! ```
//!
//! ## Integrity Guarantees
//!
//! - `b ∈ a.dependencies ⇔ a ∈ b.incoming`, and likewise for every paired
//!   relation, after any sequence of `link`/`unlink`/`remove_item`
//! - A removed ID never remains in any surviving item's links
//! - A delta never mutates its base; the borrow checker enforces it

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod visitor;
pub mod index;
pub mod factory;
pub mod integrity;
pub mod snapshot;
pub mod canonical;
pub mod config;
pub mod error;

// Re-exports
pub use types::{
    AttributeKey, AttributeValue, Cardinality, Flag, GraphItem, IdGenerator, Item, ItemId,
    ItemType, Links, Relation, ValueKind, WILDCARD_TYPE_NAME,
};
pub use visitor::{
    copy_links, overwrite_links, CopyVisitor, Field, ItemVisitor, OverwriteVisitor, VisitMode,
};
pub use index::{
    Change, DeltaChanges, DeltaEntry, DeltaIndex, DeltaItem, IdRemap, ItemGraph, ItemIndex,
    MergeEntry, MergeReport, NameCache, NameIndex,
};
pub use factory::{ItemFactory, PRIMITIVE_TYPES};
pub use integrity::{check_integrity, IntegrityViolation, ViolationKind};
pub use snapshot::{IndexSnapshot, ItemRecord};
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};
pub use config::IndexConfig;
pub use error::GraphError;

/// Schema version for all graph kernel types.
/// Increment on breaking changes to any schema type.
pub const GRAPH_KERNEL_SCHEMA_VERSION: &str = "1.0.0";
