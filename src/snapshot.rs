//! Canonical view of a graph version.
//!
//! An `IndexSnapshot` lists every live item with its identity and links in
//! ID order. Two versions with equal fingerprints hold byte-for-byte equal
//! items; the version label is not part of the fingerprint.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::error::GraphError;
use crate::index::ItemGraph;
use crate::types::{GraphItem, ItemId, ItemType, Links, Relation};
use crate::GRAPH_KERNEL_SCHEMA_VERSION;

/// One live item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Item ID.
    pub id: ItemId,
    /// Item type.
    pub item_type: ItemType,
    /// Item name.
    pub name: String,
    /// Edges and attributes.
    pub links: Links,
}

/// Every live item of a version, in ID order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Version label.
    pub version: String,
    /// Schema version used for types.
    pub schema_version: String,
    /// Items in ID order.
    pub items: Vec<ItemRecord>,
}

impl IndexSnapshot {
    /// Capture the live items of `graph`.
    pub fn capture<G>(graph: &G) -> Self
    where
        G: ItemGraph + ?Sized,
    {
        let items = graph
            .items()
            .map(|node| ItemRecord {
                id: node.id(),
                item_type: node.item_type(),
                name: node.name().to_string(),
                links: node.links().clone(),
            })
            .collect();
        Self {
            version: graph.version().to_string(),
            schema_version: GRAPH_KERNEL_SCHEMA_VERSION.to_string(),
            items,
        }
    }

    /// Number of captured items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Number of stored edge entries across every relation.
    pub fn edge_count(&self) -> usize {
        self.items
            .iter()
            .map(|record| {
                Relation::ALL
                    .iter()
                    .map(|relation| record.links.ids(*relation).len())
                    .sum::<usize>()
            })
            .sum()
    }

    /// Deterministic hash over the schema version and items.
    pub fn fingerprint(&self) -> Result<String, GraphError> {
        canonical_hash_hex(&(&self.schema_version, &self.items))
    }
}
