//! Graph versions.
//!
//! An index is one version of the graph: a dense array of items addressed
//! by [`ItemId`], plus the name cache and ID generator that go with it.
//! [`ItemIndex`] is an authoritative version; [`DeltaIndex`] overlays an
//! `ItemIndex` and records its changes for a later merge.
//!
//! Both implement [`ItemGraph`], whose provided methods hold every
//! operation that does not depend on how slots are stored: find-or-create,
//! cascade removal, name and signature lookup, bidirectional linking,
//! visiting and walking.

pub mod base;
pub mod delta;
pub mod merge;
pub mod name_index;
mod lookup;
mod relate;
mod removal;

use std::collections::{HashSet, VecDeque};

use crate::config::IndexConfig;
use crate::error::GraphError;
use crate::factory::ItemFactory;
use crate::types::{GraphItem, ItemId, ItemType, Links, Relation};
use crate::visitor::{copy_links, ItemVisitor, VisitMode};

pub use base::{IdRemap, ItemIndex};
pub use delta::{Change, DeltaEntry, DeltaIndex, DeltaItem};
pub use merge::{DeltaChanges, MergeEntry, MergeReport};
pub use name_index::{NameCache, NameIndex};

/// One version of the program-entity graph.
///
/// Implementors provide slot storage; everything else is provided.
pub trait ItemGraph {
    /// Item representation stored in this version.
    type Node: GraphItem;

    /// Version label.
    fn version(&self) -> &str;

    /// Tuning parameters.
    fn config(&self) -> &IndexConfig;

    /// Number of slots, removed ones included.
    fn slot_count(&self) -> usize;

    /// Number of live items.
    fn len(&self) -> usize;

    /// Whether the version holds no live items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a bulk operation (construction, merge) is rewriting this version.
    fn is_in_flux(&self) -> bool;

    /// ID the next created item will receive.
    fn next_id(&self) -> ItemId;

    /// Live item in slot `id`.
    fn get(&self, id: ItemId) -> Option<&Self::Node>;

    /// Mutable edges and attributes of a live item.
    ///
    /// Delta versions record an update for the slot.
    fn links_mut(&mut self, id: ItemId) -> Option<&mut Links>;

    /// Live items in ID order.
    fn items(&self) -> Box<dyn Iterator<Item = &Self::Node> + '_>;

    /// Name-index bucket for `(item_type, name)`; may over-match.
    fn name_candidates(&self, item_type: ItemType, name: &str) -> Vec<ItemId>;

    /// Allocate the next ID and store a new item in that slot.
    ///
    /// Only the new item's own parent field is set; the parent's children
    /// are left alone. Fails if the ID does not equal the slot position.
    fn insert_new(&mut self, parent: Option<ItemId>, name: &str, item_type: ItemType) -> Result<ItemId, GraphError>;

    /// Empty slot `id`, returning the item's links. No relation is touched.
    fn vacate(&mut self, id: ItemId) -> Option<Links>;

    // ── Provided operations ─────────────────────────────────────────────

    /// Whether slot `id` holds a live item.
    fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Create an item under `parent`, or return the existing one when
    /// `check_exists` and an item with the same type, name and ancestor
    /// chain is already present.
    fn create_item(
        &mut self,
        parent: Option<ItemId>,
        name: &str,
        item_type: ItemType,
        check_exists: bool,
    ) -> Result<ItemId, GraphError> {
        if name.is_empty() {
            return Err(GraphError::EmptyName);
        }
        if let Some(parent_id) = parent {
            let parent_type = self
                .get(parent_id)
                .ok_or(GraphError::ItemNotFound(parent_id))?
                .item_type();
            if !parent_type.can_contain(item_type) {
                return Err(GraphError::InvalidParent {
                    parent: parent_id,
                    parent_type,
                    child_type: item_type,
                });
            }
        }
        if check_exists {
            if let Some(existing) = self.find_item(parent, name, item_type) {
                return Ok(existing);
            }
        }

        let id = self.insert_new(parent, name, item_type)?;
        if let Some(parent_id) = parent {
            if let Some(parent_links) = self.links_mut(parent_id) {
                parent_links.insert_id(Relation::Children, id);
            }
        }
        tracing::trace!(
            version = %self.version(),
            id = %id,
            item_type = %item_type,
            name = %name,
            "Created item"
        );
        Ok(id)
    }

    /// Remove an item and unlink it from every relation, both directions.
    ///
    /// Returns the removed item's links.
    fn remove_item(&mut self, id: ItemId) -> Result<Links, GraphError> {
        removal::remove_item(self, id)
    }

    /// Live items with exactly this type and name.
    fn find_all_with_same_name(&self, item_type: ItemType, name: &str) -> Vec<ItemId> {
        lookup::same_name(self, item_type, name)
    }

    /// Find an item by type, name and parent ancestor chain.
    fn find_item(&self, parent: Option<ItemId>, name: &str, item_type: ItemType) -> Option<ItemId> {
        lookup::find_item(self, parent, name, item_type)
    }

    /// Find a class in a package (or a top-level type when `package` is `None`).
    fn find_class(&self, package: Option<ItemId>, name: &str) -> Option<ItemId> {
        self.find_item(package, name, ItemType::Class)
    }

    /// Every package with this name, whatever its project.
    fn find_packages(&self, name: &str) -> Vec<ItemId> {
        self.find_all_with_same_name(ItemType::Package, name)
    }

    /// Find a method by signature; wildcard and array parameter types match
    /// structurally (see [`types_match`](Self::types_match)).
    fn find_method(&self, parent: Option<ItemId>, name: &str, param_types: &[ItemId]) -> Option<ItemId> {
        lookup::find_method(self, parent, name, param_types, lookup::ParamMatch::Structural)
    }

    /// Find a method whose parameter type IDs equal `param_types` exactly.
    fn find_method_exact(&self, parent: Option<ItemId>, name: &str, param_types: &[ItemId]) -> Option<ItemId> {
        lookup::find_method(self, parent, name, param_types, lookup::ParamMatch::Exact)
    }

    /// Whether two types are interchangeable in a signature: equal, either
    /// one the wildcard, or arrays of equal dimension over matching element
    /// types.
    fn types_match(&self, a: ItemId, b: ItemId) -> bool {
        lookup::types_match(self, a, b)
    }

    /// Number of array dimensions of a type; zero for non-arrays.
    fn array_dimensions(&self, id: ItemId) -> usize {
        lookup::array_dimensions(self, id)
    }

    /// Find this version's counterpart of an item in another version, by
    /// type, name, ancestor chain and (for methods) parameter types.
    fn find_equivalent<O>(&self, other: &O, other_id: ItemId) -> Option<ItemId>
    where
        O: ItemGraph + ?Sized,
    {
        lookup::find_equivalent(self, other, other_id)
    }

    /// Add `target` to `source`'s `relation` and the mirror entry on `target`.
    fn link(&mut self, source: ItemId, relation: Relation, target: ItemId) -> Result<(), GraphError> {
        relate::link(self, source, relation, target)
    }

    /// Remove `target` from `source`'s `relation` and the mirror entry,
    /// unless another relation of `source` still needs it. Returns whether
    /// the forward entry existed.
    fn unlink(&mut self, source: ItemId, relation: Relation, target: ItemId) -> Result<bool, GraphError> {
        relate::unlink(self, source, relation, target)
    }

    /// Offer every field of item `id` to `visitor`; returns the IDs the
    /// visitor asked to recurse into.
    fn accept<V>(&self, id: ItemId, visitor: &mut V, mode: VisitMode) -> Result<Vec<ItemId>, GraphError>
    where
        V: ItemVisitor + ?Sized,
    {
        let node = self.get(id).ok_or(GraphError::ItemNotFound(id))?;
        Ok(node.links().accept(id, &mut *visitor, mode))
    }

    /// Breadth-first walk from `start`, following the fields the visitor
    /// asks to recurse into. Returns items in visiting order.
    fn walk<V>(&self, start: ItemId, visitor: &mut V) -> Vec<ItemId>
    where
        V: ItemVisitor + ?Sized,
    {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.get(id) else { continue };
            order.push(id);
            for next in node.links().accept(id, &mut *visitor, VisitMode::Populated) {
                if !visited.contains(&next) {
                    queue.push_back(next);
                }
            }
        }
        order
    }

    /// Create a new item carrying `source`'s name, type and raw links.
    ///
    /// The copied IDs still refer to the source's version; remap them with
    /// [`remap_links`](Self::remap_links). Other items are not touched.
    fn copy_item_from<S>(&mut self, source: &S) -> Result<ItemId, GraphError>
    where
        S: GraphItem + ?Sized,
    {
        let id = self.insert_new(None, source.name(), source.item_type())?;
        let copied = copy_links(source.id(), source.links());
        let links = self.links_mut(id).ok_or(GraphError::ItemNotFound(id))?;
        *links = copied;
        Ok(id)
    }

    /// Rewrite the IDs stored on item `id`.
    fn remap_links<F>(&mut self, id: ItemId, map: F) -> Result<(), GraphError>
    where
        F: FnMut(ItemId) -> Option<ItemId>,
    {
        self.links_mut(id).ok_or(GraphError::ItemNotFound(id))?.remap(map);
        Ok(())
    }

    /// `id` followed by its ancestors, nearest first.
    fn ancestry(&self, id: ItemId) -> Vec<ItemId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(step) = current {
            if chain.len() > self.slot_count() {
                break;
            }
            let Some(node) = self.get(step) else { break };
            chain.push(step);
            current = node.parent();
        }
        chain
    }

    /// Human-readable description of an item with its containment path.
    ///
    /// While the version is in flux the path is omitted.
    fn describe(&self, id: ItemId) -> String {
        let Some(node) = self.get(id) else {
            return format!("<missing {id}>");
        };
        if self.is_in_flux() {
            return format!("{} {} {id}", node.item_type(), node.name());
        }
        let mut path: Vec<&str> = self
            .ancestry(id)
            .into_iter()
            .filter_map(|step| self.get(step).map(|n| n.name()))
            .collect();
        path.reverse();
        format!("{} {} {id}", node.item_type(), path.join(" / "))
    }

    /// Find-or-create front end over this version.
    fn factory(&mut self) -> ItemFactory<'_, Self>
    where
        Self: Sized,
    {
        ItemFactory::new(self)
    }
}
