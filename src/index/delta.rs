//! Delta versions layered over a base index.
//!
//! A [`DeltaIndex`] borrows its base immutably and holds one slot per base
//! slot, each an overlay ([`DeltaItem`]) of the base item with its own copy
//! of the item's links. Items created in the delta are owned outright.
//! Every structural change is appended to a change log that
//! [`DeltaIndex::into_changes`] turns into a [`DeltaChanges`] for
//! [`ItemIndex::merge`](super::ItemIndex::merge).

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::{Duration, Instant};

use super::base::ItemIndex;
use super::merge::{DeltaChanges, MergeEntry};
use super::name_index::NameCache;
use super::ItemGraph;
use crate::config::IndexConfig;
use crate::error::GraphError;
use crate::types::{Flag, GraphItem, IdGenerator, Item, ItemId, ItemType, Links, Relation};
use crate::visitor::copy_links;

/// One recorded structural change, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    /// Item created in the delta.
    Added {
        /// ID assigned in the delta.
        id: ItemId,
        /// Parent at creation.
        parent: Option<ItemId>,
        /// Item name.
        name: String,
        /// Item type.
        item_type: ItemType,
    },
    /// Edges or attributes of an item changed.
    Updated {
        /// Changed item.
        id: ItemId,
    },
    /// Item removed from the delta.
    Removed {
        /// Removed item.
        id: ItemId,
    },
}

impl Change {
    /// Item the change applies to.
    pub fn id(&self) -> ItemId {
        match self {
            Self::Added { id, .. } | Self::Updated { id } | Self::Removed { id } => *id,
        }
    }
}

/// Overlay of a base item.
///
/// Identity reads through to the base item; links start as a copy of the
/// base item's links and change independently.
#[derive(Debug, Clone)]
pub struct DeltaItem<'b> {
    base: &'b Item,
    links: Links,
}

impl<'b> DeltaItem<'b> {
    /// Overlay `base`, copying its links.
    pub fn new(base: &'b Item) -> Self {
        Self {
            base,
            links: copy_links(base.id(), base.links()),
        }
    }

    /// The wrapped base item.
    pub fn base(&self) -> &'b Item {
        self.base
    }

    /// Whether the links differ from the base item's.
    pub fn is_modified(&self) -> bool {
        &self.links != self.base.links()
    }
}

impl GraphItem for DeltaItem<'_> {
    fn id(&self) -> ItemId {
        self.base.id()
    }

    fn item_type(&self) -> ItemType {
        self.base.item_type()
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn links(&self) -> &Links {
        &self.links
    }
}

/// Slot content of a delta version.
#[derive(Debug, Clone)]
pub enum DeltaEntry<'b> {
    /// Overlay of a base item.
    Overlay(DeltaItem<'b>),
    /// Item created in the delta.
    Fresh(Item),
}

impl DeltaEntry<'_> {
    /// Whether the item exists in the base version.
    pub fn is_overlay(&self) -> bool {
        matches!(self, Self::Overlay(_))
    }

    fn links_mut(&mut self) -> &mut Links {
        match self {
            Self::Overlay(item) => &mut item.links,
            Self::Fresh(item) => item.links_mut(),
        }
    }
}

impl GraphItem for DeltaEntry<'_> {
    fn id(&self) -> ItemId {
        match self {
            Self::Overlay(item) => item.id(),
            Self::Fresh(item) => item.id(),
        }
    }

    fn item_type(&self) -> ItemType {
        match self {
            Self::Overlay(item) => item.item_type(),
            Self::Fresh(item) => item.item_type(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Overlay(item) => item.name(),
            Self::Fresh(item) => item.name(),
        }
    }

    fn links(&self) -> &Links {
        match self {
            Self::Overlay(item) => item.links(),
            Self::Fresh(item) => item.links(),
        }
    }
}

/// Version derived from an [`ItemIndex`], merged back via [`DeltaChanges`].
#[derive(Debug)]
pub struct DeltaIndex<'b> {
    base: &'b ItemIndex,
    version: String,
    items: Vec<Option<DeltaEntry<'b>>>,
    live: usize,
    ids: IdGenerator,
    names: NameCache,
    changes: Vec<Change>,
    batches: usize,
}

impl<'b> DeltaIndex<'b> {
    /// Build a delta over `base`, one overlay per live base slot.
    ///
    /// Base slots are split into batches of `delta_batch_size` and overlaid
    /// in parallel; the result keeps base order.
    pub fn new(base: &'b ItemIndex, version: impl Into<String>) -> Self {
        let version = version.into();
        let config = base.config();
        let start = Instant::now();

        let batches: Vec<Vec<Option<DeltaEntry<'b>>>> = base
            .slots()
            .par_chunks(config.delta_batch_size.max(1))
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|slot| slot.as_ref().map(|item| DeltaEntry::Overlay(DeltaItem::new(item))))
                    .collect()
            })
            .collect();
        let batch_count = batches.len();
        let items: Vec<Option<DeltaEntry<'b>>> = batches.into_iter().flatten().collect();
        let live = items.iter().flatten().count();

        tracing::info!(
            base = %base.version(),
            version = %version,
            items = live,
            batches = batch_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built delta version"
        );

        Self {
            base,
            version,
            items,
            live,
            ids: IdGenerator::starting_at(base.next_id()),
            names: NameCache::new(
                config.name_prefix_len,
                Duration::from_millis(config.slow_index_build_ms),
            ),
            changes: Vec::new(),
            batches: batch_count,
        }
    }

    /// The base version.
    pub fn base(&self) -> &'b ItemIndex {
        self.base
    }

    /// Number of parallel batches used to build this delta.
    pub fn construction_batches(&self) -> usize {
        self.batches
    }

    /// Recorded changes, oldest first.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Whether anything changed since construction.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Slot entry, including whether it overlays a base item.
    pub fn entry(&self, id: ItemId) -> Option<&DeltaEntry<'b>> {
        self.items.get(id.index()).and_then(Option::as_ref)
    }

    /// Types are read-through to the base item and cannot change here.
    pub fn set_item_type(&mut self, id: ItemId, _item_type: ItemType) -> Result<(), GraphError> {
        if !self.contains(id) {
            return Err(GraphError::ItemNotFound(id));
        }
        Err(GraphError::DeltaImmutable { item: id, field: "type" })
    }

    /// Restore every edge of an overlay item to its base state.
    ///
    /// Edges are removed and re-added through `unlink`/`link`, so
    /// neighbours are updated too and the version stays consistent. Edges
    /// to items removed in this delta are not restored. A neighbour that
    /// must point back at the item again (its parent, say) gives up its
    /// conflicting edge, as `link` does.
    pub fn revert_item(&mut self, id: ItemId) -> Result<(), GraphError> {
        let base_item = match self.entry(id) {
            Some(DeltaEntry::Overlay(item)) => item.base(),
            Some(DeltaEntry::Fresh(_)) => return Err(GraphError::NotAnOverlay(id)),
            None => return Err(GraphError::ItemNotFound(id)),
        };
        let base = self.base;
        let wanted = incident_edges(
            id,
            base_item.links(),
            |n| base.get(n).map(GraphItem::links),
            |n| self.contains(n),
        );
        let current = match self.get(id) {
            Some(node) => incident_edges(id, node.links(), |n| self.get(n).map(GraphItem::links), |_| true),
            None => return Err(GraphError::ItemNotFound(id)),
        };

        let mut removals: Vec<(ItemId, Relation, ItemId)> = Vec::new();
        let mut additions: Vec<(ItemId, Relation, ItemId)> = Vec::new();

        for relation in Relation::FORWARD {
            let now = current.outgoing.get(&relation).map(Vec::as_slice).unwrap_or(&[]);
            let then = wanted.outgoing.get(&relation).map(Vec::as_slice).unwrap_or(&[]);
            if now != then {
                removals.extend(now.iter().map(|target| (id, relation, *target)));
                additions.extend(then.iter().map(|target| (id, relation, *target)));
            }
        }

        let keys: BTreeSet<(ItemId, Relation)> =
            current.incoming.keys().chain(wanted.incoming.keys()).copied().collect();
        for (source, relation) in keys {
            let now = current.incoming.get(&(source, relation)).copied().unwrap_or(0);
            let then = wanted.incoming.get(&(source, relation)).copied().unwrap_or(0);
            if now == then {
                continue;
            }
            if now > 0 {
                removals.push((source, relation, id));
            }
            if then > 0 && relation == Relation::Parent {
                if let Some(other) = self.get(source).and_then(GraphItem::parent).filter(|p| *p != id) {
                    removals.push((source, Relation::Parent, other));
                }
            }
            additions.extend(std::iter::repeat((source, relation, id)).take(then));
        }

        for (source, relation, target) in removals {
            self.unlink(source, relation, target)?;
        }
        for (source, relation, target) in additions {
            self.link(source, relation, target)?;
        }

        // Mirrored lists refill in link order; put them back in base order.
        let children: Vec<ItemId> = live_subset(base_item.children(), |n| self.contains(n));
        let incoming: Vec<ItemId> = live_subset(base_item.links().incoming(), |n| self.contains(n));
        let links = self.links_mut(id).ok_or(GraphError::ItemNotFound(id))?;
        restore_order(links.children_mut(), &children);
        restore_order(links.incoming_mut(), &incoming);
        for flag in Flag::ALL {
            links.set_flag(flag, base_item.flag(flag));
        }
        Ok(())
    }

    /// Consume the delta into its change log, attaching each changed item's
    /// final state at its last log entry.
    pub fn into_changes(self) -> DeltaChanges {
        let last: HashMap<ItemId, usize> = self
            .changes
            .iter()
            .enumerate()
            .map(|(position, change)| (change.id(), position))
            .collect();

        let entries = self
            .changes
            .iter()
            .enumerate()
            .map(|(position, change)| {
                let state = (last.get(&change.id()) == Some(&position))
                    .then(|| self.get(change.id()).map(|node| node.links().clone()))
                    .flatten();
                MergeEntry {
                    change: change.clone(),
                    state,
                }
            })
            .collect();

        DeltaChanges::new(
            self.base.version().to_string(),
            self.version,
            self.base.revision(),
            entries,
        )
    }

    fn record(&mut self, change: Change) {
        if let (Change::Updated { id }, Some(previous)) = (&change, self.changes.last()) {
            if previous.id() == *id && !matches!(previous, Change::Removed { .. }) {
                return;
            }
        }
        self.changes.push(change);
    }
}

/// Edges touching one item, each counted once: its own forward entries,
/// and the forward entries of neighbours that point at it.
#[derive(Debug, Default)]
struct IncidentEdges {
    outgoing: BTreeMap<Relation, Vec<ItemId>>,
    incoming: BTreeMap<(ItemId, Relation), usize>,
}

fn incident_edges<'a>(
    id: ItemId,
    links: &'a Links,
    neighbour: impl Fn(ItemId) -> Option<&'a Links>,
    live: impl Fn(ItemId) -> bool,
) -> IncidentEdges {
    let mut edges = IncidentEdges::default();
    for relation in Relation::FORWARD {
        let targets: Vec<ItemId> = links.ids(relation).into_iter().filter(|n| live(*n)).collect();
        if !targets.is_empty() {
            edges.outgoing.insert(relation, targets);
        }
    }
    for mirror in Relation::ALL.into_iter().filter(|r| !r.is_forward()) {
        for source in links.ids(mirror) {
            // Self edges are already counted as outgoing.
            if source == id || !live(source) {
                continue;
            }
            let Some(source_links) = neighbour(source) else {
                continue;
            };
            for forward in mirror.inverses() {
                let count = source_links.ids(*forward).iter().filter(|n| **n == id).count();
                if count > 0 {
                    edges.incoming.insert((source, *forward), count);
                }
            }
        }
    }
    edges
}

fn live_subset(ids: &[ItemId], live: impl Fn(ItemId) -> bool) -> Vec<ItemId> {
    ids.iter().copied().filter(|n| live(*n)).collect()
}

/// Reorder `list` to `order` when both hold the same IDs.
fn restore_order(list: &mut Vec<ItemId>, order: &[ItemId]) {
    let mut have = list.clone();
    let mut want = order.to_vec();
    have.sort();
    want.sort();
    if have == want {
        list.clear();
        list.extend_from_slice(order);
    }
}

impl<'b> ItemGraph for DeltaIndex<'b> {
    type Node = DeltaEntry<'b>;

    fn version(&self) -> &str {
        &self.version
    }

    fn config(&self) -> &IndexConfig {
        self.base.config()
    }

    fn slot_count(&self) -> usize {
        self.items.len()
    }

    fn len(&self) -> usize {
        self.live
    }

    fn is_in_flux(&self) -> bool {
        false
    }

    fn next_id(&self) -> ItemId {
        self.ids.peek()
    }

    fn get(&self, id: ItemId) -> Option<&DeltaEntry<'b>> {
        self.entry(id)
    }

    fn links_mut(&mut self, id: ItemId) -> Option<&mut Links> {
        if !self.contains(id) {
            return None;
        }
        self.record(Change::Updated { id });
        self.items
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .map(DeltaEntry::links_mut)
    }

    fn items(&self) -> Box<dyn Iterator<Item = &DeltaEntry<'b>> + '_> {
        Box::new(self.items.iter().flatten())
    }

    fn name_candidates(&self, item_type: ItemType, name: &str) -> Vec<ItemId> {
        self.names.lookup(item_type, name, || {
            self.items
                .iter()
                .flatten()
                .filter(move |item| item.item_type() == item_type)
                .map(|item| (item.id(), item.name()))
        })
    }

    fn insert_new(&mut self, parent: Option<ItemId>, name: &str, item_type: ItemType) -> Result<ItemId, GraphError> {
        let expected = ItemId::from_index(self.items.len());
        if self.ids.peek() != expected {
            return Err(GraphError::IdOutOfOrder {
                expected,
                got: self.ids.peek(),
            });
        }
        let item = Item::new(expected, item_type, name, parent)?;
        let id = self.ids.next_id();
        self.names.insert(item_type, id, name);
        self.items.push(Some(DeltaEntry::Fresh(item)));
        self.live += 1;
        self.record(Change::Added {
            id,
            parent,
            name: name.to_string(),
            item_type,
        });
        Ok(id)
    }

    fn vacate(&mut self, id: ItemId) -> Option<Links> {
        let entry = self.items.get_mut(id.index())?.take()?;
        self.live -= 1;
        self.names.remove(entry.item_type(), id, entry.name());
        self.record(Change::Removed { id });
        Some(entry.links().clone())
    }
}
