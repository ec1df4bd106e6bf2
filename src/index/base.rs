//! Authoritative graph version.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use super::name_index::NameCache;
use super::ItemGraph;
use crate::config::IndexConfig;
use crate::error::GraphError;
use crate::types::{GraphItem, IdGenerator, Item, ItemId, ItemType, Links};

/// Mapping from pre-consolidation IDs to their new values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdRemap {
    map: BTreeMap<ItemId, ItemId>,
}

impl IdRemap {
    /// New ID for `old`, if the item survived.
    pub fn get(&self, old: ItemId) -> Option<ItemId> {
        self.map.get(&old).copied()
    }

    /// Number of surviving items.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no item survived.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Whether every surviving item kept its ID.
    pub fn is_identity(&self) -> bool {
        self.map.iter().all(|(old, new)| old == new)
    }
}

/// Slot contents saved on first write while a merge replays, so a failed
/// replay can put the version back exactly as it was.
#[derive(Debug)]
struct Journal {
    slots: usize,
    live: usize,
    ids: IdGenerator,
    revision: u64,
    saved: HashMap<ItemId, Option<Item>>,
}

/// Authoritative version of the graph.
///
/// Items live in a dense array addressed by ID; removed items leave a
/// `None` slot until [`consolidate_ids`](Self::consolidate_ids) compacts
/// the array.
///
/// Mutation takes `&mut self`, so there is exactly one writer. Reads take
/// `&self` and may run concurrently; the lazily-built name indexes are
/// guarded by their own lock.
#[derive(Debug)]
pub struct ItemIndex {
    version: String,
    config: IndexConfig,
    items: Vec<Option<Item>>,
    live: usize,
    ids: IdGenerator,
    names: NameCache,
    in_flux: bool,
    revision: u64,
    journal: Option<Journal>,
}

impl ItemIndex {
    /// Create an empty version with default configuration.
    pub fn new(version: impl Into<String>) -> Self {
        Self::build(version.into(), IndexConfig::default())
    }

    /// Create an empty version with the given configuration.
    pub fn with_config(version: impl Into<String>, config: IndexConfig) -> Result<Self, GraphError> {
        config.validate()?;
        Ok(Self::build(version.into(), config))
    }

    fn build(version: String, config: IndexConfig) -> Self {
        let names = NameCache::new(
            config.name_prefix_len,
            Duration::from_millis(config.slow_index_build_ms),
        );
        Self {
            version,
            config,
            items: Vec::new(),
            live: 0,
            ids: IdGenerator::new(),
            names,
            in_flux: false,
            revision: 0,
            journal: None,
        }
    }

    /// Slots including removed ones, for delta construction.
    pub(crate) fn slots(&self) -> &[Option<Item>] {
        &self.items
    }

    /// Mutable access to a whole item.
    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        if !self.contains(id) {
            return None;
        }
        self.touch(id);
        self.items.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Counter bumped by every mutation. A delta records the revision it
    /// was built from, and merge refuses changes recorded against another.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Note a write to `id`: bump the revision and, during a merge, save
    /// the slot the first time it is written.
    fn touch(&mut self, id: ItemId) {
        self.revision += 1;
        let items = &self.items;
        if let Some(journal) = self.journal.as_mut() {
            if id.index() < journal.slots {
                journal
                    .saved
                    .entry(id)
                    .or_insert_with(|| items.get(id.index()).cloned().flatten());
            }
        }
    }

    pub(crate) fn begin_journal(&mut self) {
        self.journal = Some(Journal {
            slots: self.items.len(),
            live: self.live,
            ids: self.ids.clone(),
            revision: self.revision,
            saved: HashMap::new(),
        });
    }

    pub(crate) fn commit_journal(&mut self) {
        self.journal = None;
    }

    /// Undo every write since [`begin_journal`](Self::begin_journal).
    pub(crate) fn rollback_journal(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        self.items.truncate(journal.slots);
        for (id, slot) in journal.saved {
            if let Some(target) = self.items.get_mut(id.index()) {
                *target = slot;
            }
        }
        self.live = journal.live;
        self.ids = journal.ids;
        self.revision = journal.revision;
        self.names.invalidate();
    }

    /// Change an item's type. Allowed once per item.
    pub fn set_item_type(&mut self, id: ItemId, item_type: ItemType) -> Result<(), GraphError> {
        let item = self
            .items
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(GraphError::ItemNotFound(id))?;
        let previous = item.item_type();
        item.set_item_type(item_type)?;
        let name = item.name().to_string();
        self.names.remove(previous, id, &name);
        self.names.insert(item_type, id, &name);
        self.revision += 1;
        Ok(())
    }

    pub(crate) fn set_in_flux(&mut self, in_flux: bool) {
        self.in_flux = in_flux;
    }

    /// Reassign dense, gap-free IDs after removals.
    ///
    /// Every stored reference is rewritten. Name indexes are dropped and
    /// rebuilt on next use.
    pub fn consolidate_ids(&mut self) -> IdRemap {
        let mut remap = IdRemap::default();
        for (next, old) in self.items.iter().flatten().map(GraphItem::id).enumerate() {
            remap.map.insert(old, ItemId::from_index(next));
        }
        let removed = self.items.len() - remap.len();

        let mut items: Vec<Option<Item>> = std::mem::take(&mut self.items)
            .into_iter()
            .flatten()
            .map(Some)
            .collect();
        for item in items.iter_mut().flatten() {
            if let Some(new_id) = remap.get(item.id()) {
                item.reassign_id(new_id);
            }
            item.links_mut().remap(|old| remap.get(old));
        }

        self.items = items;
        self.live = self.items.len();
        self.ids = IdGenerator::starting_at(ItemId::from_index(self.items.len()));
        self.names.invalidate();
        self.revision += 1;

        tracing::info!(
            version = %self.version,
            items = self.live,
            removed_slots = removed,
            "Consolidated item IDs"
        );
        remap
    }
}

impl ItemGraph for ItemIndex {
    type Node = Item;

    fn version(&self) -> &str {
        &self.version
    }

    fn config(&self) -> &IndexConfig {
        &self.config
    }

    fn slot_count(&self) -> usize {
        self.items.len()
    }

    fn len(&self) -> usize {
        self.live
    }

    fn is_in_flux(&self) -> bool {
        self.in_flux
    }

    fn next_id(&self) -> ItemId {
        self.ids.peek()
    }

    fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.index()).and_then(Option::as_ref)
    }

    fn links_mut(&mut self, id: ItemId) -> Option<&mut Links> {
        self.item_mut(id).map(Item::links_mut)
    }

    fn items(&self) -> Box<dyn Iterator<Item = &Item> + '_> {
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
        self.revision += 1;
        self.names.insert(item_type, id, name);
        self.items.push(Some(item));
        self.live += 1;
        Ok(id)
    }

    fn vacate(&mut self, id: ItemId) -> Option<Links> {
        if !self.contains(id) {
            return None;
        }
        self.touch(id);
        let item = self.items.get_mut(id.index())?.take()?;
        self.live -= 1;
        self.names.remove(item.item_type(), id, item.name());
        Some(item.links().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::check_integrity;
    use crate::types::Relation;

    #[test]
    fn test_ids_match_slots() {
        let mut index = ItemIndex::new("v1");
        let project = index.create_item(None, "P", ItemType::Project, true).unwrap();
        let package = index.create_item(Some(project), "P:k", ItemType::Package, true).unwrap();

        assert_eq!(project, ItemId::new(0));
        assert_eq!(package, ItemId::new(1));
        assert_eq!(index.get(package).unwrap().id(), package);
        assert_eq!(index.next_id(), ItemId::new(2));
    }

    #[test]
    fn test_check_exists_reuses_item() {
        let mut index = ItemIndex::new("v1");
        let a = index.create_item(None, "pkg", ItemType::Package, true).unwrap();
        let b = index.create_item(None, "pkg", ItemType::Package, true).unwrap();
        let c = index.create_item(None, "pkg", ItemType::Package, false).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_methods_cannot_have_children() {
        let mut index = ItemIndex::new("v1");
        let class = index.create_item(None, "C", ItemType::Class, true).unwrap();
        let method = index.create_item(Some(class), "run", ItemType::Method, true).unwrap();

        let err = index.create_item(Some(method), "x", ItemType::Field, true).unwrap_err();
        assert!(matches!(err, GraphError::InvalidParent { .. }));
    }

    #[test]
    fn test_set_item_type_once_and_reindexed() {
        let mut index = ItemIndex::new("v1");
        let id = index.create_item(None, "Thing", ItemType::Class, true).unwrap();
        assert_eq!(index.find_item(None, "Thing", ItemType::Class), Some(id));

        index.set_item_type(id, ItemType::Package).unwrap();
        assert_eq!(index.find_item(None, "Thing", ItemType::Class), None);
        assert_eq!(index.find_item(None, "Thing", ItemType::Package), Some(id));

        assert_eq!(
            index.set_item_type(id, ItemType::Class),
            Err(GraphError::TypeAlreadySet(id))
        );
    }

    #[test]
    fn test_consolidate_compacts_and_remaps() {
        let mut index = ItemIndex::new("v1");
        let a = index.create_item(None, "A", ItemType::Class, true).unwrap();
        let gone = index.create_item(None, "Gone", ItemType::Class, true).unwrap();
        let b = index.create_item(None, "B", ItemType::Class, true).unwrap();
        index.link(b, Relation::Superclass, a).unwrap();
        index.link(b, Relation::Dependencies, gone).unwrap();
        index.remove_item(gone).unwrap();

        let remap = index.consolidate_ids();

        assert_eq!(index.slot_count(), 2);
        assert_eq!(remap.get(gone), None);
        let new_b = remap.get(b).unwrap();
        let new_a = remap.get(a).unwrap();
        assert_eq!(new_b, ItemId::new(1));
        assert_eq!(index.get(new_b).unwrap().links().superclass(), Some(new_a));
        assert_eq!(index.find_class(None, "B"), Some(new_b));
        assert_eq!(index.next_id(), ItemId::new(2));
        assert!(check_integrity(&index).is_empty());
    }

    #[test]
    fn test_revision_tracks_mutations_only() {
        let mut index = ItemIndex::new("v1");
        let a = index.create_item(None, "A", ItemType::Class, true).unwrap();
        let b = index.create_item(None, "B", ItemType::Class, true).unwrap();
        let after_create = index.revision();

        let _ = index.find_class(None, "A");
        assert!(index.links_mut(ItemId::new(42)).is_none());
        assert!(index.remove_item(ItemId::new(42)).is_err());
        assert_eq!(index.revision(), after_create);

        index.link(a, Relation::Dependencies, b).unwrap();
        let after_link = index.revision();
        assert!(after_link > after_create);

        index.remove_item(b).unwrap();
        assert!(index.revision() > after_link);
    }

    #[test]
    fn test_zero_prefix_config_rejected() {
        let config = IndexConfig { name_prefix_len: 0, ..IndexConfig::default() };
        assert!(ItemIndex::with_config("v1", config).is_err());
    }

    #[test]
    fn test_describe_walks_parents() {
        let mut index = ItemIndex::new("v1");
        let project = index.create_item(None, "P", ItemType::Project, true).unwrap();
        let package = index.create_item(Some(project), "P:k", ItemType::Package, true).unwrap();
        let class = index.create_item(Some(package), "P:k:C", ItemType::Class, true).unwrap();

        assert_eq!(index.describe(class), "CLASS P / P:k / P:k:C #2");
        index.set_in_flux(true);
        assert_eq!(index.describe(class), "CLASS P:k:C #2");
    }
}
