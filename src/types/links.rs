//! Edges and attributes of a single item.
//!
//! [`Links`] is the mutable state shared by base and delta items: the
//! containment edges, the dependency edges and the typed attribute fields.
//! Identity (`id`, `type`, `name`) lives on the item, not here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::attribute::{AttributeKey, AttributeValue, Flag};
use super::id::ItemId;
use super::relation::{Cardinality, Relation};
use crate::error::GraphError;
use crate::visitor::{Field, ItemVisitor, VisitMode};

/// Edges and attributes of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    parent: Option<ItemId>,
    children: Vec<ItemId>,
    dependencies: Vec<ItemId>,
    incoming: Vec<ItemId>,
    superclass: Option<ItemId>,
    superinterfaces: BTreeSet<ItemId>,
    subclasses: BTreeSet<ItemId>,
    return_type: Option<ItemId>,
    param_types: Vec<ItemId>,
    throws_types: Vec<ItemId>,
    used_by_methods_and_fields: BTreeSet<ItemId>,
    field_type: Option<ItemId>,
    array_base_class: Option<ItemId>,
    used_by_array_class: Option<ItemId>,
    outer_class: Option<ItemId>,
    inner_classes: BTreeSet<ItemId>,
    binary: bool,
    third_party: bool,
    project_private_visible: bool,
}

/// Borrowed storage of one relation.
enum Slot<'a> {
    One(&'a Option<ItemId>),
    List(&'a Vec<ItemId>),
    Set(&'a BTreeSet<ItemId>),
}

enum SlotMut<'a> {
    One(&'a mut Option<ItemId>),
    List(&'a mut Vec<ItemId>),
    Set(&'a mut BTreeSet<ItemId>),
}

impl Links {
    /// Empty links under the given parent.
    pub fn with_parent(parent: Option<ItemId>) -> Self {
        Self { parent, ..Self::default() }
    }

    fn slot(&self, relation: Relation) -> Slot<'_> {
        match relation {
            Relation::Parent => Slot::One(&self.parent),
            Relation::Children => Slot::List(&self.children),
            Relation::Dependencies => Slot::List(&self.dependencies),
            Relation::Incoming => Slot::List(&self.incoming),
            Relation::Superclass => Slot::One(&self.superclass),
            Relation::Superinterfaces => Slot::Set(&self.superinterfaces),
            Relation::Subclasses => Slot::Set(&self.subclasses),
            Relation::ReturnType => Slot::One(&self.return_type),
            Relation::ParamTypes => Slot::List(&self.param_types),
            Relation::ThrowsTypes => Slot::List(&self.throws_types),
            Relation::UsedByMethodsAndFields => Slot::Set(&self.used_by_methods_and_fields),
            Relation::FieldType => Slot::One(&self.field_type),
            Relation::ArrayBaseClass => Slot::One(&self.array_base_class),
            Relation::UsedByArrayClass => Slot::One(&self.used_by_array_class),
            Relation::OuterClass => Slot::One(&self.outer_class),
            Relation::InnerClasses => Slot::Set(&self.inner_classes),
        }
    }

    fn slot_mut(&mut self, relation: Relation) -> SlotMut<'_> {
        match relation {
            Relation::Parent => SlotMut::One(&mut self.parent),
            Relation::Children => SlotMut::List(&mut self.children),
            Relation::Dependencies => SlotMut::List(&mut self.dependencies),
            Relation::Incoming => SlotMut::List(&mut self.incoming),
            Relation::Superclass => SlotMut::One(&mut self.superclass),
            Relation::Superinterfaces => SlotMut::Set(&mut self.superinterfaces),
            Relation::Subclasses => SlotMut::Set(&mut self.subclasses),
            Relation::ReturnType => SlotMut::One(&mut self.return_type),
            Relation::ParamTypes => SlotMut::List(&mut self.param_types),
            Relation::ThrowsTypes => SlotMut::List(&mut self.throws_types),
            Relation::UsedByMethodsAndFields => SlotMut::Set(&mut self.used_by_methods_and_fields),
            Relation::FieldType => SlotMut::One(&mut self.field_type),
            Relation::ArrayBaseClass => SlotMut::One(&mut self.array_base_class),
            Relation::UsedByArrayClass => SlotMut::One(&mut self.used_by_array_class),
            Relation::OuterClass => SlotMut::One(&mut self.outer_class),
            Relation::InnerClasses => SlotMut::Set(&mut self.inner_classes),
        }
    }

    // ── Relations, generically ──────────────────────────────────────────

    /// Targets of a relation, in storage order.
    pub fn ids(&self, relation: Relation) -> Vec<ItemId> {
        match self.slot(relation) {
            Slot::One(one) => one.iter().copied().collect(),
            Slot::List(list) => list.clone(),
            Slot::Set(set) => set.iter().copied().collect(),
        }
    }

    /// Whether `id` is a target of `relation`.
    pub fn contains(&self, relation: Relation, id: ItemId) -> bool {
        match self.slot(relation) {
            Slot::One(one) => *one == Some(id),
            Slot::List(list) => list.contains(&id),
            Slot::Set(set) => set.contains(&id),
        }
    }

    /// Whether the relation has no targets.
    pub fn is_empty(&self, relation: Relation) -> bool {
        match self.slot(relation) {
            Slot::One(one) => one.is_none(),
            Slot::List(list) => list.is_empty(),
            Slot::Set(set) => set.is_empty(),
        }
    }

    /// Add a target. Single-valued relations are overwritten; unique lists
    /// and sets ignore duplicates; sequences append.
    pub(crate) fn insert_id(&mut self, relation: Relation, id: ItemId) {
        let unique = relation.cardinality() != Cardinality::Sequence;
        match self.slot_mut(relation) {
            SlotMut::One(one) => *one = Some(id),
            SlotMut::List(list) => {
                if !unique || !list.contains(&id) {
                    list.push(id);
                }
            }
            SlotMut::Set(set) => {
                set.insert(id);
            }
        }
    }

    /// Remove every occurrence of `id` from a relation.
    ///
    /// Returns whether anything was removed.
    pub(crate) fn remove_id(&mut self, relation: Relation, id: ItemId) -> bool {
        match self.slot_mut(relation) {
            SlotMut::One(one) => {
                if *one == Some(id) {
                    *one = None;
                    true
                } else {
                    false
                }
            }
            SlotMut::List(list) => {
                let before = list.len();
                list.retain(|x| *x != id);
                list.len() != before
            }
            SlotMut::Set(set) => set.remove(&id),
        }
    }

    /// Rewrite every stored ID through `map`; IDs mapped to `None` are dropped.
    pub fn remap<F: FnMut(ItemId) -> Option<ItemId>>(&mut self, mut map: F) {
        for relation in Relation::ALL {
            match self.slot_mut(relation) {
                SlotMut::One(one) => *one = one.and_then(&mut map),
                SlotMut::List(list) => {
                    *list = list.iter().filter_map(|id| map(*id)).collect();
                }
                SlotMut::Set(set) => {
                    *set = set.iter().filter_map(|id| map(*id)).collect();
                }
            }
        }
    }

    // ── Core edges ──────────────────────────────────────────────────────

    /// Containing item.
    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ItemId>) {
        self.parent = parent;
    }

    /// Contained items.
    pub fn children(&self) -> &[ItemId] {
        &self.children
    }

    /// Contained items, mutable in place.
    ///
    /// The caller is responsible for keeping the children's parents consistent.
    pub fn children_mut(&mut self) -> &mut Vec<ItemId> {
        &mut self.children
    }

    /// Items this item depends on.
    pub fn dependencies(&self) -> &[ItemId] {
        &self.dependencies
    }

    /// Dependencies, mutable in place.
    ///
    /// The caller is responsible for the matching `incoming` entries.
    pub fn dependencies_mut(&mut self) -> &mut Vec<ItemId> {
        &mut self.dependencies
    }

    /// Items depending on this item.
    pub fn incoming(&self) -> &[ItemId] {
        &self.incoming
    }

    /// Incoming edges, mutable in place.
    pub fn incoming_mut(&mut self) -> &mut Vec<ItemId> {
        &mut self.incoming
    }

    // ── Typed attributes ────────────────────────────────────────────────

    /// Direct superclass.
    pub fn superclass(&self) -> Option<ItemId> {
        self.superclass
    }

    /// Direct superinterfaces.
    pub fn superinterfaces(&self) -> &BTreeSet<ItemId> {
        &self.superinterfaces
    }

    /// Classes naming this item as superclass or superinterface.
    pub fn subclasses(&self) -> &BTreeSet<ItemId> {
        &self.subclasses
    }

    /// Method return type.
    pub fn return_type(&self) -> Option<ItemId> {
        self.return_type
    }

    /// Method parameter types.
    pub fn param_types(&self) -> &[ItemId] {
        &self.param_types
    }

    /// Method throws types.
    pub fn throws_types(&self) -> &[ItemId] {
        &self.throws_types
    }

    /// Methods and fields whose signature references this type.
    pub fn used_by_methods_and_fields(&self) -> &BTreeSet<ItemId> {
        &self.used_by_methods_and_fields
    }

    /// Field type.
    pub fn field_type(&self) -> Option<ItemId> {
        self.field_type
    }

    /// Element type of an array type.
    pub fn array_base_class(&self) -> Option<ItemId> {
        self.array_base_class
    }

    /// Array type one dimension above this type.
    pub fn used_by_array_class(&self) -> Option<ItemId> {
        self.used_by_array_class
    }

    /// Enclosing class.
    pub fn outer_class(&self) -> Option<ItemId> {
        self.outer_class
    }

    /// Inner classes.
    pub fn inner_classes(&self) -> &BTreeSet<ItemId> {
        &self.inner_classes
    }

    /// Value of a boolean flag.
    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::Binary => self.binary,
            Flag::ThirdParty => self.third_party,
            Flag::ProjectPrivateVisible => self.project_private_visible,
        }
    }

    /// Set a boolean flag.
    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        match flag {
            Flag::Binary => self.binary = value,
            Flag::ThirdParty => self.third_party = value,
            Flag::ProjectPrivateVisible => self.project_private_visible = value,
        }
    }

    // ── Untyped attribute access ────────────────────────────────────────

    /// Whether an attribute carries a value (non-empty, or `true` for flags).
    pub fn has_attribute(&self, key: AttributeKey) -> bool {
        match (key.relation(), key.flag()) {
            (Some(relation), _) => !self.is_empty(relation),
            (None, Some(flag)) => self.flag(flag),
            (None, None) => false,
        }
    }

    /// Read an attribute by key; `None` when unpopulated.
    pub fn attribute(&self, key: AttributeKey) -> Option<AttributeValue> {
        if !self.has_attribute(key) {
            return None;
        }
        if let Some(flag) = key.flag() {
            return Some(AttributeValue::Flag(self.flag(flag)));
        }
        let relation = key.relation()?;
        Some(match self.slot(relation) {
            Slot::One(one) => AttributeValue::Id((*one)?),
            Slot::List(list) => AttributeValue::Ids(list.clone()),
            Slot::Set(set) => AttributeValue::IdSet(set.clone()),
        })
    }

    /// Write an attribute by key.
    ///
    /// This is a raw write: the reverse side of a paired attribute is not
    /// touched. Use the index's `link`/`unlink` to keep both sides in step.
    pub fn set_attribute(&mut self, key: AttributeKey, value: AttributeValue) -> Result<(), GraphError> {
        let mismatch = || GraphError::AttributeKindMismatch {
            key,
            expected: key.value_kind().describe(),
        };
        if let Some(flag) = key.flag() {
            let AttributeValue::Flag(value) = value else {
                return Err(mismatch());
            };
            self.set_flag(flag, value);
            return Ok(());
        }
        let relation = key.relation().ok_or_else(mismatch)?;
        match (self.slot_mut(relation), value) {
            (SlotMut::One(one), AttributeValue::Id(id)) => *one = Some(id),
            (SlotMut::List(list), AttributeValue::Ids(ids)) => *list = ids,
            (SlotMut::Set(set), AttributeValue::IdSet(ids)) => *set = ids,
            _ => return Err(mismatch()),
        }
        Ok(())
    }

    /// Reset an attribute to its unpopulated state.
    pub fn clear_attribute(&mut self, key: AttributeKey) {
        if let Some(flag) = key.flag() {
            self.set_flag(flag, false);
        } else if let Some(relation) = key.relation() {
            match self.slot_mut(relation) {
                SlotMut::One(one) => *one = None,
                SlotMut::List(list) => list.clear(),
                SlotMut::Set(set) => set.clear(),
            }
        }
    }

    // ── Visitor contract ────────────────────────────────────────────────

    /// Every field in visiting order: the four core edges, then each
    /// attribute in [`AttributeKey::ALL`] order.
    pub fn fields(&self) -> [Field<'_>; 19] {
        [
            Field::Parent(self.parent),
            Field::Children(&self.children),
            Field::Dependencies(&self.dependencies),
            Field::Incoming(&self.incoming),
            Field::Superclass(self.superclass),
            Field::Superinterfaces(&self.superinterfaces),
            Field::Subclasses(&self.subclasses),
            Field::ReturnType(self.return_type),
            Field::ParamTypes(&self.param_types),
            Field::ThrowsTypes(&self.throws_types),
            Field::UsedByMethodsAndFields(&self.used_by_methods_and_fields),
            Field::FieldType(self.field_type),
            Field::ArrayBaseClass(self.array_base_class),
            Field::UsedByArrayClass(self.used_by_array_class),
            Field::OuterClass(self.outer_class),
            Field::InnerClasses(&self.inner_classes),
            Field::Binary(self.binary),
            Field::ThirdParty(self.third_party),
            Field::ProjectPrivateVisible(self.project_private_visible),
        ]
    }

    /// Offer every field to `visitor`.
    ///
    /// Core edges are always visited; attributes only when populated unless
    /// `mode` is [`VisitMode::IncludeEmpty`]. Returns the IDs of fields the
    /// visitor asked to recurse into.
    pub fn accept<V: ItemVisitor + ?Sized>(&self, item: ItemId, visitor: &mut V, mode: VisitMode) -> Vec<ItemId> {
        let mut recurse = Vec::new();
        for field in self.fields() {
            if !field.is_core() && mode == VisitMode::Populated && field.is_empty() {
                continue;
            }
            if visitor.visit(item, field) {
                recurse.extend(field.ids());
            }
        }
        recurse
    }

    /// Overwrite the storage behind `field` with its value.
    pub(crate) fn apply(&mut self, field: Field<'_>) {
        match field {
            Field::Parent(p) => self.parent = p,
            Field::Children(ids) => self.children = ids.to_vec(),
            Field::Dependencies(ids) => self.dependencies = ids.to_vec(),
            Field::Incoming(ids) => self.incoming = ids.to_vec(),
            Field::Superclass(id) => self.superclass = id,
            Field::Superinterfaces(ids) => self.superinterfaces = ids.clone(),
            Field::Subclasses(ids) => self.subclasses = ids.clone(),
            Field::ReturnType(id) => self.return_type = id,
            Field::ParamTypes(ids) => self.param_types = ids.to_vec(),
            Field::ThrowsTypes(ids) => self.throws_types = ids.to_vec(),
            Field::UsedByMethodsAndFields(ids) => self.used_by_methods_and_fields = ids.clone(),
            Field::FieldType(id) => self.field_type = id,
            Field::ArrayBaseClass(id) => self.array_base_class = id,
            Field::UsedByArrayClass(id) => self.used_by_array_class = id,
            Field::OuterClass(id) => self.outer_class = id,
            Field::InnerClasses(ids) => self.inner_classes = ids.clone(),
            Field::Binary(b) => self.binary = b,
            Field::ThirdParty(b) => self.third_party = b,
            Field::ProjectPrivateVisible(b) => self.project_private_visible = b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> ItemId {
        ItemId::new(n)
    }

    #[test]
    fn test_insert_respects_cardinality() {
        let mut links = Links::default();
        links.insert_id(Relation::Dependencies, id(1));
        links.insert_id(Relation::Dependencies, id(1));
        links.insert_id(Relation::ParamTypes, id(2));
        links.insert_id(Relation::ParamTypes, id(2));
        links.insert_id(Relation::ReturnType, id(3));
        links.insert_id(Relation::ReturnType, id(4));

        assert_eq!(links.dependencies(), &[id(1)]);
        assert_eq!(links.param_types(), &[id(2), id(2)]);
        assert_eq!(links.return_type(), Some(id(4)));
    }

    #[test]
    fn test_remove_strips_every_occurrence() {
        let mut links = Links::default();
        links.insert_id(Relation::ParamTypes, id(5));
        links.insert_id(Relation::ParamTypes, id(6));
        links.insert_id(Relation::ParamTypes, id(5));

        assert!(links.remove_id(Relation::ParamTypes, id(5)));
        assert_eq!(links.param_types(), &[id(6)]);
        assert!(!links.remove_id(Relation::ParamTypes, id(5)));
    }

    #[test]
    fn test_attribute_roundtrip_and_kind_check() {
        let mut links = Links::default();
        assert_eq!(links.attribute(AttributeKey::Superclass), None);

        links.set_attribute(AttributeKey::Superclass, AttributeValue::Id(id(9))).unwrap();
        assert_eq!(links.attribute(AttributeKey::Superclass), Some(AttributeValue::Id(id(9))));

        let err = links
            .set_attribute(AttributeKey::Superclass, AttributeValue::Flag(true))
            .unwrap_err();
        assert!(matches!(err, GraphError::AttributeKindMismatch { key: AttributeKey::Superclass, .. }));

        links.set_attribute(AttributeKey::ThirdParty, AttributeValue::Flag(true)).unwrap();
        assert!(links.flag(Flag::ThirdParty));

        links.clear_attribute(AttributeKey::Superclass);
        assert!(!links.has_attribute(AttributeKey::Superclass));
    }

    #[test]
    fn test_remap_drops_unmapped() {
        let mut links = Links::with_parent(Some(id(0)));
        links.children_mut().extend([id(1), id(2)]);
        links.insert_id(Relation::Subclasses, id(2));

        links.remap(|old| (old != id(1)).then(|| ItemId::new(old.raw() + 10)));

        assert_eq!(links.parent(), Some(id(10)));
        assert_eq!(links.children(), &[id(12)]);
        assert!(links.subclasses().contains(&id(12)));
    }

    #[test]
    fn test_fields_cover_every_relation_and_flag() {
        let links = Links::default();
        let relations: BTreeSet<_> = links.fields().iter().filter_map(|f| f.relation()).collect();
        assert_eq!(relations.len(), Relation::ALL.len());
        let flags = links.fields().iter().filter(|f| f.relation().is_none()).count();
        assert_eq!(flags, Flag::ALL.len());
    }
}
