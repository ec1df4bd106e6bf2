//! Graph items.

use serde::{Deserialize, Serialize};

use super::attribute::{AttributeKey, AttributeValue, Flag};
use super::id::ItemId;
use super::item_type::ItemType;
use super::links::Links;
use crate::error::GraphError;

/// Name of the wildcard type that matches any type in signature comparison.
pub const WILDCARD_TYPE_NAME: &str = "?";

/// Read access shared by base items and delta items.
pub trait GraphItem {
    /// Identifier, equal to the item's slot in its index.
    fn id(&self) -> ItemId;

    /// Item type.
    fn item_type(&self) -> ItemType;

    /// Item name.
    fn name(&self) -> &str;

    /// Edges and attributes.
    fn links(&self) -> &Links;

    /// Containing item.
    fn parent(&self) -> Option<ItemId> {
        self.links().parent()
    }

    /// Contained items.
    fn children(&self) -> &[ItemId] {
        self.links().children()
    }

    /// Items this item depends on.
    fn dependencies(&self) -> &[ItemId] {
        self.links().dependencies()
    }

    /// Items depending on this item.
    fn incoming(&self) -> &[ItemId] {
        self.links().incoming()
    }

    /// Read an attribute by key.
    fn attribute(&self, key: AttributeKey) -> Option<AttributeValue> {
        self.links().attribute(key)
    }

    /// Value of a boolean flag.
    fn flag(&self, flag: Flag) -> bool {
        self.links().flag(flag)
    }

    /// Whether this item is the wildcard type.
    fn is_wildcard(&self) -> bool {
        self.item_type() == ItemType::Class
            && self.parent().is_none()
            && self.name() == WILDCARD_TYPE_NAME
    }

    /// Whether this item is an array type.
    fn is_array(&self) -> bool {
        self.links().array_base_class().is_some()
    }
}

/// Authoritative item owning its own edges and attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    item_type: ItemType,
    name: String,
    type_fixed: bool,
    links: Links,
}

impl Item {
    /// Create an item with empty links under `parent`.
    pub fn new(
        id: ItemId,
        item_type: ItemType,
        name: impl Into<String>,
        parent: Option<ItemId>,
    ) -> Result<Self, GraphError> {
        let name = name.into();
        if name.is_empty() {
            return Err(GraphError::EmptyName);
        }
        Ok(Self {
            id,
            item_type,
            name,
            type_fixed: false,
            links: Links::with_parent(parent),
        })
    }

    /// Mutable edges and attributes.
    pub fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }

    /// Change the item type. Allowed once per item.
    pub fn set_item_type(&mut self, item_type: ItemType) -> Result<(), GraphError> {
        if self.type_fixed {
            return Err(GraphError::TypeAlreadySet(self.id));
        }
        self.item_type = item_type;
        self.type_fixed = true;
        Ok(())
    }

    pub(crate) fn reassign_id(&mut self, id: ItemId) {
        self.id = id;
    }
}

impl GraphItem for Item {
    fn id(&self) -> ItemId {
        self.id
    }

    fn item_type(&self) -> ItemType {
        self.item_type
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn links(&self) -> &Links {
        &self.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_rejected() {
        let err = Item::new(ItemId::new(0), ItemType::Class, "", None).unwrap_err();
        assert_eq!(err, GraphError::EmptyName);
    }

    #[test]
    fn test_type_settable_once() {
        let mut item = Item::new(ItemId::new(3), ItemType::Class, "Foo", None).unwrap();
        item.set_item_type(ItemType::Field).unwrap();
        assert_eq!(item.item_type(), ItemType::Field);
        assert_eq!(
            item.set_item_type(ItemType::Method),
            Err(GraphError::TypeAlreadySet(ItemId::new(3)))
        );
    }

    #[test]
    fn test_wildcard_detection() {
        let wildcard = Item::new(ItemId::new(0), ItemType::Class, WILDCARD_TYPE_NAME, None).unwrap();
        assert!(wildcard.is_wildcard());

        let nested = Item::new(ItemId::new(1), ItemType::Class, WILDCARD_TYPE_NAME, Some(ItemId::new(0))).unwrap();
        assert!(!nested.is_wildcard());
    }
}
