//! Structural visitor contract.
//!
//! [`Links::fields`] enumerates every edge and attribute of an item as a
//! [`Field`]. Visitors match on `Field` exhaustively, so a new attribute kind
//! is a compile error in every visitor until it is handled.
//!
//! Two visitors are built on the contract:
//!
//! - [`CopyVisitor`] copies raw field values into fresh [`Links`] (used when
//!   moving an item to another index; the IDs stay relative to the source).
//! - [`OverwriteVisitor`] replaces the state of an existing item with the
//!   source's, refusing to change the parent. Used to seed and revert delta
//!   items and to fold delta state back into the base on merge.

use std::collections::BTreeSet;

use crate::error::GraphError;
use crate::types::{ItemId, Links, Relation};

/// One edge list or attribute of an item, borrowed from its [`Links`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a> {
    /// Containing item.
    Parent(Option<ItemId>),
    /// Contained items.
    Children(&'a [ItemId]),
    /// Items depended on.
    Dependencies(&'a [ItemId]),
    /// Dependents.
    Incoming(&'a [ItemId]),
    /// Superclass attribute.
    Superclass(Option<ItemId>),
    /// Superinterfaces attribute.
    Superinterfaces(&'a BTreeSet<ItemId>),
    /// Subclasses attribute.
    Subclasses(&'a BTreeSet<ItemId>),
    /// Return type attribute.
    ReturnType(Option<ItemId>),
    /// Parameter types attribute.
    ParamTypes(&'a [ItemId]),
    /// Throws types attribute.
    ThrowsTypes(&'a [ItemId]),
    /// Reverse signature usage attribute.
    UsedByMethodsAndFields(&'a BTreeSet<ItemId>),
    /// Field type attribute.
    FieldType(Option<ItemId>),
    /// Array element type attribute.
    ArrayBaseClass(Option<ItemId>),
    /// Array wrapper attribute.
    UsedByArrayClass(Option<ItemId>),
    /// Enclosing class attribute.
    OuterClass(Option<ItemId>),
    /// Inner classes attribute.
    InnerClasses(&'a BTreeSet<ItemId>),
    /// Binary flag.
    Binary(bool),
    /// Third-party flag.
    ThirdParty(bool),
    /// Project-private visibility flag.
    ProjectPrivateVisible(bool),
}

impl Field<'_> {
    /// Relation carried by this field; `None` for flags.
    pub fn relation(&self) -> Option<Relation> {
        match self {
            Self::Parent(_) => Some(Relation::Parent),
            Self::Children(_) => Some(Relation::Children),
            Self::Dependencies(_) => Some(Relation::Dependencies),
            Self::Incoming(_) => Some(Relation::Incoming),
            Self::Superclass(_) => Some(Relation::Superclass),
            Self::Superinterfaces(_) => Some(Relation::Superinterfaces),
            Self::Subclasses(_) => Some(Relation::Subclasses),
            Self::ReturnType(_) => Some(Relation::ReturnType),
            Self::ParamTypes(_) => Some(Relation::ParamTypes),
            Self::ThrowsTypes(_) => Some(Relation::ThrowsTypes),
            Self::UsedByMethodsAndFields(_) => Some(Relation::UsedByMethodsAndFields),
            Self::FieldType(_) => Some(Relation::FieldType),
            Self::ArrayBaseClass(_) => Some(Relation::ArrayBaseClass),
            Self::UsedByArrayClass(_) => Some(Relation::UsedByArrayClass),
            Self::OuterClass(_) => Some(Relation::OuterClass),
            Self::InnerClasses(_) => Some(Relation::InnerClasses),
            Self::Binary(_) | Self::ThirdParty(_) | Self::ProjectPrivateVisible(_) => None,
        }
    }

    /// Parent, children, dependencies and incoming are always visited.
    pub fn is_core(&self) -> bool {
        matches!(
            self,
            Self::Parent(_) | Self::Children(_) | Self::Dependencies(_) | Self::Incoming(_)
        )
    }

    /// IDs referenced by this field.
    pub fn ids(&self) -> Vec<ItemId> {
        match self {
            Self::Parent(id)
            | Self::Superclass(id)
            | Self::ReturnType(id)
            | Self::FieldType(id)
            | Self::ArrayBaseClass(id)
            | Self::UsedByArrayClass(id)
            | Self::OuterClass(id) => id.iter().copied().collect(),
            Self::Children(ids)
            | Self::Dependencies(ids)
            | Self::Incoming(ids)
            | Self::ParamTypes(ids)
            | Self::ThrowsTypes(ids) => ids.to_vec(),
            Self::Superinterfaces(ids)
            | Self::Subclasses(ids)
            | Self::UsedByMethodsAndFields(ids)
            | Self::InnerClasses(ids) => ids.iter().copied().collect(),
            Self::Binary(_) | Self::ThirdParty(_) | Self::ProjectPrivateVisible(_) => Vec::new(),
        }
    }

    /// Whether the field holds no value (no IDs, or a `false` flag).
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Binary(b) | Self::ThirdParty(b) | Self::ProjectPrivateVisible(b) => !b,
            other => other.ids().is_empty(),
        }
    }
}

/// Whether unpopulated attributes are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitMode {
    /// Skip attributes with no value.
    Populated,
    /// Visit every attribute.
    IncludeEmpty,
}

/// Receives each field of an item in a fixed order.
pub trait ItemVisitor {
    /// Visit one field of `item`. Return `true` to have a graph walk recurse
    /// into the IDs the field references.
    fn visit(&mut self, item: ItemId, field: Field<'_>) -> bool;
}

impl<F> ItemVisitor for F
where
    F: FnMut(ItemId, Field<'_>) -> bool,
{
    fn visit(&mut self, item: ItemId, field: Field<'_>) -> bool {
        self(item, field)
    }
}

/// Wrap a closure as a visitor.
pub fn from_fn<F>(f: F) -> F
where
    F: FnMut(ItemId, Field<'_>) -> bool,
{
    f
}

/// Copies raw field values into fresh links.
#[derive(Debug, Default)]
pub struct CopyVisitor {
    target: Links,
}

impl CopyVisitor {
    /// Create a visitor with empty target links.
    pub fn new() -> Self {
        Self::default()
    }

    /// The copied links.
    pub fn into_links(self) -> Links {
        self.target
    }
}

impl ItemVisitor for CopyVisitor {
    fn visit(&mut self, _item: ItemId, field: Field<'_>) -> bool {
        self.target.apply(field);
        false
    }
}

/// Overwrites an existing item's state, except its parent.
#[derive(Debug)]
pub struct OverwriteVisitor<'t> {
    target: &'t mut Links,
    mismatch: Option<GraphError>,
}

impl<'t> OverwriteVisitor<'t> {
    /// Overwrite `target`.
    pub fn new(target: &'t mut Links) -> Self {
        Self { target, mismatch: None }
    }

    /// Parent mismatch observed during the visit, if any.
    pub fn finish(self) -> Result<(), GraphError> {
        match self.mismatch {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ItemVisitor for OverwriteVisitor<'_> {
    fn visit(&mut self, item: ItemId, field: Field<'_>) -> bool {
        match field {
            Field::Parent(source_parent) => {
                let target_parent = self.target.parent();
                if source_parent != target_parent && self.mismatch.is_none() {
                    self.mismatch = Some(GraphError::ParentMismatch {
                        item,
                        source_parent,
                        target_parent,
                    });
                }
            }
            other => self.target.apply(other),
        }
        false
    }
}

/// Copy `source` into new links, raw IDs included.
pub fn copy_links(item: ItemId, source: &Links) -> Links {
    let mut visitor = CopyVisitor::new();
    source.accept(item, &mut visitor, VisitMode::Populated);
    visitor.into_links()
}

/// Replace `target`'s state with `source`'s. Parents must already agree.
pub fn overwrite_links(item: ItemId, source: &Links, target: &mut Links) -> Result<(), GraphError> {
    if source.parent() != target.parent() {
        return Err(GraphError::ParentMismatch {
            item,
            source_parent: source.parent(),
            target_parent: target.parent(),
        });
    }
    let mut visitor = OverwriteVisitor::new(target);
    source.accept(item, &mut visitor, VisitMode::IncludeEmpty);
    visitor.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributeKey, AttributeValue, Flag};

    fn id(n: u32) -> ItemId {
        ItemId::new(n)
    }

    fn fully_populated() -> Links {
        let mut links = Links::with_parent(Some(id(1)));
        links.children_mut().push(id(2));
        links.dependencies_mut().push(id(3));
        links.incoming_mut().push(id(4));
        for (n, relation) in Relation::ALL.into_iter().enumerate().skip(4) {
            links.insert_id(relation, id(100 + n as u32));
        }
        for flag in Flag::ALL {
            links.set_flag(flag, true);
        }
        links
    }

    #[test]
    fn test_copy_reproduces_every_field() {
        let source = fully_populated();
        assert_eq!(copy_links(id(0), &source), source);
    }

    #[test]
    fn test_overwrite_clears_fields_missing_from_source() {
        let mut target = fully_populated();
        let source = Links::with_parent(Some(id(1)));

        overwrite_links(id(0), &source, &mut target).unwrap();
        assert_eq!(target, source);
    }

    #[test]
    fn test_overwrite_rejects_parent_change() {
        let mut target = Links::with_parent(Some(id(1)));
        let source = Links::with_parent(Some(id(9)));

        let err = overwrite_links(id(0), &source, &mut target).unwrap_err();
        assert!(matches!(err, GraphError::ParentMismatch { item, .. } if item == id(0)));
    }

    #[test]
    fn test_populated_mode_skips_empty_attributes() {
        let mut links = Links::default();
        links
            .set_attribute(AttributeKey::ReturnType, AttributeValue::Id(id(5)))
            .unwrap();

        let mut seen = Vec::new();
        let mut visitor = from_fn(|_item, field| {
            seen.push(field.relation());
            false
        });
        links.accept(id(0), &mut visitor, VisitMode::Populated);

        assert_eq!(
            seen,
            vec![
                Some(Relation::Parent),
                Some(Relation::Children),
                Some(Relation::Dependencies),
                Some(Relation::Incoming),
                Some(Relation::ReturnType),
            ]
        );
    }

    #[test]
    fn test_recurse_collects_requested_ids() {
        let links = fully_populated();
        let mut visitor = from_fn(|_item, field| {
            matches!(field, Field::Children(_) | Field::Superclass(_))
        });
        let recurse = links.accept(id(0), &mut visitor, VisitMode::Populated);
        assert_eq!(recurse, vec![id(2), id(104)]);
    }
}
