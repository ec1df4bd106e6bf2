//! The closed set of ID-valued relations between items.
//!
//! [`Relation`] is the one enumeration every integrity-sensitive routine is
//! written against: cascade removal, bidirectional linking, integrity
//! checks and ID remapping all `match` on it exhaustively. Adding a relation
//! kind therefore fails to compile until each of them handles it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ID-valued relation from one item to others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Containing item.
    Parent,
    /// Contained items.
    Children,
    /// Items this item depends on.
    Dependencies,
    /// Items depending on this item.
    Incoming,
    /// Direct superclass of a class.
    Superclass,
    /// Directly implemented or extended interfaces.
    Superinterfaces,
    /// Reverse of both superclass and superinterfaces.
    Subclasses,
    /// Return type of a method.
    ReturnType,
    /// Parameter types of a method, in declaration order.
    ParamTypes,
    /// Declared thrown types of a method, in declaration order.
    ThrowsTypes,
    /// Reverse of return, parameter, throws and field types.
    UsedByMethodsAndFields,
    /// Declared type of a field.
    FieldType,
    /// Element type of an array type.
    ArrayBaseClass,
    /// Array type one dimension above this type.
    UsedByArrayClass,
    /// Enclosing class of an inner class.
    OuterClass,
    /// Inner classes of a class.
    InnerClasses,
}

/// How many targets a relation holds and how they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Zero or one target.
    One,
    /// Ordered list without duplicates.
    UniqueList,
    /// Ordered list, duplicates allowed (positional).
    Sequence,
    /// Ordered set.
    Set,
}

impl Relation {
    /// Every relation, in visiting order.
    pub const ALL: [Relation; 16] = [
        Self::Parent,
        Self::Children,
        Self::Dependencies,
        Self::Incoming,
        Self::Superclass,
        Self::Superinterfaces,
        Self::Subclasses,
        Self::ReturnType,
        Self::ParamTypes,
        Self::ThrowsTypes,
        Self::UsedByMethodsAndFields,
        Self::FieldType,
        Self::ArrayBaseClass,
        Self::UsedByArrayClass,
        Self::OuterClass,
        Self::InnerClasses,
    ];

    /// Relations stored on the source of an edge. Every other relation
    /// only mirrors one of these, so each edge is one forward entry.
    pub const FORWARD: [Relation; 10] = [
        Self::Parent,
        Self::Dependencies,
        Self::Superclass,
        Self::Superinterfaces,
        Self::ReturnType,
        Self::ParamTypes,
        Self::ThrowsTypes,
        Self::FieldType,
        Self::ArrayBaseClass,
        Self::OuterClass,
    ];

    /// Whether this relation is in [`FORWARD`](Self::FORWARD).
    pub fn is_forward(self) -> bool {
        Self::FORWARD.contains(&self)
    }

    /// Storage shape of this relation.
    pub fn cardinality(self) -> Cardinality {
        match self {
            Self::Parent
            | Self::Superclass
            | Self::ReturnType
            | Self::FieldType
            | Self::ArrayBaseClass
            | Self::UsedByArrayClass
            | Self::OuterClass => Cardinality::One,
            Self::Children | Self::Dependencies | Self::Incoming => Cardinality::UniqueList,
            Self::ParamTypes | Self::ThrowsTypes => Cardinality::Sequence,
            Self::Superinterfaces
            | Self::Subclasses
            | Self::UsedByMethodsAndFields
            | Self::InnerClasses => Cardinality::Set,
        }
    }

    /// Relations on the target that mirror this relation.
    ///
    /// If `a` lists `b` under `self`, then `b` lists `a` under at least one
    /// of the returned relations.
    pub fn inverses(self) -> &'static [Relation] {
        match self {
            Self::Parent => &[Self::Children],
            Self::Children => &[Self::Parent],
            Self::Dependencies => &[Self::Incoming],
            Self::Incoming => &[Self::Dependencies],
            Self::Superclass | Self::Superinterfaces => &[Self::Subclasses],
            Self::Subclasses => &[Self::Superclass, Self::Superinterfaces],
            Self::ReturnType | Self::ParamTypes | Self::ThrowsTypes | Self::FieldType => {
                &[Self::UsedByMethodsAndFields]
            }
            Self::UsedByMethodsAndFields => &[
                Self::ReturnType,
                Self::ParamTypes,
                Self::ThrowsTypes,
                Self::FieldType,
            ],
            Self::ArrayBaseClass => &[Self::UsedByArrayClass],
            Self::UsedByArrayClass => &[Self::ArrayBaseClass],
            Self::OuterClass => &[Self::InnerClasses],
            Self::InnerClasses => &[Self::OuterClass],
        }
    }

    /// The inverse to write when linking from this side.
    ///
    /// `None` for aggregate reverse indexes whose forward relation is
    /// ambiguous; those are only populated by linking the forward side.
    pub fn link_counterpart(self) -> Option<Relation> {
        match self.inverses() {
            [single] => Some(*single),
            _ => None,
        }
    }

    /// Camel-case name, matching the attribute vocabulary.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Children => "children",
            Self::Dependencies => "dependencies",
            Self::Incoming => "incoming",
            Self::Superclass => "superclass",
            Self::Superinterfaces => "superinterfaces",
            Self::Subclasses => "subclasses",
            Self::ReturnType => "returnType",
            Self::ParamTypes => "paramTypes",
            Self::ThrowsTypes => "throwsTypes",
            Self::UsedByMethodsAndFields => "usedByMethodsAndFields",
            Self::FieldType => "fieldType",
            Self::ArrayBaseClass => "arrayBaseClass",
            Self::UsedByArrayClass => "usedByArrayClass",
            Self::OuterClass => "outerClass",
            Self::InnerClasses => "innerClasses",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverses_are_symmetric() {
        for relation in Relation::ALL {
            for inverse in relation.inverses() {
                assert!(
                    inverse.inverses().contains(&relation),
                    "{relation} -> {inverse} is not mirrored"
                );
            }
        }
    }

    #[test]
    fn test_all_is_complete_and_unique() {
        let mut seen = std::collections::BTreeSet::new();
        for relation in Relation::ALL {
            assert!(seen.insert(relation));
        }
        assert_eq!(seen.len(), Relation::ALL.len());
    }

    #[test]
    fn test_aggregates_not_linkable() {
        assert_eq!(Relation::Subclasses.link_counterpart(), None);
        assert_eq!(Relation::UsedByMethodsAndFields.link_counterpart(), None);
        assert_eq!(Relation::Incoming.link_counterpart(), Some(Relation::Dependencies));
        assert_eq!(Relation::InnerClasses.link_counterpart(), Some(Relation::OuterClass));
    }

    #[test]
    fn test_forward_relations_cover_every_edge() {
        for relation in Relation::ALL {
            let forward = relation.is_forward();
            let mirrored = relation.inverses().iter().all(|inverse| inverse.is_forward());
            assert!(forward != mirrored, "{relation} must be forward or mirror forward relations");
            if forward {
                assert!(relation.link_counterpart().is_some(), "{relation} is not linkable");
            }
        }
    }
}
