//! The fixed attribute vocabulary.
//!
//! Attributes are addressed by [`AttributeKey`] and carry an
//! [`AttributeValue`]. Twelve keys are ID-valued and correspond to a
//! [`Relation`]; the remaining three are unpaired boolean [`Flag`]s.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::id::ItemId;
use super::relation::{Cardinality, Relation};

/// Unpaired boolean attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Flag {
    /// Item comes from a compiled library rather than source.
    Binary,
    /// Item belongs to a third-party dependency.
    ThirdParty,
    /// Package-private members are visible project-wide.
    ProjectPrivateVisible,
}

impl Flag {
    /// All flags, in visiting order.
    pub const ALL: [Flag; 3] = [Self::Binary, Self::ThirdParty, Self::ProjectPrivateVisible];
}

/// Key of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttributeKey {
    /// See [`Relation::Superclass`].
    Superclass,
    /// See [`Relation::Superinterfaces`].
    Superinterfaces,
    /// See [`Relation::Subclasses`].
    Subclasses,
    /// See [`Relation::ReturnType`].
    ReturnType,
    /// See [`Relation::ParamTypes`].
    ParamTypes,
    /// See [`Relation::ThrowsTypes`].
    ThrowsTypes,
    /// See [`Relation::UsedByMethodsAndFields`].
    UsedByMethodsAndFields,
    /// See [`Relation::FieldType`].
    FieldType,
    /// See [`Relation::ArrayBaseClass`].
    ArrayBaseClass,
    /// See [`Relation::UsedByArrayClass`].
    UsedByArrayClass,
    /// See [`Relation::OuterClass`].
    OuterClass,
    /// See [`Relation::InnerClasses`].
    InnerClasses,
    /// See [`Flag::Binary`].
    Binary,
    /// See [`Flag::ThirdParty`].
    ThirdParty,
    /// See [`Flag::ProjectPrivateVisible`].
    ProjectPrivateVisible,
}

/// Shape of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Single ID.
    Id,
    /// Ordered list of IDs.
    Ids,
    /// Set of IDs.
    IdSet,
    /// Boolean.
    Flag,
}

impl ValueKind {
    /// Human-readable description, used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Id => "a single item ID",
            Self::Ids => "a list of item IDs",
            Self::IdSet => "a set of item IDs",
            Self::Flag => "a boolean",
        }
    }
}

impl AttributeKey {
    /// Every key, in visiting order.
    pub const ALL: [AttributeKey; 15] = [
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
        Self::Binary,
        Self::ThirdParty,
        Self::ProjectPrivateVisible,
    ];

    /// Relation this key stores, if ID-valued.
    pub fn relation(self) -> Option<Relation> {
        match self {
            Self::Superclass => Some(Relation::Superclass),
            Self::Superinterfaces => Some(Relation::Superinterfaces),
            Self::Subclasses => Some(Relation::Subclasses),
            Self::ReturnType => Some(Relation::ReturnType),
            Self::ParamTypes => Some(Relation::ParamTypes),
            Self::ThrowsTypes => Some(Relation::ThrowsTypes),
            Self::UsedByMethodsAndFields => Some(Relation::UsedByMethodsAndFields),
            Self::FieldType => Some(Relation::FieldType),
            Self::ArrayBaseClass => Some(Relation::ArrayBaseClass),
            Self::UsedByArrayClass => Some(Relation::UsedByArrayClass),
            Self::OuterClass => Some(Relation::OuterClass),
            Self::InnerClasses => Some(Relation::InnerClasses),
            Self::Binary | Self::ThirdParty | Self::ProjectPrivateVisible => None,
        }
    }

    /// Flag this key stores, if boolean.
    pub fn flag(self) -> Option<Flag> {
        match self {
            Self::Binary => Some(Flag::Binary),
            Self::ThirdParty => Some(Flag::ThirdParty),
            Self::ProjectPrivateVisible => Some(Flag::ProjectPrivateVisible),
            _ => None,
        }
    }

    /// Shape of the values this key accepts.
    pub fn value_kind(self) -> ValueKind {
        match self.relation().map(Relation::cardinality) {
            Some(Cardinality::One) => ValueKind::Id,
            Some(Cardinality::UniqueList | Cardinality::Sequence) => ValueKind::Ids,
            Some(Cardinality::Set) => ValueKind::IdSet,
            None => ValueKind::Flag,
        }
    }

    /// Camel-case attribute name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::ThirdParty => "thirdParty",
            Self::ProjectPrivateVisible => "projectPrivateVisible",
            other => other.relation().map_or("", Relation::as_str),
        }
    }

    /// Parse an attribute key from its camel-case name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == s)
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Single item reference.
    Id(ItemId),
    /// Ordered item references.
    Ids(Vec<ItemId>),
    /// Unordered item references.
    IdSet(BTreeSet<ItemId>),
    /// Boolean flag.
    Flag(bool),
}

impl AttributeValue {
    /// Shape of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Id(_) => ValueKind::Id,
            Self::Ids(_) => ValueKind::Ids,
            Self::IdSet(_) => ValueKind::IdSet,
            Self::Flag(_) => ValueKind::Flag,
        }
    }
}
