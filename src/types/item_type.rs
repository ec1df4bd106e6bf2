//! Item types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of program entity an item represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    /// A project (root of a containment tree).
    Project,
    /// A package.
    Package,
    /// A class, interface, primitive, array or wildcard type.
    Class,
    /// A method or constructor.
    Method,
    /// A field.
    Field,
}

impl ItemType {
    /// All item types.
    pub const ALL: [ItemType; 5] = [
        Self::Project,
        Self::Package,
        Self::Class,
        Self::Method,
        Self::Field,
    ];

    /// Parse item type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "project" => Some(Self::Project),
            "package" => Some(Self::Package),
            "class" => Some(Self::Class),
            "method" => Some(Self::Method),
            "field" => Some(Self::Field),
            _ => None,
        }
    }

    /// Whether an item of this type may be the parent of `child`.
    ///
    /// Methods and fields never have children.
    pub fn can_contain(self, child: ItemType) -> bool {
        matches!(
            (self, child),
            (Self::Project, Self::Package)
                | (Self::Package, Self::Class)
                | (Self::Class, Self::Class)
                | (Self::Class, Self::Method)
                | (Self::Class, Self::Field)
        )
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "PROJECT"),
            Self::Package => write!(f, "PACKAGE"),
            Self::Class => write!(f, "CLASS"),
            Self::Method => write!(f, "METHOD"),
            Self::Field => write!(f, "FIELD"),
        }
    }
}
