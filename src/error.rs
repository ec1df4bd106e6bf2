//! Error type shared by every graph operation.
//!
//! Every variant is a broken programming contract: the caller handed the
//! graph something that would violate one of its invariants. Resolution
//! misses are not errors; lookups return `Option` instead.

use crate::types::{AttributeKey, ItemId, ItemType, Relation};

/// Error type for graph operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Item names must be non-empty.
    #[error("Item name must not be empty")]
    EmptyName,

    /// Referenced item does not exist in this version.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// The generated ID does not match the next array slot.
    #[error("ID out of order: expected {expected}, got {got}")]
    IdOutOfOrder {
        /// Slot the item would land in.
        expected: ItemId,
        /// ID the generator produced.
        got: ItemId,
    },

    /// The parent type cannot contain the child type.
    #[error("{parent_type} {parent} cannot contain a {child_type}")]
    InvalidParent {
        /// Parent item.
        parent: ItemId,
        /// Type of the parent item.
        parent_type: ItemType,
        /// Type of the rejected child.
        child_type: ItemType,
    },

    /// The item already has a different parent.
    #[error("Item {item} already has parent {parent}")]
    AlreadyParented {
        /// Item being re-parented.
        item: ItemId,
        /// Its current parent.
        parent: ItemId,
    },

    /// A base item's type may only be set once.
    #[error("Type of item {0} was already set")]
    TypeAlreadySet(ItemId),

    /// Field is read-through on delta versions and cannot be changed there.
    #[error("Cannot change {field} of item {item} in a delta version")]
    DeltaImmutable {
        /// Item targeted by the change.
        item: ItemId,
        /// Name of the immutable field.
        field: &'static str,
    },

    /// Item has no base item to revert to.
    #[error("Item {0} was created in this delta and has no base item")]
    NotAnOverlay(ItemId),

    /// Overwrite requires both items to already share a parent.
    #[error("Parent mismatch on {item}: source has {source_parent:?}, target has {target_parent:?}")]
    ParentMismatch {
        /// Item being overwritten.
        item: ItemId,
        /// Parent recorded in the source state.
        source_parent: Option<ItemId>,
        /// Parent recorded on the target item.
        target_parent: Option<ItemId>,
    },

    /// Replaying an addition produced a different ID than the delta assigned.
    #[error("Merge produced {got} for an item the delta created as {expected}")]
    MergeIdMismatch {
        /// ID assigned in the delta.
        expected: ItemId,
        /// ID assigned in the base during replay.
        got: ItemId,
    },

    /// Changes were recorded against a different base version.
    #[error("Changes were recorded against base version {expected}, not {found}")]
    BaseVersionMismatch {
        /// Version the delta was built over.
        expected: String,
        /// Version of the index receiving the merge.
        found: String,
    },

    /// The base index changed after the delta was built.
    #[error("Base has moved on: delta was built at revision {expected}, base is at {found}")]
    StaleDelta {
        /// Base revision when the delta was built.
        expected: u64,
        /// Base revision now.
        found: u64,
    },

    /// Attribute value kind does not match the key.
    #[error("Attribute {key} expects {expected}")]
    AttributeKindMismatch {
        /// Attribute being set.
        key: AttributeKey,
        /// Expected value kind.
        expected: &'static str,
    },

    /// Relation is a derived reverse index and cannot be linked directly.
    #[error("Relation {0} cannot be linked from this side")]
    NotLinkable(Relation),

    /// Name is not a primitive type.
    #[error("Unknown primitive type: {0}")]
    UnknownPrimitive(String),

    /// Configuration value out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Canonical serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GraphError {
    /// Create a serialization error from any error type.
    pub fn from_serde<E: std::error::Error>(e: E) -> Self {
        Self::Serialization(e.to_string())
    }
}
