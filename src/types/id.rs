//! Item identifiers and the sequence that issues them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an item within one index.
///
/// Dense and positional: an item with ID `n` lives in slot `n` of its
/// index's backing array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Create an ID from its raw value.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Position of this ID in an index's backing array.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for ItemId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Issues strictly increasing item IDs.
///
/// Cloning a generator lets a derived version continue the sequence of its
/// base, so IDs assigned in a delta line up with the slots a merge will
/// allocate in the base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdGenerator {
    next: u32,
}

impl IdGenerator {
    /// Create a generator starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator whose next ID is `next`.
    pub fn starting_at(next: ItemId) -> Self {
        Self { next: next.raw() }
    }

    /// Issue the next ID.
    pub fn next_id(&mut self) -> ItemId {
        let id = ItemId(self.next);
        self.next += 1;
        id
    }

    /// ID the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> ItemId {
        ItemId(self.next)
    }
}
