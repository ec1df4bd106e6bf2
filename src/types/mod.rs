//! Core types for the graph kernel.

pub mod id;
pub mod item_type;
pub mod relation;
pub mod attribute;
pub mod links;
pub mod item;

pub use id::{ItemId, IdGenerator};
pub use item_type::ItemType;
pub use relation::{Relation, Cardinality};
pub use attribute::{AttributeKey, AttributeValue, Flag, ValueKind};
pub use links::Links;
pub use item::{Item, GraphItem, WILDCARD_TYPE_NAME};
