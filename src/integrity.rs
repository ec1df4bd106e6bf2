//! Referential integrity checks.
//!
//! Every ID stored under a [`Relation`] must name a live item, and that
//! item must hold the reverse entry under one of the relation's inverses.

use serde::Serialize;
use std::fmt;

use crate::index::ItemGraph;
use crate::types::{GraphItem, ItemId, Relation};

/// Kind of integrity violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The target is not a live item.
    Dangling,
    /// The target is live but lacks the reverse entry.
    MissingReverse,
}

/// One broken edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityViolation {
    /// Item holding the edge.
    pub item: ItemId,
    /// Relation the edge is stored under.
    pub relation: Relation,
    /// Referenced item.
    pub target: ItemId,
    /// What is wrong with it.
    pub kind: ViolationKind,
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::Dangling => {
                write!(f, "{} {} -> {}: dangling", self.item, self.relation, self.target)
            }
            ViolationKind::MissingReverse => {
                write!(f, "{} {} -> {}: no reverse entry", self.item, self.relation, self.target)
            }
        }
    }
}

/// Check every edge of every live item. An empty result means the version
/// is consistent.
pub fn check_integrity<G>(graph: &G) -> Vec<IntegrityViolation>
where
    G: ItemGraph + ?Sized,
{
    let mut violations = Vec::new();
    for node in graph.items() {
        let item = node.id();
        for relation in Relation::ALL {
            for target in node.links().ids(relation) {
                let kind = match graph.get(target) {
                    None => Some(ViolationKind::Dangling),
                    Some(other) => {
                        let mirrored = relation
                            .inverses()
                            .iter()
                            .any(|inverse| other.links().contains(*inverse, item));
                        (!mirrored).then_some(ViolationKind::MissingReverse)
                    }
                };
                if let Some(kind) = kind {
                    violations.push(IntegrityViolation {
                        item,
                        relation,
                        target,
                        kind,
                    });
                }
            }
        }
    }
    violations
}
