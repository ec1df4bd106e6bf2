//! Bidirectional linking.

use super::ItemGraph;
use crate::error::GraphError;
use crate::types::{Cardinality, GraphItem, ItemId, Relation};

fn require<G>(graph: &G, id: ItemId) -> Result<(), GraphError>
where
    G: ItemGraph + ?Sized,
{
    if graph.contains(id) {
        Ok(())
    } else {
        Err(GraphError::ItemNotFound(id))
    }
}

/// Current single target of a one-valued relation.
fn current_target<G>(graph: &G, id: ItemId, relation: Relation) -> Option<ItemId>
where
    G: ItemGraph + ?Sized,
{
    if relation.cardinality() != Cardinality::One {
        return None;
    }
    graph.get(id).and_then(|node| node.links().ids(relation).first().copied())
}

/// Make `parent` the parent of `child`.
fn attach<G>(graph: &mut G, child: ItemId, parent: ItemId) -> Result<(), GraphError>
where
    G: ItemGraph + ?Sized,
{
    let child_node = graph.get(child).ok_or(GraphError::ItemNotFound(child))?;
    let child_type = child_node.item_type();
    match child_node.parent() {
        Some(existing) if existing == parent => return Ok(()),
        Some(existing) => {
            return Err(GraphError::AlreadyParented {
                item: child,
                parent: existing,
            })
        }
        None => {}
    }
    let parent_type = graph.get(parent).ok_or(GraphError::ItemNotFound(parent))?.item_type();
    if !parent_type.can_contain(child_type) {
        return Err(GraphError::InvalidParent {
            parent,
            parent_type,
            child_type,
        });
    }

    if let Some(links) = graph.links_mut(child) {
        links.set_parent(Some(parent));
    }
    if let Some(links) = graph.links_mut(parent) {
        links.insert_id(Relation::Children, child);
    }
    Ok(())
}

pub(crate) fn link<G>(graph: &mut G, source: ItemId, relation: Relation, target: ItemId) -> Result<(), GraphError>
where
    G: ItemGraph + ?Sized,
{
    let counterpart = relation
        .link_counterpart()
        .ok_or(GraphError::NotLinkable(relation))?;
    require(graph, source)?;
    require(graph, target)?;

    match relation {
        Relation::Parent => return attach(graph, source, target),
        Relation::Children => return attach(graph, target, source),
        _ => {}
    }

    // Single-valued sides drop their previous partner first.
    if let Some(previous) = current_target(graph, source, relation) {
        if previous == target {
            return Ok(());
        }
        unlink(graph, source, relation, previous)?;
    }
    if let Some(previous) = current_target(graph, target, counterpart) {
        if previous != source {
            unlink(graph, target, counterpart, previous)?;
        }
    }

    if let Some(links) = graph.links_mut(source) {
        links.insert_id(relation, target);
    }
    if let Some(links) = graph.links_mut(target) {
        links.insert_id(counterpart, source);
    }
    Ok(())
}

pub(crate) fn unlink<G>(graph: &mut G, source: ItemId, relation: Relation, target: ItemId) -> Result<bool, GraphError>
where
    G: ItemGraph + ?Sized,
{
    let node = graph.get(source).ok_or(GraphError::ItemNotFound(source))?;
    if !node.links().contains(relation, target) {
        return Ok(false);
    }
    if let Some(links) = graph.links_mut(source) {
        links.remove_id(relation, target);
    }

    // A mirror entry stays while another relation of `source` maps onto it,
    // e.g. a type used both as a parameter and as a throws type.
    let Some(source_links) = graph.get(source).map(|n| n.links().clone()) else {
        return Ok(true);
    };
    let dropped: Vec<Relation> = relation
        .inverses()
        .iter()
        .copied()
        .filter(|inverse| {
            !inverse
                .inverses()
                .iter()
                .any(|forward| source_links.contains(*forward, target))
        })
        .filter(|inverse| {
            graph
                .get(target)
                .is_some_and(|n| n.links().contains(*inverse, source))
        })
        .collect();
    if !dropped.is_empty() {
        if let Some(links) = graph.links_mut(target) {
            for inverse in dropped {
                links.remove_id(inverse, source);
            }
        }
    }
    Ok(true)
}
