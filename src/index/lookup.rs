//! Name, ancestor-chain and signature resolution.
//!
//! Parents are compared by name chain rather than ID: the same logical
//! parent carries different IDs in different versions.

use super::ItemGraph;
use crate::types::{GraphItem, ItemId, ItemType};

/// How parameter types are compared when resolving a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParamMatch {
    /// Same IDs in the same order.
    Exact,
    /// Wildcard and array-aware comparison.
    Structural,
}

pub(crate) fn same_name<G>(graph: &G, item_type: ItemType, name: &str) -> Vec<ItemId>
where
    G: ItemGraph + ?Sized,
{
    let mut ids: Vec<ItemId> = graph
        .name_candidates(item_type, name)
        .into_iter()
        .filter(|id| {
            graph
                .get(*id)
                .is_some_and(|node| node.item_type() == item_type && node.name() == name)
        })
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Whether two parent chains, possibly in different versions, carry the
/// same names all the way up.
pub(crate) fn ancestors_equal<A, B>(a: &A, a_id: Option<ItemId>, b: &B, b_id: Option<ItemId>) -> bool
where
    A: ItemGraph + ?Sized,
    B: ItemGraph + ?Sized,
{
    let (mut x, mut y) = (a_id, b_id);
    let limit = a.slot_count().max(b.slot_count());
    for _ in 0..=limit {
        match (x, y) {
            (None, None) => return true,
            (Some(i), Some(j)) => {
                let (Some(ni), Some(nj)) = (a.get(i), b.get(j)) else {
                    return false;
                };
                if ni.name() != nj.name() {
                    return false;
                }
                x = ni.parent();
                y = nj.parent();
            }
            _ => return false,
        }
    }
    false
}

pub(crate) fn find_item<G>(graph: &G, parent: Option<ItemId>, name: &str, item_type: ItemType) -> Option<ItemId>
where
    G: ItemGraph + ?Sized,
{
    same_name(graph, item_type, name).into_iter().find(|id| {
        graph.get(*id).is_some_and(|node| {
            node.parent() == parent || ancestors_equal(graph, node.parent(), graph, parent)
        })
    })
}

pub(crate) fn find_method<G>(
    graph: &G,
    parent: Option<ItemId>,
    name: &str,
    param_types: &[ItemId],
    mode: ParamMatch,
) -> Option<ItemId>
where
    G: ItemGraph + ?Sized,
{
    same_name(graph, ItemType::Method, name).into_iter().find(|id| {
        let Some(node) = graph.get(*id) else { return false };
        if node.parent() != parent && !ancestors_equal(graph, node.parent(), graph, parent) {
            return false;
        }
        let stored = node.links().param_types();
        stored.len() == param_types.len()
            && stored.iter().zip(param_types).all(|(a, b)| match mode {
                ParamMatch::Exact => a == b,
                ParamMatch::Structural => types_match(graph, *a, *b),
            })
    })
}

pub(crate) fn array_dimensions<G>(graph: &G, id: ItemId) -> usize
where
    G: ItemGraph + ?Sized,
{
    let mut dims = 0;
    let mut current = id;
    while let Some(element) = graph.get(current).and_then(|n| n.links().array_base_class()) {
        dims += 1;
        current = element;
        if dims > graph.slot_count() {
            break;
        }
    }
    dims
}

/// Innermost element type of an array (the type itself for non-arrays).
fn element_type<G>(graph: &G, id: ItemId) -> ItemId
where
    G: ItemGraph + ?Sized,
{
    let mut current = id;
    for _ in 0..=graph.slot_count() {
        match graph.get(current).and_then(|n| n.links().array_base_class()) {
            Some(element) => current = element,
            None => break,
        }
    }
    current
}

fn is_wildcard<G>(graph: &G, id: ItemId) -> bool
where
    G: ItemGraph + ?Sized,
{
    graph.get(id).is_some_and(GraphItem::is_wildcard)
}

pub(crate) fn types_match<G>(graph: &G, a: ItemId, b: ItemId) -> bool
where
    G: ItemGraph + ?Sized,
{
    if a == b || is_wildcard(graph, a) || is_wildcard(graph, b) {
        return true;
    }
    let dims = array_dimensions(graph, a);
    if dims == 0 || dims != array_dimensions(graph, b) {
        return false;
    }
    let (ea, eb) = (element_type(graph, a), element_type(graph, b));
    ea == eb || is_wildcard(graph, ea) || is_wildcard(graph, eb)
}

/// Same name and ancestor chain across versions.
fn same_identity<A, B>(a: &A, a_id: ItemId, b: &B, b_id: ItemId) -> bool
where
    A: ItemGraph + ?Sized,
    B: ItemGraph + ?Sized,
{
    match (a.get(a_id), b.get(b_id)) {
        (Some(na), Some(nb)) => {
            na.item_type() == nb.item_type()
                && na.name() == nb.name()
                && ancestors_equal(a, na.parent(), b, nb.parent())
        }
        _ => false,
    }
}

pub(crate) fn find_equivalent<G, O>(graph: &G, other: &O, other_id: ItemId) -> Option<ItemId>
where
    G: ItemGraph + ?Sized,
    O: ItemGraph + ?Sized,
{
    let node = other.get(other_id)?;
    let other_params = node.links().param_types();
    same_name(graph, node.item_type(), node.name()).into_iter().find(|id| {
        let Some(candidate) = graph.get(*id) else { return false };
        if !ancestors_equal(graph, candidate.parent(), other, node.parent()) {
            return false;
        }
        if node.item_type() != ItemType::Method {
            return true;
        }
        let params = candidate.links().param_types();
        params.len() == other_params.len()
            && params
                .iter()
                .zip(other_params)
                .all(|(p, q)| same_identity(graph, *p, other, *q))
    })
}
