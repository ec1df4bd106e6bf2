//! Cascade removal.
//!
//! The removed item's links name every neighbour it has under every
//! [`Relation`]; each neighbour drops the removed ID from the mirrored
//! relations. Driven by `Relation::ALL`, so no relation kind can be skipped.

use super::ItemGraph;
use crate::error::GraphError;
use crate::types::{GraphItem, ItemId, Links, Relation};

pub(crate) fn remove_item<G>(graph: &mut G, id: ItemId) -> Result<Links, GraphError>
where
    G: ItemGraph + ?Sized,
{
    let links = graph.vacate(id).ok_or(GraphError::ItemNotFound(id))?;

    let mut unlinked = 0usize;
    for relation in Relation::ALL {
        for neighbour in links.ids(relation) {
            let mirrored: Vec<Relation> = match graph.get(neighbour) {
                Some(node) => relation
                    .inverses()
                    .iter()
                    .copied()
                    .filter(|inverse| node.links().contains(*inverse, id))
                    .collect(),
                None => continue,
            };
            if mirrored.is_empty() {
                continue;
            }
            if let Some(neighbour_links) = graph.links_mut(neighbour) {
                for inverse in mirrored {
                    if neighbour_links.remove_id(inverse, id) {
                        unlinked += 1;
                    }
                }
            }
        }
    }

    tracing::debug!(
        version = %graph.version(),
        id = %id,
        unlinked,
        "Removed item"
    );
    Ok(links)
}
