//! Friend-of-friend recommendation: things a user's friends reached over a
//! relationship type that the user has not.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Result, TraversalError};
use crate::evaluator::{self, Evaluation, NodeFilteringEvaluator};
use crate::graph::{GraphStore, NodeId, TraversalDirection};
use crate::path::Path;
use crate::traversal::TraversalDescription;
use crate::uniqueness::Uniqueness;

/// Nodes `node` reaches over one `rel_type` relationship in `direction`,
/// in store order without duplicates. An unknown type yields nothing.
pub fn related_nodes<G: GraphStore + ?Sized>(
    store: &G,
    node: NodeId,
    rel_type: &str,
    direction: TraversalDirection,
) -> Result<Vec<NodeId>> {
    let node = store
        .resolve_node(node)
        .ok_or(TraversalError::InvalidStartNode(node))?;
    let Some(type_id) = store.rel_type_id(rel_type) else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    Ok(store
        .relationships_of(node, direction, Some(type_id))
        .iter()
        .map(|rel| rel.other(node))
        .filter(|n| seen.insert(*n))
        .collect())
}

/// Nodes the user's friends reach over outgoing `seen_type`, minus the ones
/// the user reaches that way, minus the user. Friendship is followed in both
/// directions. Discovery order.
pub fn recommend<G: GraphStore + ?Sized>(
    store: &G,
    user: NodeId,
    friend_type: &str,
    seen_type: &str,
) -> Result<Vec<NodeId>> {
    let own: HashSet<NodeId> =
        related_nodes(store, user, seen_type, TraversalDirection::Outgoing)?
            .into_iter()
            .collect();
    let friends = related_nodes(store, user, friend_type, TraversalDirection::Both)?;

    let mut emitted = HashSet::new();
    let mut out = Vec::new();
    for friend in &friends {
        for item in related_nodes(store, *friend, seen_type, TraversalDirection::Outgoing)? {
            if item != user && !own.contains(&item) && emitted.insert(item) {
                out.push(item);
            }
        }
    }
    debug!(user, friends = friends.len(), recommended = out.len(), "recommendation computed");
    Ok(out)
}

/// The same question as a traversal: friend relationships both ways, then
/// `seen_type` outgoing, stopping at depth 2, skipping the user and what the
/// user already reaches, keeping only paths that end on a `seen_type` hop.
///
/// With node-path uniqueness a node reached through two friends shows up
/// once per friend.
pub fn recommendation_description<G: GraphStore + ?Sized>(
    store: &G,
    user: NodeId,
    friend_type: &str,
    seen_type: &str,
) -> TraversalDescription<'static> {
    let seen_id = store.rel_type_id(seen_type);
    TraversalDescription::new()
        .relationships(friend_type, TraversalDirection::Both)
        .relationships(seen_type, TraversalDirection::Outgoing)
        .uniqueness(Uniqueness::NodePath)
        .evaluator(evaluator::at_depth(2))
        .evaluator(NodeFilteringEvaluator::new(user).excluding_related(
            store,
            seen_type,
            TraversalDirection::Outgoing,
        ))
        .evaluator(move |path: &Path, _: usize| {
            let over_seen = path
                .last_relationship()
                .is_some_and(|rel| Some(rel.rel_type) == seen_id);
            Evaluation::of(over_seen, true)
        })
}
