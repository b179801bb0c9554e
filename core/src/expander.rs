use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TraversalError};
use crate::graph::{GraphStore, NodeId, RelTypeId, RelationshipRef, TraversalDirection};

/// A relationship type paired with the direction it may be followed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipFilter {
    pub rel_type: String,
    #[serde(default)]
    pub direction: TraversalDirection,
}

impl RelationshipFilter {
    pub fn new(rel_type: impl Into<String>, direction: TraversalDirection) -> Self {
        Self {
            rel_type: rel_type.into(),
            direction,
        }
    }

    /// The filter as seen from the other end of the relationship.
    pub fn reversed(&self) -> Self {
        Self {
            rel_type: self.rel_type.clone(),
            direction: self.direction.reverse(),
        }
    }
}

impl FromStr for RelationshipFilter {
    type Err = TraversalError;

    /// Parses `TYPE` (both directions) or `TYPE:out|in|both`.
    fn from_str(s: &str) -> Result<Self> {
        let (rel_type, direction) = match s.split_once(':') {
            Some((t, d)) => (t, d.parse()?),
            None => (s, TraversalDirection::Both),
        };
        if rel_type.is_empty() {
            return Err(TraversalError::UnsupportedPolicy(format!(
                "relationship filter '{}' has no type",
                s
            )));
        }
        Ok(Self::new(rel_type, direction))
    }
}

impl fmt::Display for RelationshipFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.rel_type, self.direction)
    }
}

/// Order in which a node's candidate relationships are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionOrder {
    /// Store enumeration order, keeping relationships that match any filter.
    #[default]
    Store,
    /// All matches of the first filter, then the second, and so on.
    FilterOrder,
}

/// Relationship filters resolved against one store's interned type ids.
///
/// An empty filter list means "every relationship, both directions". A
/// filter naming a type the store has never seen matches nothing.
#[derive(Debug, Clone, Default)]
pub struct Expander {
    filters: Option<Vec<(RelTypeId, TraversalDirection)>>,
    order: ExpansionOrder,
}

impl Expander {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn resolve<G: GraphStore + ?Sized>(
        store: &G,
        filters: &[RelationshipFilter],
        order: ExpansionOrder,
    ) -> Self {
        if filters.is_empty() {
            return Self { filters: None, order };
        }
        let resolved = filters
            .iter()
            .filter_map(|f| store.rel_type_id(&f.rel_type).map(|id| (id, f.direction)))
            .collect();
        Self {
            filters: Some(resolved),
            order,
        }
    }

    /// Candidate relationships leaving `node`.
    pub fn expand<G: GraphStore + ?Sized>(&self, store: &G, node: NodeId) -> Vec<RelationshipRef> {
        let Some(filters) = &self.filters else {
            return store.relationships_of(node, TraversalDirection::Both, None);
        };

        match self.order {
            ExpansionOrder::Store => store
                .relationships_of(node, TraversalDirection::Both, None)
                .into_iter()
                .filter(|rel| {
                    filters.iter().any(|&(t, d)| {
                        rel.rel_type == t && (rel.is_self_loop() || d.matches(rel.direction_from(node)))
                    })
                })
                .collect(),
            ExpansionOrder::FilterOrder => {
                let mut seen = HashSet::new();
                filters
                    .iter()
                    .flat_map(|&(t, d)| store.relationships_of(node, d, Some(t)))
                    .filter(|rel| seen.insert(rel.id))
                    .collect()
            }
        }
    }
}
