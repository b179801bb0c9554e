use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TraversalError};

/// Node identifier as handed out by the graph store.
pub type NodeId = u64;

/// Relationship identifier. In [`Graph`] this is the insertion index.
pub type RelId = u64;

/// Interned relationship type index (avoids storing duplicate strings per relationship).
pub type RelTypeId = u16;

/// Upper bound on distinct relationship types a [`Graph`] can intern.
pub const MAX_REL_TYPES: usize = u16::MAX as usize;

/// Direction a relationship was traversed, relative to its stored orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Followed from its stored start to its stored end.
    Outgoing,
    /// Followed from its stored end back to its stored start.
    Incoming,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Outgoing => Direction::Incoming,
            Direction::Incoming => Direction::Outgoing,
        }
    }
}

/// Which relationships to follow from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalDirection {
    Outgoing,
    Incoming,
    #[default]
    Both,
}

impl TraversalDirection {
    /// The filter seen from the other end of a relationship.
    pub fn reverse(self) -> Self {
        match self {
            TraversalDirection::Outgoing => TraversalDirection::Incoming,
            TraversalDirection::Incoming => TraversalDirection::Outgoing,
            TraversalDirection::Both => TraversalDirection::Both,
        }
    }

    pub fn matches(self, dir: Direction) -> bool {
        match self {
            TraversalDirection::Outgoing => dir == Direction::Outgoing,
            TraversalDirection::Incoming => dir == Direction::Incoming,
            TraversalDirection::Both => true,
        }
    }
}

impl FromStr for TraversalDirection {
    type Err = TraversalError;

    /// Accepts "outgoing"/"out", "incoming"/"in" and "both" (case-insensitive).
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "outgoing" | "out" => Ok(TraversalDirection::Outgoing),
            "incoming" | "in" => Ok(TraversalDirection::Incoming),
            "both" => Ok(TraversalDirection::Both),
            other => Err(TraversalError::UnsupportedPolicy(format!(
                "direction '{}' (use 'outgoing', 'incoming' or 'both')",
                other
            ))),
        }
    }
}

impl fmt::Display for TraversalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TraversalDirection::Outgoing => "outgoing",
            TraversalDirection::Incoming => "incoming",
            TraversalDirection::Both => "both",
        };
        f.write_str(s)
    }
}

/// A borrowed view of one stored relationship: id, type tag and endpoints
/// in their stored orientation (`start → end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationshipRef {
    pub id: RelId,
    pub rel_type: RelTypeId,
    pub start: NodeId,
    pub end: NodeId,
}

impl RelationshipRef {
    /// The endpoint opposite to `node`. For a self-loop this is `node` itself.
    pub fn other(&self, node: NodeId) -> NodeId {
        if node == self.start {
            self.end
        } else {
            self.start
        }
    }

    /// Direction of this relationship when leaving `node`.
    pub fn direction_from(&self, node: NodeId) -> Direction {
        if node == self.start {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.start == self.end
    }
}

/// Read-only access to a property graph.
///
/// This is the only capability the traversal engine needs. Every method
/// takes `&self`; an implementation that is `Sync` can serve any number of
/// concurrent traversals.
pub trait GraphStore {
    /// `Some(id)` if the node exists.
    fn resolve_node(&self, id: NodeId) -> Option<NodeId>;

    /// Relationships touching `node`, in store enumeration order, optionally
    /// restricted to one type. With [`TraversalDirection::Both`] a self-loop
    /// is reported once.
    fn relationships_of(
        &self,
        node: NodeId,
        direction: TraversalDirection,
        rel_type: Option<RelTypeId>,
    ) -> Vec<RelationshipRef>;

    fn node_label(&self, node: NodeId) -> Option<&str>;

    fn node_property(&self, node: NodeId, key: &str) -> Option<&Value>;

    fn relationship_property(&self, rel: RelId, key: &str) -> Option<&Value>;

    fn rel_type_id(&self, name: &str) -> Option<RelTypeId>;

    fn rel_type_name(&self, id: RelTypeId) -> Option<&str>;

    fn other_endpoint(&self, rel: &RelationshipRef, node: NodeId) -> NodeId {
        rel.other(node)
    }
}

/// Metadata about a node.
#[derive(Debug, Clone, Default)]
pub struct NodeInfo {
    pub label: String,
    /// Application-level key (e.g. a user name) usable for lookups.
    pub key: Option<String>,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone)]
struct RelationshipInfo {
    rel: RelationshipRef,
    properties: Map<String, Value>,
}

/// A node as it appears in a serialized graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// A relationship as it appears in a serialized graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub start: NodeId,
    pub end: NodeId,
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Serialized form of a whole graph (the JSON fixture format).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub relationships: Vec<RelationshipRecord>,
}

/// In-memory graph: adjacency lists + node metadata + relationship type interning.
///
/// Relationships are indexed from both ends: `outgoing[a]` holds the ids of
/// relationships starting at a, `incoming[b]` those ending at b. Both are
/// populated on insert, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    outgoing: HashMap<NodeId, Vec<RelId>>,
    incoming: HashMap<NodeId, Vec<RelId>>,
    nodes: HashMap<NodeId, NodeInfo>,
    relationships: Vec<RelationshipInfo>,
    key_index: HashMap<String, NodeId>,
    rel_types: Vec<String>,
    rel_type_map: HashMap<String, RelTypeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate for a known graph size.
    pub fn with_capacity(node_count: usize, rel_count: usize) -> Self {
        Self {
            outgoing: HashMap::with_capacity(node_count),
            incoming: HashMap::with_capacity(node_count),
            nodes: HashMap::with_capacity(node_count),
            relationships: Vec::with_capacity(rel_count),
            key_index: HashMap::new(),
            rel_types: Vec::new(),
            rel_type_map: HashMap::new(),
        }
    }

    /// Build a graph from its serialized form.
    pub fn from_data(data: GraphData) -> Result<Self> {
        let mut graph = Self::with_capacity(data.nodes.len(), data.relationships.len());
        graph.load(data)?;
        Ok(graph)
    }

    /// Bulk load nodes, then relationships. Relationship endpoints must be
    /// declared in this batch or already present.
    pub fn load(&mut self, data: GraphData) -> Result<()> {
        for node in data.nodes {
            self.add_node_with_properties(node.id, node.label, node.key, node.properties);
        }
        for rel in data.relationships {
            let rt = self.try_intern_rel_type(&rel.rel_type)?;
            self.add_relationship_with_properties(rel.start, rel.end, rt, rel.properties)?;
        }
        Ok(())
    }

    /// Intern a relationship type string, returning its compact ID.
    ///
    /// # Panics
    /// If more than [`MAX_REL_TYPES`] distinct types are interned.
    pub fn intern_rel_type(&mut self, rel_type: &str) -> RelTypeId {
        match self.try_intern_rel_type(rel_type) {
            Ok(id) => id,
            Err(e) => panic!("{}", e),
        }
    }

    /// Fallible [`Graph::intern_rel_type`], used when loading untrusted data.
    pub fn try_intern_rel_type(&mut self, rel_type: &str) -> Result<RelTypeId> {
        if let Some(&id) = self.rel_type_map.get(rel_type) {
            return Ok(id);
        }
        if self.rel_types.len() >= MAX_REL_TYPES {
            return Err(TraversalError::TooManyRelTypes(rel_type.to_string()));
        }
        let id = self.rel_types.len() as RelTypeId;
        self.rel_types.push(rel_type.to_string());
        self.rel_type_map.insert(rel_type.to_string(), id);
        Ok(id)
    }

    /// Register a node with a label and optional application key.
    pub fn add_node(&mut self, id: NodeId, label: String, key: Option<String>) {
        self.add_node_with_properties(id, label, key, Map::new());
    }

    pub fn add_node_with_properties(
        &mut self,
        id: NodeId,
        label: String,
        key: Option<String>,
        properties: Map<String, Value>,
    ) {
        if let Some(ref k) = key {
            self.key_index.insert(k.clone(), id);
        }
        self.nodes.insert(id, NodeInfo { label, key, properties });
    }

    /// Set a single property on an existing node. Returns false if the node is unknown.
    pub fn set_node_property(&mut self, id: NodeId, key: &str, value: Value) -> bool {
        match self.nodes.get_mut(&id) {
            Some(info) => {
                info.properties.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Add a directed relationship `start → end`. Also indexes it from the end node.
    pub fn add_relationship(
        &mut self,
        start: NodeId,
        end: NodeId,
        rel_type: RelTypeId,
    ) -> Result<RelId> {
        self.add_relationship_with_properties(start, end, rel_type, Map::new())
    }

    pub fn add_relationship_with_properties(
        &mut self,
        start: NodeId,
        end: NodeId,
        rel_type: RelTypeId,
        properties: Map<String, Value>,
    ) -> Result<RelId> {
        for endpoint in [start, end] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(TraversalError::UnknownNode(endpoint));
            }
        }

        let id = self.relationships.len() as RelId;
        self.relationships.push(RelationshipInfo {
            rel: RelationshipRef { id, rel_type, start, end },
            properties,
        });
        self.outgoing.entry(start).or_default().push(id);
        self.incoming.entry(end).or_default().push(id);
        Ok(id)
    }

    /// Look up a node by its application-level key.
    pub fn resolve_key(&self, key: &str) -> Option<NodeId> {
        self.key_index.get(key).copied()
    }

    /// Get node metadata.
    pub fn node(&self, id: NodeId) -> Option<&NodeInfo> {
        self.nodes.get(&id)
    }

    pub fn relationship(&self, id: RelId) -> Option<RelationshipRef> {
        self.relationships.get(id as usize).map(|r| r.rel)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn rel_type_count(&self) -> usize {
        self.rel_types.len()
    }

    /// Approximate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        let nodes_mem = self.nodes.len() * (size_of::<NodeId>() + size_of::<NodeInfo>() + 40);
        let rels_mem = self.relationships.len() * size_of::<RelationshipInfo>();
        let adjacency: usize = self
            .outgoing
            .values()
            .chain(self.incoming.values())
            .map(|v| v.len() * size_of::<RelId>())
            .sum();
        let index_mem = self.key_index.len() * 80;

        nodes_mem + rels_mem + adjacency + index_mem
    }

    fn rel_ids<'m>(map: &'m HashMap<NodeId, Vec<RelId>>, node: NodeId) -> &'m [RelId] {
        map.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

impl GraphStore for Graph {
    fn resolve_node(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.contains_key(&id).then_some(id)
    }

    fn relationships_of(
        &self,
        node: NodeId,
        direction: TraversalDirection,
        rel_type: Option<RelTypeId>,
    ) -> Vec<RelationshipRef> {
        let (use_out, use_inc) = match direction {
            TraversalDirection::Outgoing => (true, false),
            TraversalDirection::Incoming => (false, true),
            TraversalDirection::Both => (true, true),
        };

        let out_iter = Self::rel_ids(&self.outgoing, node)
            .iter()
            .filter(move |_| use_out)
            .map(|&id| (self.relationships[id as usize].rel, false));

        // With both directions a self-loop already came through the outgoing list.
        let in_iter = Self::rel_ids(&self.incoming, node)
            .iter()
            .filter(move |_| use_inc)
            .map(|&id| (self.relationships[id as usize].rel, use_out));

        out_iter
            .chain(in_iter)
            .filter(|(rel, skip_loop)| !(*skip_loop && rel.is_self_loop()))
            .filter(|(rel, _)| rel_type.map_or(true, |t| rel.rel_type == t))
            .map(|(rel, _)| rel)
            .collect()
    }

    fn node_label(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|n| n.label.as_str())
    }

    fn node_property(&self, node: NodeId, key: &str) -> Option<&Value> {
        self.nodes.get(&node).and_then(|n| n.properties.get(key))
    }

    fn relationship_property(&self, rel: RelId, key: &str) -> Option<&Value> {
        self.relationships
            .get(rel as usize)
            .and_then(|r| r.properties.get(key))
    }

    fn rel_type_id(&self, name: &str) -> Option<RelTypeId> {
        self.rel_type_map.get(name).copied()
    }

    /// Resolve a RelTypeId back to its string name.
    fn rel_type_name(&self, id: RelTypeId) -> Option<&str> {
        self.rel_types.get(id as usize).map(|s| s.as_str())
    }
}
