use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use graph_walk_core::{Graph, GraphData, NodeId};
use serde_json::Value;
use tracing::info;

/// Read a JSON graph file into memory.
///
/// With `key_property` set, nodes that carry no explicit key are keyed by
/// that property's string value.
pub fn load_graph(path: &Path, key_property: Option<&str>) -> Result<Graph> {
    let start = Instant::now();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph {}", path.display()))?;
    let mut data: GraphData = serde_json::from_str(&content)
        .with_context(|| format!("invalid graph file {}", path.display()))?;

    if let Some(prop) = key_property {
        for node in data.nodes.iter_mut().filter(|n| n.key.is_none()) {
            node.key = node.properties.get(prop).and_then(Value::as_str).map(String::from);
        }
    }

    let graph = Graph::from_data(data)
        .with_context(|| format!("failed to build graph from {}", path.display()))?;
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        relationships = graph.relationship_count(),
        rel_types = graph.rel_type_count(),
        memory_bytes = graph.memory_usage(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "graph loaded"
    );
    Ok(graph)
}

/// Resolve a node reference: an application key first, then a numeric id.
///
/// A number that names no node is returned as is, so the traversal reports
/// it as an invalid start or end node.
pub fn resolve_node(graph: &Graph, reference: &str) -> Result<NodeId> {
    if let Some(id) = graph.resolve_key(reference) {
        return Ok(id);
    }
    match reference.parse::<NodeId>() {
        Ok(id) => Ok(id),
        Err(_) => bail!("no node with key '{}'", reference),
    }
}
