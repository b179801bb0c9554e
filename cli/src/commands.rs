//! The work behind each subcommand. Every command returns a [`Report`] that
//! the binary renders as formatted paths or JSON.

use anyhow::{bail, Result};
use graph_walk_core::recommend::{recommend as recommend_nodes, recommendation_description, related_nodes};
use graph_walk_core::{
    evaluator, BidirectionalTraversal, Graph, GraphStore, NodeId, Path, PathFormatter,
    ProximityEvaluator, RelationshipFilter, SideSelector, Strategy, TraversalDescription,
    TraversalDirection, TraversalError, Uniqueness,
};
use tracing::info;

use crate::config::{BidirectionalConfig, TraversalConfig};

pub const FRIEND_TYPE: &str = "IS_FRIEND_OF";
pub const SEEN_TYPE: &str = "HAS_SEEN";

/// Result of a command, before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Nodes(Vec<NodeId>),
    Paths(Vec<Path>),
}

impl Report {
    pub fn len(&self) -> usize {
        match self {
            Report::Nodes(nodes) => nodes.len(),
            Report::Paths(paths) => paths.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One line per node or path, or a JSON array (of node ids, or of node
    /// id arrays for paths).
    pub fn render(&self, graph: &Graph, formatter: &PathFormatter, json: bool) -> Result<String> {
        if json {
            let out = match self {
                Report::Nodes(nodes) => serde_json::to_string(nodes)?,
                Report::Paths(paths) => {
                    let ids: Vec<Vec<NodeId>> = paths.iter().map(|p| p.nodes().collect()).collect();
                    serde_json::to_string(&ids)?
                }
            };
            return Ok(out);
        }
        let text = match self {
            Report::Nodes(nodes) => {
                let singles: Vec<Path> = nodes.iter().map(|&n| Path::single(n)).collect();
                formatter.format_all(graph, &singles)?
            }
            Report::Paths(paths) => formatter.format_all(graph, paths)?,
        };
        Ok(text)
    }
}

/// Settings for `walk`: config values with command-line overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkOptions {
    pub strategy: Strategy,
    pub uniqueness: Uniqueness,
    pub rels: Vec<RelationshipFilter>,
    pub max_depth: Option<usize>,
}

impl From<&TraversalConfig> for WalkOptions {
    fn from(cfg: &TraversalConfig) -> Self {
        Self {
            strategy: cfg.strategy,
            uniqueness: cfg.uniqueness,
            rels: Vec::new(),
            max_depth: cfg.max_depth,
        }
    }
}

/// Settings for `connect`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectOptions {
    pub strategy: Strategy,
    pub rels: Vec<RelationshipFilter>,
    pub max_steps: usize,
    pub selector: SideSelector,
}

impl ConnectOptions {
    pub fn new(traversal: &TraversalConfig, bidirectional: &BidirectionalConfig) -> Self {
        Self {
            strategy: traversal.strategy,
            rels: Vec::new(),
            max_steps: bidirectional.max_steps,
            selector: bidirectional.selector,
        }
    }
}

/// Nodes `user` reaches over outgoing `seen_type`.
pub fn seen(graph: &Graph, user: NodeId, seen_type: &str) -> Result<Report> {
    let nodes = related_nodes(graph, user, seen_type, TraversalDirection::Outgoing)?;
    Ok(Report::Nodes(nodes))
}

/// What the user's friends have seen and the user has not.
pub fn recommend(graph: &Graph, user: NodeId, friend_type: &str, seen_type: &str) -> Result<Report> {
    Ok(Report::Nodes(recommend_nodes(graph, user, friend_type, seen_type)?))
}

/// The recommendation as a depth-2 traversal, one path per friend.
pub fn friends_seen(
    graph: &Graph,
    user: NodeId,
    friend_type: &str,
    seen_type: &str,
) -> Result<Report> {
    let desc = recommendation_description(graph, user, friend_type, seen_type);
    let paths: Vec<Path> = desc.traverse(graph, user)?.collect();
    Ok(Report::Paths(paths))
}

pub fn walk(graph: &Graph, start: NodeId, opts: &WalkOptions) -> Result<Report> {
    if opts.uniqueness == Uniqueness::None && opts.max_depth.is_none() {
        bail!("uniqueness 'none' can walk forever on a cycle; set a max depth");
    }

    let mut desc = opts
        .rels
        .iter()
        .cloned()
        .fold(TraversalDescription::new(), |d, f| d.relationship(f))
        .strategy(opts.strategy)
        .uniqueness(opts.uniqueness);
    if let Some(depth) = opts.max_depth {
        desc = desc.evaluator(evaluator::to_depth(depth));
    }

    let paths: Vec<Path> = desc.traverse(graph, start)?.collect();
    info!(start, found = paths.len(), "walk finished");
    Ok(Report::Paths(paths))
}

/// Bidirectional search between two nodes. Both sides use node-path
/// uniqueness; the end side follows `rels` in reverse.
pub fn connect(graph: &Graph, from: NodeId, to: NodeId, opts: &ConnectOptions) -> Result<Report> {
    let side = opts
        .rels
        .iter()
        .cloned()
        .fold(TraversalDescription::new(), |d, f| d.relationship(f))
        .strategy(opts.strategy)
        .uniqueness(Uniqueness::NodePath);
    let search = BidirectionalTraversal::new()
        .mirrored_sides(side)
        .side_selector(opts.selector, opts.max_steps);

    let mut traverser = search.traverse(graph, from, to)?;
    let paths: Vec<Path> = traverser.by_ref().collect();
    info!(from, to, found = paths.len(), steps = traverser.steps(), "connect finished");
    Ok(Report::Paths(paths))
}

/// Paths from `from` to nodes within `hops` relationships of `to`.
pub fn near(
    graph: &Graph,
    from: NodeId,
    to: NodeId,
    rels: &[RelationshipFilter],
    hops: u32,
) -> Result<Report> {
    let to = graph.resolve_node(to).ok_or(TraversalError::InvalidEndNode(to))?;
    let desc = rels
        .iter()
        .cloned()
        .fold(TraversalDescription::new(), |d, f| d.relationship(f))
        .breadth_first()
        .evaluator(ProximityEvaluator::new(graph, to, hops, rels));
    let paths: Vec<Path> = desc.traverse(graph, from)?.collect();
    Ok(Report::Paths(paths))
}
