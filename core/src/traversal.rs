use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Result, TraversalError};
use crate::evaluator::{Evaluation, Evaluator, EvaluatorChain};
use crate::expander::{ExpansionOrder, Expander, RelationshipFilter};
use crate::graph::{GraphStore, NodeId, RelationshipRef, TraversalDirection};
use crate::path::Path;
use crate::uniqueness::{Uniqueness, UniquenessTracker};

/// Expansion order of pending branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// LIFO frontier.
    #[default]
    DepthFirst,
    /// FIFO frontier.
    BreadthFirst,
}

impl FromStr for Strategy {
    type Err = TraversalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "dfs" | "depth_first" => Ok(Strategy::DepthFirst),
            "bfs" | "breadth_first" => Ok(Strategy::BreadthFirst),
            other => Err(TraversalError::UnsupportedPolicy(format!(
                "strategy '{}' (use 'depth_first' or 'breadth_first')",
                other
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::DepthFirst => "depth_first",
            Strategy::BreadthFirst => "breadth_first",
        })
    }
}

/// Immutable traversal configuration: relationship filters, strategy,
/// uniqueness and an ordered evaluator chain.
///
/// Built once with the consuming builder methods, then reused for any number
/// of traversals via [`TraversalDescription::traverse`].
///
/// ```
/// use graph_walk_core::{evaluator, Graph, TraversalDescription, TraversalDirection, Uniqueness};
///
/// let mut graph = Graph::new();
/// graph.add_node(0, "User".into(), None);
/// graph.add_node(1, "User".into(), None);
/// let knows = graph.intern_rel_type("KNOWS");
/// graph.add_relationship(0, 1, knows).unwrap();
///
/// let friends = TraversalDescription::new()
///     .relationships("KNOWS", TraversalDirection::Both)
///     .uniqueness(Uniqueness::NodePath)
///     .evaluator(evaluator::at_depth(1));
///
/// let found: Vec<u64> = friends.traverse(&graph, 0).unwrap().nodes().collect();
/// assert_eq!(found, vec![1]);
/// ```
#[derive(Debug, Default)]
pub struct TraversalDescription<'a> {
    filters: Vec<RelationshipFilter>,
    strategy: Strategy,
    uniqueness: Uniqueness,
    order: ExpansionOrder,
    evaluators: EvaluatorChain<'a>,
}

impl<'a> TraversalDescription<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow relationships of `rel_type` in `direction`. Filters accumulate;
    /// a relationship matching any of them is followed.
    pub fn relationships(self, rel_type: &str, direction: TraversalDirection) -> Self {
        self.relationship(RelationshipFilter::new(rel_type, direction))
    }

    pub fn relationship(mut self, filter: RelationshipFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn depth_first(self) -> Self {
        self.strategy(Strategy::DepthFirst)
    }

    pub fn breadth_first(self) -> Self {
        self.strategy(Strategy::BreadthFirst)
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn uniqueness(mut self, uniqueness: Uniqueness) -> Self {
        self.uniqueness = uniqueness;
        self
    }

    pub fn expansion_order(mut self, order: ExpansionOrder) -> Self {
        self.order = order;
        self
    }

    /// Append an evaluator to the chain.
    pub fn evaluator(mut self, evaluator: impl Evaluator + Send + Sync + 'a) -> Self {
        self.evaluators.push(evaluator);
        self
    }

    pub fn filters(&self) -> &[RelationshipFilter] {
        &self.filters
    }

    pub fn get_strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn get_uniqueness(&self) -> Uniqueness {
        self.uniqueness
    }

    pub fn get_expansion_order(&self) -> ExpansionOrder {
        self.order
    }

    /// Same filters with every direction flipped, same strategy, uniqueness
    /// and expansion order. Evaluators are not carried over.
    ///
    /// Used for the end side of a bidirectional search, which walks the
    /// start side's relationships backwards.
    pub fn mirrored(&self) -> TraversalDescription<'a> {
        TraversalDescription {
            filters: self.filters.iter().map(|f| f.reversed()).collect(),
            strategy: self.strategy,
            uniqueness: self.uniqueness,
            order: self.order,
            evaluators: EvaluatorChain::new(),
        }
    }

    /// Start a lazy traversal from `start`.
    ///
    /// Fails with [`TraversalError::InvalidStartNode`] if the store does not
    /// know `start`. No work is done until the traverser is pulled.
    pub fn traverse<'t, G: GraphStore + ?Sized>(
        &'t self,
        store: &'t G,
        start: NodeId,
    ) -> Result<Traverser<'t, G>> {
        let start = store
            .resolve_node(start)
            .ok_or(TraversalError::InvalidStartNode(start))?;

        debug!(
            start,
            strategy = %self.strategy,
            uniqueness = %self.uniqueness,
            filters = self.filters.len(),
            evaluators = self.evaluators.len(),
            "traversal started"
        );

        let mut frontier = VecDeque::new();
        frontier.push_back(Path::single(start));

        Ok(Traverser {
            store,
            evaluators: &self.evaluators,
            expander: Expander::resolve(store, &self.filters, self.order),
            strategy: self.strategy,
            frontier,
            uniqueness: UniquenessTracker::new(self.uniqueness),
            visited: 0,
            rejected: 0,
            finished: false,
        })
    }
}

/// One evaluated branch handed out by [`Traverser::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub path: Path,
    pub evaluation: Evaluation,
}

impl Branch {
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

/// A running traversal: a lazy sequence of included paths.
///
/// Pull-based. Each call to `next` evaluates pending branches until one is
/// included; nothing runs in the background, so dropping the traverser
/// cancels it.
pub struct Traverser<'t, G: ?Sized> {
    store: &'t G,
    evaluators: &'t EvaluatorChain<'t>,
    expander: Expander,
    strategy: Strategy,
    /// Pending branches. Breadth-first pops the front, depth-first the back.
    frontier: VecDeque<Path>,
    uniqueness: UniquenessTracker,
    visited: usize,
    rejected: usize,
    finished: bool,
}

impl<'t, G: GraphStore + ?Sized> Traverser<'t, G> {
    /// Admit and evaluate the next pending branch, expanding it unless pruned.
    ///
    /// Branches rejected by the uniqueness policy are skipped silently.
    /// Returns `None` once the frontier is empty.
    pub fn step(&mut self) -> Option<Branch> {
        loop {
            let next = match self.strategy {
                Strategy::DepthFirst => self.frontier.pop_back(),
                Strategy::BreadthFirst => self.frontier.pop_front(),
            };
            let Some(path) = next else {
                if !self.finished {
                    self.finished = true;
                    debug!(
                        visited = self.visited,
                        rejected = self.rejected,
                        "traversal exhausted"
                    );
                }
                return None;
            };

            if !self.uniqueness.admit(&path) {
                self.rejected += 1;
                trace!(node = path.end_node(), depth = path.len(), "branch not unique");
                continue;
            }
            self.visited += 1;

            let depth = path.len();
            let evaluation = self.evaluators.evaluate(&path, depth);
            trace!(node = path.end_node(), depth, ?evaluation, "branch evaluated");

            if evaluation.continues() {
                self.expand(&path);
            }
            return Some(Branch { path, evaluation });
        }
    }

    fn expand(&mut self, path: &Path) {
        let from = path.end_node();
        let depth = path.len() + 1;
        let candidates: Vec<RelationshipRef> = self
            .expander
            .expand(self.store, from)
            .into_iter()
            .filter(|rel| !self.uniqueness.is_spent(rel, rel.other(from), depth))
            .collect();
        match self.strategy {
            Strategy::BreadthFirst => {
                self.frontier
                    .extend(candidates.into_iter().map(|rel| path.extend(rel)));
            }
            // Reversed so the first sibling in store order is popped first.
            Strategy::DepthFirst => {
                self.frontier
                    .extend(candidates.into_iter().rev().map(|rel| path.extend(rel)));
            }
        }
    }

    /// Terminal nodes of the included paths.
    pub fn nodes(self) -> std::iter::Map<Self, fn(Path) -> NodeId> {
        self.map(end_node as fn(Path) -> NodeId)
    }

    /// Number of pending branches.
    pub fn pending(&self) -> usize {
        self.frontier.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Branches admitted by the uniqueness policy so far.
    pub fn visited(&self) -> usize {
        self.visited
    }
}

fn end_node(path: Path) -> NodeId {
    path.end_node()
}

impl<G: GraphStore + ?Sized> Iterator for Traverser<'_, G> {
    type Item = Path;

    fn next(&mut self) -> Option<Path> {
        loop {
            let branch = self.step()?;
            if branch.evaluation.includes() {
                return Some(branch.path);
            }
        }
    }
}

/// Shortest path from `start` to `target` using BFS (unweighted), following
/// only relationships the expander allows.
///
/// Returns None if no path exists within `max_hops`, or if either node
/// is not in the graph. `start == target` yields the single-node path.
pub fn shortest_path<G: GraphStore + ?Sized>(
    store: &G,
    start: NodeId,
    target: NodeId,
    max_hops: u32,
    expander: &Expander,
) -> Option<Path> {
    store.resolve_node(start)?;
    store.resolve_node(target)?;

    if start == target {
        return Some(Path::single(start));
    }

    if max_hops == 0 {
        return None;
    }

    // BFS with parent tracking: node → (relationship used to reach it)
    let mut visited: HashMap<NodeId, Option<RelationshipRef>> = HashMap::new();
    let mut queue: VecDeque<(NodeId, u32)> = VecDeque::new();

    visited.insert(start, None);
    queue.push_back((start, 0));

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_hops {
            continue;
        }

        for rel in expander.expand(store, current) {
            let next = rel.other(current);
            if visited.contains_key(&next) {
                continue;
            }
            visited.insert(next, Some(rel));

            if next == target {
                return Some(reconstruct_path(&visited, start, target));
            }

            queue.push_back((next, depth + 1));
        }
    }

    None
}

/// Walk parent pointers from `target` back to `start`.
fn reconstruct_path(
    visited: &HashMap<NodeId, Option<RelationshipRef>>,
    start: NodeId,
    target: NodeId,
) -> Path {
    let mut rels = Vec::new();
    let mut current = target;

    while let Some(Some(rel)) = visited.get(&current) {
        rels.push(*rel);
        current = rel.other(current);
    }

    rels.iter()
        .rev()
        .fold(Path::single(start), |path, rel| path.extend(*rel))
}
