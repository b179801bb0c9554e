use std::collections::HashSet;
use std::fmt;

use crate::expander::{ExpansionOrder, Expander, RelationshipFilter};
use crate::graph::{GraphStore, NodeId, TraversalDirection};
use crate::path::Path;
use crate::traversal::shortest_path;

/// Verdict for one branch: whether its path is part of the output
/// (include/exclude) and whether it is expanded further (continue/prune).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Evaluation {
    IncludeAndContinue,
    IncludeAndPrune,
    ExcludeAndContinue,
    ExcludeAndPrune,
}

impl Evaluation {
    pub fn of(includes: bool, continues: bool) -> Self {
        match (includes, continues) {
            (true, true) => Evaluation::IncludeAndContinue,
            (true, false) => Evaluation::IncludeAndPrune,
            (false, true) => Evaluation::ExcludeAndContinue,
            (false, false) => Evaluation::ExcludeAndPrune,
        }
    }

    pub fn includes(self) -> bool {
        matches!(self, Evaluation::IncludeAndContinue | Evaluation::IncludeAndPrune)
    }

    pub fn continues(self) -> bool {
        matches!(self, Evaluation::IncludeAndContinue | Evaluation::ExcludeAndContinue)
    }

    /// Include only if both include; continue only if both continue.
    pub fn and(self, other: Evaluation) -> Self {
        Self::of(
            self.includes() && other.includes(),
            self.continues() && other.continues(),
        )
    }
}

/// Decides inclusion and continuation for a traversal candidate.
///
/// `depth` is the path length. Any `Fn(&Path, usize) -> Evaluation` is an
/// evaluator, which covers one-off closures.
pub trait Evaluator {
    fn evaluate(&self, path: &Path, depth: usize) -> Evaluation;
}

impl<F> Evaluator for F
where
    F: Fn(&Path, usize) -> Evaluation,
{
    fn evaluate(&self, path: &Path, depth: usize) -> Evaluation {
        self(path, depth)
    }
}

pub type BoxedEvaluator<'a> = Box<dyn Evaluator + Send + Sync + 'a>;

/// Ordered list of evaluators combined with AND on both include and continue.
#[derive(Default)]
pub struct EvaluatorChain<'a> {
    evaluators: Vec<BoxedEvaluator<'a>>,
}

impl<'a> EvaluatorChain<'a> {
    pub fn new() -> Self {
        Self {
            evaluators: Vec::new(),
        }
    }

    pub fn push(&mut self, evaluator: impl Evaluator + Send + Sync + 'a) {
        self.evaluators.push(Box::new(evaluator));
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    /// Runs evaluators in registration order. Stops early once the combined
    /// verdict is exclude-and-prune, since nothing later can undo it.
    pub fn evaluate(&self, path: &Path, depth: usize) -> Evaluation {
        let mut includes = true;
        let mut continues = true;
        for evaluator in &self.evaluators {
            let verdict = evaluator.evaluate(path, depth);
            includes &= verdict.includes();
            continues &= verdict.continues();
            if !includes && !continues {
                break;
            }
        }
        Evaluation::of(includes, continues)
    }
}

impl fmt::Debug for EvaluatorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluatorChain")
            .field("len", &self.evaluators.len())
            .finish()
    }
}

/// Built-in depth-based evaluators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthEvaluator {
    /// Include everything, never prune.
    All,
    /// Include only paths of exactly this length; prune there.
    AtDepth(usize),
    /// Include paths up to this length; prune at it.
    ToDepth(usize),
    /// Exclude paths shorter than this length.
    FromDepth(usize),
    /// Include lengths in `min..=max`; prune at `max`.
    IncludingDepths { min: usize, max: usize },
    /// Exclude the zero-length start path only.
    ExcludeStartPosition,
}

impl Evaluator for DepthEvaluator {
    fn evaluate(&self, _path: &Path, depth: usize) -> Evaluation {
        match *self {
            DepthEvaluator::All => Evaluation::IncludeAndContinue,
            DepthEvaluator::AtDepth(d) => {
                if depth < d {
                    Evaluation::ExcludeAndContinue
                } else if depth == d {
                    Evaluation::IncludeAndPrune
                } else {
                    Evaluation::ExcludeAndPrune
                }
            }
            DepthEvaluator::ToDepth(d) => {
                if depth < d {
                    Evaluation::IncludeAndContinue
                } else {
                    Evaluation::of(depth == d, false)
                }
            }
            DepthEvaluator::FromDepth(d) => Evaluation::of(depth >= d, true),
            DepthEvaluator::IncludingDepths { min, max } => {
                Evaluation::of(depth >= min && depth <= max, depth < max)
            }
            DepthEvaluator::ExcludeStartPosition => Evaluation::of(depth > 0, true),
        }
    }
}

pub fn all() -> DepthEvaluator {
    DepthEvaluator::All
}

pub fn at_depth(depth: usize) -> DepthEvaluator {
    DepthEvaluator::AtDepth(depth)
}

pub fn to_depth(depth: usize) -> DepthEvaluator {
    DepthEvaluator::ToDepth(depth)
}

pub fn from_depth(depth: usize) -> DepthEvaluator {
    DepthEvaluator::FromDepth(depth)
}

pub fn including_depths(min: usize, max: usize) -> DepthEvaluator {
    DepthEvaluator::IncludingDepths { min, max }
}

pub fn exclude_start_position() -> DepthEvaluator {
    DepthEvaluator::ExcludeStartPosition
}

/// Keeps a source node, and optionally everything it already reaches over
/// one relationship type, out of the results. Traversal continues past
/// excluded nodes.
#[derive(Debug, Clone)]
pub struct NodeFilteringEvaluator {
    source: NodeId,
    excluded: HashSet<NodeId>,
}

impl NodeFilteringEvaluator {
    pub fn new(source: NodeId) -> Self {
        Self {
            source,
            excluded: HashSet::new(),
        }
    }

    /// Also exclude nodes the source reaches over `rel_type` in `direction`
    /// (e.g. movies a user has already seen). The set is read once, here.
    pub fn excluding_related<G: GraphStore + ?Sized>(
        mut self,
        store: &G,
        rel_type: &str,
        direction: TraversalDirection,
    ) -> Self {
        if let Some(t) = store.rel_type_id(rel_type) {
            self.excluded.extend(
                store
                    .relationships_of(self.source, direction, Some(t))
                    .iter()
                    .map(|r| r.other(self.source)),
            );
        }
        self
    }
}

impl Evaluator for NodeFilteringEvaluator {
    fn evaluate(&self, path: &Path, _depth: usize) -> Evaluation {
        let node = path.end_node();
        if node == self.source || self.excluded.contains(&node) {
            Evaluation::ExcludeAndContinue
        } else {
            Evaluation::IncludeAndContinue
        }
    }
}

/// Includes nodes that can reach `target` within `max_hops` relationships.
///
/// The target itself is excluded and pruned: in a plain traversal it is
/// skipped, in a bidirectional search it only shows up as a collision.
pub struct ProximityEvaluator<'g, G: ?Sized> {
    store: &'g G,
    target: NodeId,
    max_hops: u32,
    expander: Expander,
}

impl<'g, G: GraphStore + ?Sized> ProximityEvaluator<'g, G> {
    pub fn new(
        store: &'g G,
        target: NodeId,
        max_hops: u32,
        filters: &[RelationshipFilter],
    ) -> Self {
        Self {
            store,
            target,
            max_hops,
            expander: Expander::resolve(store, filters, ExpansionOrder::Store),
        }
    }
}

impl<G: GraphStore + ?Sized> Evaluator for ProximityEvaluator<'_, G> {
    fn evaluate(&self, path: &Path, _depth: usize) -> Evaluation {
        let node = path.end_node();
        if node == self.target {
            return Evaluation::ExcludeAndPrune;
        }
        match shortest_path(self.store, node, self.target, self.max_hops, &self.expander) {
            Some(_) => Evaluation::IncludeAndContinue,
            None => Evaluation::ExcludeAndContinue,
        }
    }
}
