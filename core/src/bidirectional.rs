//! Bidirectional search: two traversals, one from each end, run in lockstep
//! until their visited nodes meet.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TraversalError};
use crate::evaluator::{Evaluator, EvaluatorChain};
use crate::graph::{GraphStore, NodeId};
use crate::path::Path;
use crate::traversal::{TraversalDescription, Traverser};

/// Step budget used when none is configured.
pub const DEFAULT_MAX_STEPS: usize = 100;

/// Which side advances on the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideSelector {
    /// Start side, end side, start side, ...
    #[default]
    Alternating,
    /// The side with fewer pending branches. Ties go to the start side.
    Level,
}

impl FromStr for SideSelector {
    type Err = TraversalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "alternating" => Ok(SideSelector::Alternating),
            "level" => Ok(SideSelector::Level),
            other => Err(TraversalError::UnsupportedPolicy(format!(
                "side selector '{}' (use 'alternating' or 'level')",
                other
            ))),
        }
    }
}

impl fmt::Display for SideSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SideSelector::Alternating => "alternating",
            SideSelector::Level => "level",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Start,
    End,
}

impl Side {
    fn other(self) -> Self {
        match self {
            Side::Start => Side::End,
            Side::End => Side::Start,
        }
    }
}

/// Configuration for a bidirectional search.
///
/// The start side walks away from the start node, the end side away from
/// the end node. A path reported by the search is a start-side path joined
/// with an end-side path read backwards.
#[derive(Debug)]
pub struct BidirectionalTraversal<'a> {
    start_side: TraversalDescription<'a>,
    end_side: TraversalDescription<'a>,
    collision: EvaluatorChain<'a>,
    selector: SideSelector,
    max_steps: usize,
}

impl Default for BidirectionalTraversal<'_> {
    fn default() -> Self {
        Self {
            start_side: TraversalDescription::new(),
            end_side: TraversalDescription::new(),
            collision: EvaluatorChain::new(),
            selector: SideSelector::default(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl<'a> BidirectionalTraversal<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_side(mut self, description: TraversalDescription<'a>) -> Self {
        self.start_side = description;
        self
    }

    pub fn end_side(mut self, description: TraversalDescription<'a>) -> Self {
        self.end_side = description;
        self
    }

    /// Use `description` for the start side and its mirror image for the end
    /// side. See [`TraversalDescription::mirrored`].
    pub fn mirrored_sides(mut self, description: TraversalDescription<'a>) -> Self {
        self.end_side = description.mirrored();
        self.start_side = description;
        self
    }

    /// Add an evaluator applied to each merged path at a collision.
    pub fn collision_evaluator(mut self, evaluator: impl Evaluator + Send + Sync + 'a) -> Self {
        self.collision.push(evaluator);
        self
    }

    pub fn side_selector(mut self, selector: SideSelector, max_steps: usize) -> Self {
        self.selector = selector;
        self.max_steps = max_steps;
        self
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Start the search between `start` and `end`.
    pub fn traverse<'t, G: GraphStore + ?Sized>(
        &'t self,
        store: &'t G,
        start: NodeId,
        end: NodeId,
    ) -> Result<BidirectionalTraverser<'t, G>> {
        let start_traverser = self.start_side.traverse(store, start)?;
        let end_traverser = self
            .end_side
            .traverse(store, end)
            .map_err(|_| TraversalError::InvalidEndNode(end))?;

        debug!(
            start,
            end,
            selector = %self.selector,
            max_steps = self.max_steps,
            "bidirectional search started"
        );

        Ok(BidirectionalTraverser {
            start: SideState::new(start_traverser),
            end: SideState::new(end_traverser),
            collision: &self.collision,
            selector: self.selector,
            max_steps: self.max_steps,
            steps: 0,
            turn: Side::Start,
            node_unique: self.start_side.get_uniqueness().is_node_based()
                || self.end_side.get_uniqueness().is_node_based(),
            reported: HashSet::new(),
            ready: VecDeque::new(),
            stopped: false,
        })
    }
}

struct SideState<'t, G: ?Sized> {
    traverser: Traverser<'t, G>,
    /// Included paths of this side, by terminal node.
    visited: HashMap<NodeId, Vec<Path>>,
    exhausted: bool,
}

impl<'t, G: GraphStore + ?Sized> SideState<'t, G> {
    fn new(traverser: Traverser<'t, G>) -> Self {
        Self {
            traverser,
            visited: HashMap::new(),
            exhausted: false,
        }
    }
}

/// A running bidirectional search. Yields merged start-to-end paths in the
/// order their collisions are discovered.
pub struct BidirectionalTraverser<'t, G: ?Sized> {
    start: SideState<'t, G>,
    end: SideState<'t, G>,
    collision: &'t EvaluatorChain<'t>,
    selector: SideSelector,
    max_steps: usize,
    steps: usize,
    turn: Side,
    node_unique: bool,
    reported: HashSet<Path>,
    ready: VecDeque<Path>,
    stopped: bool,
}

impl<'t, G: GraphStore + ?Sized> BidirectionalTraverser<'t, G> {
    /// Steps taken so far. A step is one branch admitted and evaluated by
    /// either side, whether or not its evaluators include it.
    pub fn steps(&self) -> usize {
        self.steps
    }

    fn select(&mut self) -> Option<Side> {
        let preferred = match self.selector {
            SideSelector::Alternating => {
                let side = self.turn;
                self.turn = side.other();
                side
            }
            SideSelector::Level => {
                if self.start.traverser.pending() <= self.end.traverser.pending() {
                    Side::Start
                } else {
                    Side::End
                }
            }
        };
        [preferred, preferred.other()]
            .into_iter()
            .find(|&side| !self.side(side).exhausted)
    }

    fn side(&self, side: Side) -> &SideState<'t, G> {
        match side {
            Side::Start => &self.start,
            Side::End => &self.end,
        }
    }

    /// Advance one side by one branch and, if that side includes it, check it
    /// against the other side. Returns false once there is nothing left to do.
    fn step(&mut self) -> bool {
        if self.steps >= self.max_steps {
            debug!(steps = self.steps, "bidirectional step budget spent");
            return false;
        }

        let (side, branch) = loop {
            let Some(side) = self.select() else {
                debug!(steps = self.steps, "both sides exhausted");
                return false;
            };
            let state = match side {
                Side::Start => &mut self.start,
                Side::End => &mut self.end,
            };
            match state.traverser.step() {
                Some(branch) => break (side, branch),
                None => state.exhausted = true,
            }
        };
        self.steps += 1;

        if !branch.evaluation.includes() {
            return true;
        }
        let path = branch.path;
        let node = path.end_node();
        let (mine, theirs) = match side {
            Side::Start => (&mut self.start.visited, &self.end.visited),
            Side::End => (&mut self.end.visited, &self.start.visited),
        };

        let merged: Vec<Path> = theirs
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(|other| match side {
                Side::Start => path.join(other),
                Side::End => other.join(&path),
            })
            .collect();
        mine.entry(node).or_default().push(path);

        for candidate in merged {
            if self.node_unique && candidate.has_repeated_node() {
                continue;
            }
            let verdict = self.collision.evaluate(&candidate, candidate.len());
            debug!(node, length = candidate.len(), ?verdict, "collision");

            if verdict.includes() && self.reported.insert(candidate.clone()) {
                self.ready.push_back(candidate);
            }
            if !verdict.continues() {
                self.stopped = true;
                break;
            }
        }
        true
    }
}

impl<G: GraphStore + ?Sized> Iterator for BidirectionalTraverser<'_, G> {
    type Item = Path;

    fn next(&mut self) -> Option<Path> {
        loop {
            if let Some(path) = self.ready.pop_front() {
                return Some(path);
            }
            if self.stopped || !self.step() {
                self.stopped = true;
                return None;
            }
        }
    }
}
