//! graph-walk-core: lazy traversal engine over a read-only property graph.
//!
//! A traversal is described once ([`TraversalDescription`]: relationship
//! filters, depth- or breadth-first order, a [`Uniqueness`] policy and an
//! evaluator chain) and then run from any start node as a pull-based
//! iterator of [`Path`]s. [`BidirectionalTraversal`] runs two traversals
//! towards each other and reports the paths where they meet.
//!
//! The engine only reads the graph through the [`GraphStore`] trait. [`Graph`]
//! is the in-memory implementation used by the CLI, benchmarks and tests.

mod bidirectional;
mod error;
pub mod evaluator;
mod expander;
mod format;
mod graph;
mod path;
pub mod recommend;
mod traversal;
mod uniqueness;

pub use bidirectional::{
    BidirectionalTraversal, BidirectionalTraverser, SideSelector, DEFAULT_MAX_STEPS,
};
pub use error::{Result, TraversalError};
pub use evaluator::{
    BoxedEvaluator, DepthEvaluator, Evaluation, Evaluator, EvaluatorChain,
    NodeFilteringEvaluator, ProximityEvaluator,
};
pub use expander::{ExpansionOrder, Expander, RelationshipFilter};
pub use format::{PathFormatter, DEFAULT_PROPERTY};
pub use graph::{
    Direction, Graph, GraphData, GraphStore, NodeId, NodeInfo, NodeRecord, RelId, RelTypeId,
    RelationshipRecord, RelationshipRef, TraversalDirection, MAX_REL_TYPES,
};
pub use path::{Path, PathStep};
pub use traversal::{shortest_path, Branch, Strategy, TraversalDescription, Traverser};
pub use uniqueness::{Uniqueness, UniquenessTracker};
