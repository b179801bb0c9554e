use thiserror::Error;

use crate::graph::NodeId;

/// Errors surfaced by graph loading, traversal setup and path formatting.
///
/// Uniqueness violations are not errors (they silently prune), and a
/// bidirectional search that never collides yields an empty sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalError {
    #[error("start node {0} does not exist in the graph")]
    InvalidStartNode(NodeId),

    #[error("end node {0} does not exist in the graph")]
    InvalidEndNode(NodeId),

    #[error("node {node} has no property '{key}'")]
    MissingProperty { node: NodeId, key: String },

    #[error("unsupported policy: {0}")]
    UnsupportedPolicy(String),

    /// A relationship record referenced a node that was never declared.
    #[error("relationship endpoint {0} is not a known node")]
    UnknownNode(NodeId),

    #[error("relationship type '{0}' exceeds the maximum of {max} distinct types", max = crate::graph::MAX_REL_TYPES)]
    TooManyRelTypes(String),
}

pub type Result<T> = std::result::Result<T, TraversalError>;
