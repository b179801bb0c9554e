use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TraversalError};
use crate::graph::{NodeId, RelId, RelationshipRef};
use crate::path::Path;

/// Revisit policy for a single traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Uniqueness {
    /// No deduplication. Needs a depth-bounding evaluator on cyclic graphs.
    None,
    /// A node is visited at most once per traversal.
    #[default]
    NodeGlobal,
    /// A node may appear on many paths, but only once on each.
    NodePath,
    /// A node is visited at most once per depth.
    NodeLevel,
    /// A relationship is followed at most once per traversal.
    RelationshipGlobal,
    /// A relationship may appear on many paths, but only once on each.
    RelationshipPath,
}

impl Uniqueness {
    /// Policies under which a valid path never repeats a node.
    pub fn is_node_based(self) -> bool {
        matches!(
            self,
            Uniqueness::NodeGlobal | Uniqueness::NodePath | Uniqueness::NodeLevel
        )
    }
}

impl FromStr for Uniqueness {
    type Err = TraversalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "none" => Ok(Uniqueness::None),
            "node_global" => Ok(Uniqueness::NodeGlobal),
            "node_path" => Ok(Uniqueness::NodePath),
            "node_level" => Ok(Uniqueness::NodeLevel),
            "relationship_global" => Ok(Uniqueness::RelationshipGlobal),
            "relationship_path" => Ok(Uniqueness::RelationshipPath),
            other => Err(TraversalError::UnsupportedPolicy(format!(
                "uniqueness '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Uniqueness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Uniqueness::None => "none",
            Uniqueness::NodeGlobal => "node_global",
            Uniqueness::NodePath => "node_path",
            Uniqueness::NodeLevel => "node_level",
            Uniqueness::RelationshipGlobal => "relationship_global",
            Uniqueness::RelationshipPath => "relationship_path",
        };
        f.write_str(s)
    }
}

/// Per-traversal bookkeeping for a [`Uniqueness`] policy.
///
/// Owned by exactly one traverser. Rejection is a pruning rule: the branch
/// is dropped without evaluation or expansion.
#[derive(Debug, Clone)]
pub struct UniquenessTracker {
    policy: Uniqueness,
    nodes: HashSet<NodeId>,
    relationships: HashSet<RelId>,
    levels: HashMap<usize, HashSet<NodeId>>,
}

impl UniquenessTracker {
    pub fn new(policy: Uniqueness) -> Self {
        Self {
            policy,
            nodes: HashSet::new(),
            relationships: HashSet::new(),
            levels: HashMap::new(),
        }
    }

    /// Check the branch ending in `path` and record it if admitted.
    pub fn admit(&mut self, path: &Path) -> bool {
        match self.policy {
            Uniqueness::None => true,
            Uniqueness::NodeGlobal => self.nodes.insert(path.end_node()),
            Uniqueness::NodePath => {
                let end = path.end_node();
                path.is_empty()
                    || !(path.start_node() == end
                        || path.steps_rev().skip(1).any(|s| s.node == end))
            }
            Uniqueness::NodeLevel => self
                .levels
                .entry(path.len())
                .or_default()
                .insert(path.end_node()),
            Uniqueness::RelationshipGlobal => match path.last_relationship() {
                Some(rel) => self.relationships.insert(rel.id),
                None => true,
            },
            Uniqueness::RelationshipPath => match path.last_relationship() {
                Some(last) => !path
                    .steps_rev()
                    .skip(1)
                    .any(|s| s.relationship.id == last.id),
                None => true,
            },
        }
    }

    /// True if a branch reaching `node` over `rel` at `depth` would be
    /// rejected whenever it is popped. Global state only grows, so such
    /// candidates can be dropped before they enter the frontier.
    pub fn is_spent(&self, rel: &RelationshipRef, node: NodeId, depth: usize) -> bool {
        match self.policy {
            Uniqueness::NodeGlobal => self.nodes.contains(&node),
            Uniqueness::NodeLevel => self.levels.get(&depth).is_some_and(|l| l.contains(&node)),
            Uniqueness::RelationshipGlobal => self.relationships.contains(&rel.id),
            Uniqueness::None | Uniqueness::NodePath | Uniqueness::RelationshipPath => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(id: u64, start: NodeId, end: NodeId) -> RelationshipRef {
        RelationshipRef {
            id,
            rel_type: 0,
            start,
            end,
        }
    }

    #[test]
    fn test_none_admits_everything() {
        let mut t = UniquenessTracker::new(Uniqueness::None);
        let p = Path::single(0);
        assert!(t.admit(&p));
        assert!(t.admit(&p));
    }

    #[test]
    fn test_node_global() {
        let mut t = UniquenessTracker::new(Uniqueness::NodeGlobal);
        assert!(t.admit(&Path::single(0)));
        let to_one = Path::single(0).extend(rel(0, 0, 1));
        assert!(t.admit(&to_one));
        // Different path, same node
        let again = Path::single(0).extend(rel(1, 1, 0)).extend(rel(0, 0, 1));
        assert!(!t.admit(&again));
    }

    #[test]
    fn test_node_path() {
        let mut t = UniquenessTracker::new(Uniqueness::NodePath);
        let p = Path::single(0).extend(rel(0, 0, 1));
        assert!(t.admit(&p));
        // Node 1 again on a sibling path is fine
        assert!(t.admit(&Path::single(0).extend(rel(5, 1, 0))));
        // Back to 0 on the same path is not
        assert!(!t.admit(&p.extend(rel(1, 1, 0))));
    }

    #[test]
    fn test_node_level() {
        let mut t = UniquenessTracker::new(Uniqueness::NodeLevel);
        let a = Path::single(0).extend(rel(0, 0, 1));
        let b = Path::single(0).extend(rel(1, 0, 1));
        assert!(t.admit(&a));
        assert!(!t.admit(&b));
        // Same node one level deeper
        assert!(t.admit(&a.extend(rel(2, 1, 2)).extend(rel(3, 2, 1))));
    }

    #[test]
    fn test_relationship_global() {
        let mut t = UniquenessTracker::new(Uniqueness::RelationshipGlobal);
        assert!(t.admit(&Path::single(0)));
        assert!(t.admit(&Path::single(0)));
        let p = Path::single(0).extend(rel(0, 0, 1));
        assert!(t.admit(&p));
        assert!(!t.admit(&Path::single(1).extend(rel(0, 0, 1))));
    }

    #[test]
    fn test_relationship_path() {
        let mut t = UniquenessTracker::new(Uniqueness::RelationshipPath);
        let p = Path::single(0).extend(rel(0, 0, 1));
        assert!(t.admit(&p));
        let back = p.extend(rel(0, 0, 1));
        assert!(!t.admit(&back));
        assert!(t.admit(&p.extend(rel(1, 1, 0))));
    }

    #[test]
    fn test_spent_candidates() {
        let r0 = rel(0, 0, 1);
        let r1 = rel(1, 1, 0);

        let mut global = UniquenessTracker::new(Uniqueness::NodeGlobal);
        assert!(global.admit(&Path::single(0)));
        assert!(global.is_spent(&r1, 0, 2));
        assert!(!global.is_spent(&r0, 1, 1));

        let mut level = UniquenessTracker::new(Uniqueness::NodeLevel);
        assert!(level.admit(&Path::single(0).extend(r0)));
        assert!(level.is_spent(&r0, 1, 1));
        assert!(!level.is_spent(&r0, 1, 3));

        let mut rels = UniquenessTracker::new(Uniqueness::RelationshipGlobal);
        assert!(rels.admit(&Path::single(0).extend(r0)));
        assert!(rels.is_spent(&r0, 0, 2));
        assert!(!rels.is_spent(&r1, 0, 2));

        let path = UniquenessTracker::new(Uniqueness::NodePath);
        assert!(!path.is_spent(&r1, 0, 2));
    }

    #[test]
    fn test_parse_and_display() {
        for u in [
            Uniqueness::None,
            Uniqueness::NodeGlobal,
            Uniqueness::NodePath,
            Uniqueness::NodeLevel,
            Uniqueness::RelationshipGlobal,
            Uniqueness::RelationshipPath,
        ] {
            assert_eq!(u.to_string().parse::<Uniqueness>().unwrap(), u);
        }
        assert_eq!("NODE-PATH".parse::<Uniqueness>().unwrap(), Uniqueness::NodePath);
        assert!(matches!(
            "node_recent".parse::<Uniqueness>(),
            Err(TraversalError::UnsupportedPolicy(_))
        ));
        assert!(Uniqueness::NodeLevel.is_node_based());
        assert!(!Uniqueness::RelationshipPath.is_node_based());
    }
}
