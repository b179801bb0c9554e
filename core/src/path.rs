use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::graph::{Direction, NodeId, RelationshipRef};

/// One hop of a path: the relationship followed and the node it led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub relationship: RelationshipRef,
    pub node: NodeId,
}

impl PathStep {
    /// Direction the relationship was traversed to arrive at `node`.
    pub fn direction(&self) -> Direction {
        if self.relationship.end == self.node {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }
}

/// Last step of a path plus a shared pointer to the steps before it.
struct Link {
    step: PathStep,
    parent: Option<Arc<Link>>,
}

impl Drop for Link {
    // Unlink iteratively so dropping a long path cannot overflow the stack.
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(link) = parent {
            match Arc::try_unwrap(link) {
                Ok(mut inner) => parent = inner.parent.take(),
                Err(_) => break,
            }
        }
    }
}

/// An alternating node/relationship sequence that starts and ends on a node.
///
/// Every step's relationship has the previous node as one endpoint and the
/// step's node as the other. Paths grown from a common prefix share it, so
/// [`Path::extend`] and `clone` are O(1) and a frontier of sibling branches
/// costs one link per branch.
#[derive(Clone)]
pub struct Path {
    start: NodeId,
    last: Option<Arc<Link>>,
    len: usize,
}

impl Path {
    /// A zero-length path consisting of a single node.
    pub fn single(node: NodeId) -> Self {
        Self {
            start: node,
            last: None,
            len: 0,
        }
    }

    /// A new path with `rel` appended, leading to its endpoint opposite the current end.
    pub fn extend(&self, rel: RelationshipRef) -> Self {
        let node = rel.other(self.end_node());
        Self {
            start: self.start,
            last: Some(Arc::new(Link {
                step: PathStep {
                    relationship: rel,
                    node,
                },
                parent: self.last.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Number of relationships (0 for a single-node path).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn start_node(&self) -> NodeId {
        self.start
    }

    pub fn end_node(&self) -> NodeId {
        self.last.as_ref().map_or(self.start, |l| l.step.node)
    }

    pub fn last_relationship(&self) -> Option<RelationshipRef> {
        self.last.as_ref().map(|l| l.step.relationship)
    }

    /// Steps from the end back to the start. Does not allocate.
    pub fn steps_rev(&self) -> impl Iterator<Item = &PathStep> + '_ {
        std::iter::successors(self.last.as_deref(), |l| l.parent.as_deref()).map(|l| &l.step)
    }

    /// Steps from start to end.
    pub fn steps(&self) -> Vec<PathStep> {
        let mut steps: Vec<PathStep> = self.steps_rev().copied().collect();
        steps.reverse();
        steps
    }

    /// Nodes from start to end.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        std::iter::once(self.start).chain(self.steps().into_iter().map(|s| s.node))
    }

    pub fn relationships(&self) -> impl Iterator<Item = RelationshipRef> {
        self.steps().into_iter().map(|s| s.relationship)
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.start == node || self.steps_rev().any(|s| s.node == node)
    }

    /// True if some node occurs more than once.
    pub fn has_repeated_node(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.len + 1);
        seen.insert(self.start);
        !self.steps_rev().all(|s| seen.insert(s.node))
    }

    /// The same walk read from end to start.
    pub fn reverse(&self) -> Self {
        self.steps_rev()
            .fold(Path::single(self.end_node()), |path, step| {
                path.extend(step.relationship)
            })
    }

    /// Join a start-side path with an end-side path that meet at the same
    /// node: `self` followed by `other` read backwards.
    ///
    /// Returns `None` if the two paths do not end on the same node.
    pub fn join(&self, other: &Path) -> Option<Self> {
        if self.end_node() != other.end_node() {
            return None;
        }
        Some(
            other
                .steps_rev()
                .fold(self.clone(), |path, step| path.extend(step.relationship)),
        )
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        if self.start != other.start || self.len != other.len {
            return false;
        }
        let mut mine = std::iter::successors(self.last.as_ref(), |l| l.parent.as_ref());
        let mut theirs = std::iter::successors(other.last.as_ref(), |l| l.parent.as_ref());
        loop {
            match (mine.next(), theirs.next()) {
                (Some(a), Some(b)) if Arc::ptr_eq(a, b) => return true,
                (Some(a), Some(b)) if a.step == b.step => continue,
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.len.hash(state);
        for step in self.steps_rev() {
            step.hash(state);
        }
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("start", &self.start)
            .field("steps", &self.steps())
            .finish()
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
    fn test_single_node_path() {
        let p = Path::single(7);
        assert_eq!(p.len(), 0);
        assert!(p.is_empty());
        assert_eq!(p.start_node(), 7);
        assert_eq!(p.end_node(), 7);
        assert!(p.last_relationship().is_none());
        assert_eq!(p.nodes().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_extend_follows_either_orientation() {
        // 0→1, then 2→1 followed backwards
        let p = Path::single(0).extend(rel(10, 0, 1)).extend(rel(11, 2, 1));
        assert_eq!(p.len(), 2);
        assert_eq!(p.nodes().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(p.steps()[0].direction(), Direction::Outgoing);
        assert_eq!(p.steps()[1].direction(), Direction::Incoming);
        assert_eq!(p.last_relationship().map(|r| r.id), Some(11));
    }

    #[test]
    fn test_reverse() {
        let p = Path::single(0).extend(rel(10, 0, 1)).extend(rel(11, 1, 2));
        let r = p.reverse();
        assert_eq!(r.nodes().collect::<Vec<_>>(), vec![2, 1, 0]);
        assert_eq!(r.relationships().map(|x| x.id).collect::<Vec<_>>(), vec![11, 10]);
        assert_eq!(r.steps()[0].direction(), Direction::Incoming);
        assert_eq!(r.reverse(), p);
    }

    #[test]
    fn test_extended_paths_share_their_prefix() {
        let base = Path::single(0).extend(rel(10, 0, 1));
        let a = base.extend(rel(11, 1, 2));
        let b = base.extend(rel(12, 1, 3));
        assert_eq!(a.len(), 2);
        assert_eq!(b.nodes().collect::<Vec<_>>(), vec![0, 1, 3]);
        assert_ne!(a, b);
        assert_eq!(a, Path::single(0).extend(rel(10, 0, 1)).extend(rel(11, 1, 2)));
        assert_eq!(
            a.steps_rev().map(|s| s.node).collect::<Vec<_>>(),
            vec![2, 1]
        );
    }

    #[test]
    fn test_long_path_drops_without_recursion() {
        let mut p = Path::single(0);
        for i in 0..200_000u64 {
            p = p.extend(rel(i, i, i + 1));
        }
        assert_eq!(p.len(), 200_000);
        assert_eq!(p.end_node(), 200_000);
        drop(p);
    }

    #[test]
    fn test_join_at_meeting_node() {
        let left = Path::single(0).extend(rel(10, 0, 1));
        let right = Path::single(2).extend(rel(11, 1, 2));
        let joined = left.join(&right).unwrap();
        assert_eq!(joined.nodes().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(joined.len(), 2);
        assert!(left.join(&Path::single(5)).is_none());
    }

    #[test]
    fn test_repeated_node_detection() {
        let p = Path::single(0).extend(rel(10, 0, 1)).extend(rel(11, 1, 0));
        assert!(p.has_repeated_node());
        assert!(p.contains_node(1));
        assert!(!Path::single(0).extend(rel(10, 0, 1)).has_repeated_node());
    }
}
