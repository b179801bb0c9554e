//! Property-based tests for the traversal engine over random small graphs.
//!
//! Checks:
//! - Depth-first and breadth-first visit the same nodes under node-global uniqueness
//! - `at_depth` paths have exactly that length and cover every node at that distance
//! - Node-path uniqueness never repeats a node inside a path
//! - Node-global uniqueness never repeats a node across paths
//! - Bidirectional results are well-formed start-to-end paths

use std::collections::HashSet;

use graph_walk_core::{
    evaluator, shortest_path, BidirectionalTraversal, Expander, Graph, NodeId, Path,
    Strategy as WalkStrategy, TraversalDescription, Uniqueness,
};
use proptest::prelude::*;

const REL_TYPES: [&str; 2] = ["KNOWS", "LIKES"];

fn build(n: u64, rels: &[(u64, u64, usize)]) -> Graph {
    let mut g = Graph::new();
    for id in 0..n {
        g.add_node(id, "Node".into(), None);
    }
    for &(a, b, t) in rels {
        let rt = g.intern_rel_type(REL_TYPES[t]);
        g.add_relationship(a, b, rt).unwrap();
    }
    g
}

prop_compose! {
    fn arb_graph()(n in 1u64..10)(
        n in Just(n),
        rels in prop::collection::vec((0..n, 0..n, 0usize..2), 0..25),
    ) -> Graph {
        build(n, &rels)
    }
}

/// Every step's relationship joins the previous node to the step's node.
fn is_well_formed(path: &Path) -> bool {
    let nodes: Vec<NodeId> = path.nodes().collect();
    path.relationships()
        .zip(nodes.windows(2))
        .all(|(rel, pair)| rel.other(pair[0]) == pair[1] && (rel.start == pair[0] || rel.end == pair[0]))
}

fn end_nodes(desc: &TraversalDescription<'_>, g: &Graph, start: NodeId) -> Vec<NodeId> {
    desc.traverse(g, start).unwrap().nodes().collect()
}

proptest! {
    /// Property: strategy changes order, not coverage
    #[test]
    fn prop_dfs_bfs_same_nodes(g in arb_graph()) {
        let dfs = end_nodes(&TraversalDescription::new().depth_first(), &g, 0);
        let bfs = end_nodes(&TraversalDescription::new().breadth_first(), &g, 0);
        let dfs_set: HashSet<NodeId> = dfs.iter().copied().collect();
        let bfs_set: HashSet<NodeId> = bfs.iter().copied().collect();
        prop_assert_eq!(dfs.len(), dfs_set.len());
        prop_assert_eq!(dfs_set, bfs_set);
    }

    /// Property: at_depth(D) under breadth-first node-global yields exactly
    /// the nodes whose distance from the start is D
    #[test]
    fn prop_at_depth_matches_distance(g in arb_graph(), depth in 0usize..4) {
        let desc = TraversalDescription::new()
            .breadth_first()
            .evaluator(evaluator::at_depth(depth));
        let paths: Vec<Path> = desc.traverse(&g, 0).unwrap().collect();
        prop_assert!(paths.iter().all(|p| p.len() == depth));

        let found: HashSet<NodeId> = paths.iter().map(|p| p.end_node()).collect();
        let expected: HashSet<NodeId> = (0..g.node_count() as u64)
            .filter(|&n| {
                shortest_path(&g, 0, n, depth as u32, &Expander::all())
                    .is_some_and(|p| p.len() == depth)
            })
            .collect();
        prop_assert_eq!(found, expected);
    }

    /// Property: node-path uniqueness keeps every path simple but lets a node
    /// appear on several paths
    #[test]
    fn prop_node_path_is_simple(g in arb_graph(), strategy in prop_oneof![
        Just(WalkStrategy::DepthFirst),
        Just(WalkStrategy::BreadthFirst),
    ]) {
        let desc = TraversalDescription::new()
            .strategy(strategy)
            .uniqueness(Uniqueness::NodePath)
            .evaluator(evaluator::to_depth(4));
        for path in desc.traverse(&g, 0).unwrap() {
            prop_assert!(!path.has_repeated_node());
            prop_assert!(is_well_formed(&path));
        }
    }

    /// Property: node-global uniqueness reports each node at most once
    #[test]
    fn prop_node_global_unique_ends(g in arb_graph()) {
        let ends = end_nodes(&TraversalDescription::new(), &g, 0);
        let unique: HashSet<NodeId> = ends.iter().copied().collect();
        prop_assert_eq!(ends.len(), unique.len());
    }

    /// Property: relationship-path uniqueness never reuses a relationship
    /// inside one path
    #[test]
    fn prop_relationship_path(g in arb_graph()) {
        let desc = TraversalDescription::new()
            .uniqueness(Uniqueness::RelationshipPath)
            .evaluator(evaluator::to_depth(3));
        for path in desc.traverse(&g, 0).unwrap() {
            let ids: Vec<u64> = path.relationships().map(|r| r.id).collect();
            let unique: HashSet<u64> = ids.iter().copied().collect();
            prop_assert_eq!(ids.len(), unique.len());
        }
    }

    /// Property: bidirectional results start and end where asked, never
    /// repeat a node, and only exist when the nodes are connected
    #[test]
    fn prop_bidirectional_paths(g in arb_graph(), end_seed in 0u64..10) {
        let end = end_seed % g.node_count() as u64;
        let search = BidirectionalTraversal::new().mirrored_sides(
            TraversalDescription::new()
                .breadth_first()
                .uniqueness(Uniqueness::NodePath),
        );
        let paths: Vec<Path> = search.traverse(&g, 0, end).unwrap().collect();
        let distinct: HashSet<&Path> = paths.iter().collect();
        prop_assert_eq!(distinct.len(), paths.len());
        for path in &paths {
            prop_assert_eq!(path.start_node(), 0);
            prop_assert_eq!(path.end_node(), end);
            prop_assert!(!path.has_repeated_node());
            prop_assert!(is_well_formed(path));
        }
        if !paths.is_empty() {
            let limit = g.node_count() as u32;
            prop_assert!(shortest_path(&g, 0, end, limit, &Expander::all()).is_some());
        }
    }
}
