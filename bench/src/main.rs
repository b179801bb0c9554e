use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use graph_walk_core::recommend::recommend;
use graph_walk_core::{
    evaluator, shortest_path, BidirectionalTraversal, Expander, Graph, GraphStore, SideSelector,
    Strategy, TraversalDescription, Uniqueness,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Run every generator
    All,
    /// Branching tree over POINT_TO (deep, acyclic)
    Tree,
    /// Preferential attachment over KNOWS (hub-and-spoke)
    Social,
    /// Watts-Strogatz ring lattice plus shortcuts
    Smallworld,
    /// Two dense clusters joined by a thin bridge
    Barbell,
    /// Users with friendships and HAS_SEEN relationships to movies
    Movies,
}

#[derive(Parser)]
#[command(name = "graph-walk-bench", about = "Benchmark traversals on generated graphs")]
struct Args {
    #[arg(value_enum, default_value = "all")]
    mode: Mode,

    #[arg(default_value_t = 200_000)]
    node_count: u64,

    /// Step budget for the bidirectional search
    #[arg(long, default_value_t = 100_000)]
    max_steps: usize,
}

type Generator = fn(u64) -> Result<Graph>;

fn main() -> Result<()> {
    let args = Args::parse();

    println!("graph-walk-bench");
    println!("================");
    println!();

    let generators: Vec<(&str, Generator)> = match args.mode {
        Mode::Tree => vec![("Branching tree", gen_tree)],
        Mode::Social => vec![("Social (preferential attachment)", gen_social)],
        Mode::Smallworld => vec![("Small-world (Watts-Strogatz)", gen_small_world)],
        Mode::Barbell => vec![("Barbell (cluster-bridge-cluster)", gen_barbell)],
        Mode::Movies => vec![("Movies (friends + HAS_SEEN)", gen_movies)],
        Mode::All => vec![
            ("Branching tree", gen_tree as Generator),
            ("Social (preferential attachment)", gen_social),
            ("Small-world (Watts-Strogatz)", gen_small_world),
            ("Barbell (cluster-bridge-cluster)", gen_barbell),
            ("Movies (friends + HAS_SEEN)", gen_movies),
        ],
    };

    for (name, generator) in generators {
        run_benchmark(name, generator, &args)?;
    }
    Ok(())
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn run_benchmark(name: &str, generator: Generator, args: &Args) -> Result<()> {
    println!("--- {} ---", name);
    println!("Target: {} nodes", args.node_count);

    let t = Instant::now();
    let graph = generator(args.node_count)?;
    println!(
        "Generated in {:.2}s: {} nodes, {} relationships, ~{:.0}MB",
        t.elapsed().as_secs_f64(),
        graph.node_count(),
        graph.relationship_count(),
        graph.memory_usage() as f64 / 1_048_576.0
    );

    // Depth-bounded walks from node 0 under both strategies
    println!();
    println!(
        "{:>8} {:>14} {:>10} {:>10} {:>10}",
        "depth", "strategy", "found", "visited", "time"
    );
    println!("{:->8} {:->14} {:->10} {:->10} {:->10}", "", "", "", "", "");

    for depth in [1, 2, 3, 5, 10, 20] {
        let mut reached_all = false;
        for strategy in [Strategy::DepthFirst, Strategy::BreadthFirst] {
            let desc = TraversalDescription::new()
                .strategy(strategy)
                .evaluator(evaluator::to_depth(depth));
            let t = Instant::now();
            let mut traverser = desc.traverse(&graph, 0)?;
            let found = traverser.by_ref().count();
            let elapsed = t.elapsed();
            println!(
                "{:>8} {:>14} {:>10} {:>10} {:>8.1}ms",
                depth,
                strategy,
                found,
                traverser.visited(),
                ms(elapsed)
            );
            reached_all |= found >= graph.node_count();
        }
        if reached_all {
            println!("{:>8} (entire graph reached)", "");
            break;
        }
    }

    // Node-level uniqueness admits one path per node and depth
    let desc = TraversalDescription::new()
        .breadth_first()
        .uniqueness(Uniqueness::NodeLevel)
        .evaluator(evaluator::to_depth(3));
    let t = Instant::now();
    let found = desc.traverse(&graph, 0)?.count();
    println!();
    println!("Node-level BFS to depth 3: {} paths in {:.1}ms", found, ms(t.elapsed()));

    let far_node = graph.node_count() as u64 - 1;

    let t = Instant::now();
    let path = shortest_path(&graph, 0, far_node, 100, &Expander::all());
    let elapsed = t.elapsed();
    match path {
        Some(p) => println!(
            "Shortest path 0 → {}: {} hops in {:.1}ms",
            far_node,
            p.len(),
            ms(elapsed)
        ),
        None => println!("Shortest path 0 → {}: no path ({:.1}ms)", far_node, ms(elapsed)),
    }

    for selector in [SideSelector::Alternating, SideSelector::Level] {
        let search = BidirectionalTraversal::new()
            .mirrored_sides(TraversalDescription::new().breadth_first())
            .side_selector(selector, args.max_steps);
        let t = Instant::now();
        let mut traverser = search.traverse(&graph, 0, far_node)?;
        let first = traverser.next();
        let elapsed = t.elapsed();
        match first {
            Some(p) => println!(
                "Bidirectional ({}) 0 → {}: {} hops after {} steps in {:.1}ms",
                selector,
                far_node,
                p.len(),
                traverser.steps(),
                ms(elapsed)
            ),
            None => println!(
                "Bidirectional ({}) 0 → {}: no collision within {} steps ({:.1}ms)",
                selector,
                far_node,
                traverser.steps(),
                ms(elapsed)
            ),
        }
    }

    if graph.rel_type_count() > 0 && graph.node_label(0) == Some("User") {
        let t = Instant::now();
        let picks = recommend(&graph, 0, "IS_FRIEND_OF", "HAS_SEEN")?;
        println!(
            "Recommendations for user 0: {} movies in {:.1}ms",
            picks.len(),
            ms(t.elapsed())
        );
    }
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Generators: deterministic, single-threaded, linear in nodes + relationships
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn add_people(graph: &mut Graph, ids: std::ops::Range<u64>, label: &str) {
    for id in ids {
        graph.add_node(id, label.into(), Some(format!("p_{}", id)));
    }
}

/// Every node gets three POINT_TO children, level by level.
fn gen_tree(node_count: u64) -> Result<Graph> {
    let mut graph = Graph::with_capacity(node_count as usize, node_count as usize);
    let rt = graph.intern_rel_type("POINT_TO");
    graph.add_node(0, "Root".into(), Some("n_0".into()));

    let mut next_id: u64 = 1;
    let mut frontier: VecDeque<u64> = VecDeque::from([0]);
    while let Some(parent) = frontier.pop_front() {
        for _ in 0..3 {
            if next_id >= node_count {
                return Ok(graph);
            }
            let child = next_id;
            next_id += 1;
            graph.add_node(child, "Node".into(), Some(format!("n_{}", child)));
            graph.add_relationship(parent, child, rt)?;
            frontier.push_back(child);
        }
    }
    Ok(graph)
}

/// Preferential attachment by sampling an endpoint of an existing
/// relationship: well-connected people are picked more often.
fn gen_social(node_count: u64) -> Result<Graph> {
    let per_node = 5u64;
    let mut graph = Graph::with_capacity(node_count as usize, (node_count * per_node) as usize);
    let mut rng = FastRng::new(12345);
    let knows = graph.intern_rel_type("KNOWS");

    let mut endpoints: Vec<u64> = Vec::with_capacity((node_count * per_node * 2) as usize);

    let seed = 5u64.min(node_count);
    add_people(&mut graph, 0..seed, "Person");
    for i in 0..seed {
        for j in (i + 1)..seed {
            graph.add_relationship(i, j, knows)?;
            endpoints.extend([i, j]);
        }
    }

    for new_node in seed..node_count {
        add_people(&mut graph, new_node..new_node + 1, "Person");
        for _ in 0..per_node.min(new_node) {
            let target = endpoints[rng.next(endpoints.len() as u64) as usize];
            if target != new_node {
                graph.add_relationship(new_node, target, knows)?;
                endpoints.extend([new_node, target]);
            }
        }
    }
    Ok(graph)
}

/// Ring of `k` forward neighbours per node, each rewired with probability `p`.
fn gen_small_world(node_count: u64) -> Result<Graph> {
    let k = 5u64;
    let p = 0.05f64;
    let mut graph = Graph::with_capacity(node_count as usize, (node_count * k) as usize);
    let mut rng = FastRng::new(67890);
    let knows = graph.intern_rel_type("KNOWS");

    add_people(&mut graph, 0..node_count, "Person");
    for i in 0..node_count {
        for j in 1..=k {
            let mut target = (i + j) % node_count;
            if rng.next_f64() < p {
                let rewired = rng.next(node_count);
                if rewired != i {
                    target = rewired;
                }
            }
            graph.add_relationship(i, target, knows)?;
        }
    }
    Ok(graph)
}

/// Two random clusters joined by a chain of ten bridge nodes. Bidirectional
/// search has to find the bridge from both sides.
fn gen_barbell(node_count: u64) -> Result<Graph> {
    let bridge_len = 10u64;
    let cluster = node_count.saturating_sub(bridge_len) / 2;
    let degree = 10u64.min(cluster.saturating_sub(1));
    let mut graph = Graph::with_capacity(node_count as usize, (cluster * degree * 2 + bridge_len) as usize);
    let mut rng = FastRng::new(99999);
    let knows = graph.intern_rel_type("KNOWS");
    let bridges = graph.intern_rel_type("BRIDGES");

    let b_start = cluster + bridge_len;
    add_people(&mut graph, 0..cluster, "ClusterA");
    add_people(&mut graph, cluster..b_start, "Bridge");
    add_people(&mut graph, b_start..b_start + cluster, "ClusterB");

    for base in [0, b_start] {
        for i in 0..cluster {
            for _ in 0..degree {
                let target = rng.next(cluster);
                if target != i {
                    graph.add_relationship(base + i, base + target, knows)?;
                }
            }
        }
    }

    if cluster > 0 {
        let mut prev = cluster - 1;
        for id in cluster..b_start {
            graph.add_relationship(prev, id, bridges)?;
            prev = id;
        }
        graph.add_relationship(prev, b_start, bridges)?;
    }
    Ok(graph)
}

/// A tenth of the nodes are movies, the rest users. Each user befriends a
/// few others and has seen a handful of movies.
fn gen_movies(node_count: u64) -> Result<Graph> {
    let movies = (node_count / 10).max(1);
    let users = node_count.saturating_sub(movies).max(1);
    let mut graph = Graph::with_capacity((users + movies) as usize, (users * 8) as usize);
    let mut rng = FastRng::new(77777);
    let friend = graph.intern_rel_type("IS_FRIEND_OF");
    let seen = graph.intern_rel_type("HAS_SEEN");

    add_people(&mut graph, 0..users, "User");
    for m in users..users + movies {
        graph.add_node(m, "Movie".into(), Some(format!("m_{}", m)));
    }

    for u in 0..users {
        for _ in 0..3 {
            let other = rng.next(users);
            if other != u {
                graph.add_relationship(u, other, friend)?;
            }
        }
        for _ in 0..5 {
            let movie = users + rng.next(movies);
            graph.add_relationship(u, movie, seen)?;
        }
    }
    Ok(graph)
}
