use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use graph_walk_cli::commands::{self, ConnectOptions, Report, WalkOptions, FRIEND_TYPE, SEEN_TYPE};
use graph_walk_cli::config::Config;
use graph_walk_cli::load::{load_graph, resolve_node};
use graph_walk_core::{PathFormatter, RelationshipFilter, SideSelector, Strategy, Uniqueness};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "graph-walk", version, about = "Traverse a property graph stored as JSON")]
struct Cli {
    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON graph file (overrides [graph] path)
    #[arg(short, long, global = true)]
    graph: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "graph_walk_core=trace" (RUST_LOG wins)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print node ids as JSON instead of formatted paths
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SeenArgs {
    /// Seen relationship type
    #[arg(long, default_value = SEEN_TYPE)]
    seen_rel: String,
}

#[derive(Args)]
struct FriendArgs {
    /// Friendship relationship type (followed both ways)
    #[arg(long, default_value = FRIEND_TYPE)]
    friend_rel: String,

    #[command(flatten)]
    seen: SeenArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Nodes a user has seen
    Seen {
        user: String,
        #[command(flatten)]
        args: SeenArgs,
    },
    /// What a user's friends have seen and the user has not
    Recommend {
        user: String,
        #[command(flatten)]
        args: FriendArgs,
    },
    /// The recommendation as paths through each friend
    FriendsSeen {
        user: String,
        #[command(flatten)]
        args: FriendArgs,
    },
    /// Walk the graph from a start node
    Walk {
        start: String,
        /// depth_first (dfs) or breadth_first (bfs)
        #[arg(long)]
        strategy: Option<Strategy>,
        /// Relationship filter TYPE[:out|in|both], repeatable
        #[arg(long = "rel")]
        rels: Vec<RelationshipFilter>,
        #[arg(long)]
        uniqueness: Option<Uniqueness>,
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Bidirectional search between two nodes
    Connect {
        from: String,
        to: String,
        #[arg(long = "rel")]
        rels: Vec<RelationshipFilter>,
        #[arg(long)]
        max_steps: Option<usize>,
        /// alternating or level
        #[arg(long)]
        selector: Option<SideSelector>,
    },
    /// Nodes reachable from FROM that lie within a few hops of TO
    Near {
        from: String,
        to: String,
        #[arg(long = "rel")]
        rels: Vec<RelationshipFilter>,
        #[arg(long, default_value_t = 1)]
        hops: u32,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;
    init_tracing(cli.log_level.as_deref().unwrap_or(&config.log.level));

    let graph_path = cli
        .graph
        .clone()
        .or_else(|| config.graph.path.clone())
        .context("no graph file: pass --graph or set [graph] path in the config")?;
    let graph = load_graph(&graph_path, config.graph.key_property.as_deref())?;
    let node = |reference: &str| {
        resolve_node(&graph, reference).with_context(|| format!("resolving node '{}'", reference))
    };

    let report: Report = match cli.command {
        Command::Seen { user, args } => commands::seen(&graph, node(&user)?, &args.seen_rel)?,
        Command::Recommend { user, args } => {
            commands::recommend(&graph, node(&user)?, &args.friend_rel, &args.seen.seen_rel)?
        }
        Command::FriendsSeen { user, args } => {
            commands::friends_seen(&graph, node(&user)?, &args.friend_rel, &args.seen.seen_rel)?
        }
        Command::Walk {
            start,
            strategy,
            rels,
            uniqueness,
            max_depth,
        } => {
            let mut opts = WalkOptions::from(&config.traversal);
            opts.rels = rels;
            opts.strategy = strategy.unwrap_or(opts.strategy);
            opts.uniqueness = uniqueness.unwrap_or(opts.uniqueness);
            opts.max_depth = max_depth.or(opts.max_depth);
            commands::walk(&graph, node(&start)?, &opts)?
        }
        Command::Connect {
            from,
            to,
            rels,
            max_steps,
            selector,
        } => {
            let mut opts = ConnectOptions::new(&config.traversal, &config.bidirectional);
            opts.rels = rels;
            opts.max_steps = max_steps.unwrap_or(opts.max_steps);
            opts.selector = selector.unwrap_or(opts.selector);
            commands::connect(&graph, node(&from)?, node(&to)?, &opts)?
        }
        Command::Near {
            from,
            to,
            rels,
            hops,
        } => commands::near(&graph, node(&from)?, node(&to)?, &rels, hops)?,
    };

    debug!(results = report.len(), "command finished");
    let formatter = PathFormatter::with_property(config.graph.label_property.as_str());
    let out = report.render(&graph, &formatter, cli.json)?;
    if !out.is_empty() {
        println!("{}", out);
    }
    Ok(())
}
