use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use graph_walk_core::{SideSelector, Strategy, Uniqueness, DEFAULT_MAX_STEPS, DEFAULT_PROPERTY};
use serde::{Deserialize, Serialize};

/// Settings read from a TOML file. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub graph: GraphConfig,
    pub traversal: TraversalConfig,
    pub bidirectional: BidirectionalConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    /// JSON graph file. Relative paths resolve against the config file.
    pub path: Option<PathBuf>,
    /// Property that doubles as the lookup key for nodes without one.
    pub key_property: Option<String>,
    /// Property printed for each node in formatted paths.
    pub label_property: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            path: None,
            key_property: None,
            label_property: DEFAULT_PROPERTY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraversalConfig {
    pub strategy: Strategy,
    pub uniqueness: Uniqueness,
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BidirectionalConfig {
    pub max_steps: usize,
    pub selector: SideSelector,
}

impl Default for BidirectionalConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            selector: SideSelector::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;

        if let (Some(graph), Some(dir)) = (&config.graph.path, path.parent()) {
            if graph.is_relative() {
                config.graph.path = Some(dir.join(graph));
            }
        }
        Ok(config)
    }

    /// `Config::load` if a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("failed to write config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.graph.label_property, "name");
        assert_eq!(c.traversal.strategy, Strategy::DepthFirst);
        assert_eq!(c.traversal.uniqueness, Uniqueness::NodeGlobal);
        assert_eq!(c.bidirectional.max_steps, 100);
        assert_eq!(c.bidirectional.selector, SideSelector::Alternating);
        assert_eq!(c.log.level, "warn");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let c: Config = toml::from_str(
            r#"
            [traversal]
            strategy = "breadth_first"
            uniqueness = "node_path"

            [bidirectional]
            selector = "level"
            "#,
        )
        .unwrap();
        assert_eq!(c.traversal.strategy, Strategy::BreadthFirst);
        assert_eq!(c.traversal.uniqueness, Uniqueness::NodePath);
        assert_eq!(c.traversal.max_depth, None);
        assert_eq!(c.bidirectional.selector, SideSelector::Level);
        assert_eq!(c.bidirectional.max_steps, 100);
        assert_eq!(c.graph, GraphConfig::default());
    }

    #[test]
    fn test_rejects_unknown_values() {
        assert!(toml::from_str::<Config>("[traversal]\nstrategy = \"random\"").is_err());
        assert!(toml::from_str::<Config>("[traversal]\ndepth = 3").is_err());
    }

    #[test]
    fn test_load_resolves_graph_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph-walk.toml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "[graph]\npath = \"data/movies.json\"\n\n[log]\nlevel = \"debug\"").unwrap();

        let c = Config::load(&path).unwrap();
        assert_eq!(c.graph.path, Some(dir.path().join("data/movies.json")));
        assert_eq!(c.log.level, "debug");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.toml");
        let mut c = Config::default();
        c.traversal.max_depth = Some(4);
        c.bidirectional.max_steps = 12;
        c.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), c);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Config::load("/nonexistent/graph-walk.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }
}
