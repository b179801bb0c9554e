
use serde_json::Value;

use crate::error::{Result, TraversalError};
use crate::graph::{Direction, GraphStore, NodeId};
use crate::path::Path;

/// Property read for node text unless configured otherwise.
pub const DEFAULT_PROPERTY: &str = "name";

enum NodeText<'a> {
    Property(String),
    Label,
    Custom(Box<dyn Fn(NodeId) -> Option<String> + Send + Sync + 'a>),
}

/// Renders paths as `John--[IS_FRIEND_OF]-->Jane<--[KNOWS]--Bob`.
///
/// Relationships followed along their stored direction render as
/// `--[TYPE]-->`, against it as `<--[TYPE]--`.
pub struct PathFormatter<'a> {
    node_text: NodeText<'a>,
}

impl Default for PathFormatter<'_> {
    fn default() -> Self {
        Self::with_property(DEFAULT_PROPERTY)
    }
}

impl<'a> PathFormatter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node text from a property; a node without it is a
    /// [`TraversalError::MissingProperty`].
    pub fn with_property(key: impl Into<String>) -> Self {
        Self {
            node_text: NodeText::Property(key.into()),
        }
    }

    /// Node text from the node's label.
    pub fn by_label() -> Self {
        Self {
            node_text: NodeText::Label,
        }
    }

    /// Node text from a caller-supplied selector. `None` reports a missing
    /// property named `"<custom>"`.
    pub fn with_selector(selector: impl Fn(NodeId) -> Option<String> + Send + Sync + 'a) -> Self {
        Self {
            node_text: NodeText::Custom(Box::new(selector)),
        }
    }

    pub fn format<G: GraphStore + ?Sized>(&self, store: &G, path: &Path) -> Result<String> {
        let mut out = self.node_text(store, path.start_node())?;
        for step in path.steps() {
            let rel = step.relationship;
            let name = match store.rel_type_name(rel.rel_type) {
                Some(name) => name.to_string(),
                None => format!("#{}", rel.rel_type),
            };
            let (head, tail) = match step.direction() {
                Direction::Outgoing => ("--[", "]-->"),
                Direction::Incoming => ("<--[", "]--"),
            };
            out.push_str(head);
            out.push_str(&name);
            out.push_str(tail);
            out.push_str(&self.node_text(store, step.node)?);
        }
        Ok(out)
    }

    /// One formatted path per line.
    pub fn format_all<'p, G: GraphStore + ?Sized>(
        &self,
        store: &G,
        paths: impl IntoIterator<Item = &'p Path>,
    ) -> Result<String> {
        let lines = paths
            .into_iter()
            .map(|p| self.format(store, p))
            .collect::<Result<Vec<_>>>()?;
        Ok(lines.join("\n"))
    }

    fn node_text<G: GraphStore + ?Sized>(&self, store: &G, node: NodeId) -> Result<String> {
        let text = match &self.node_text {
            NodeText::Property(key) => store.node_property(node, key).map(value_text),
            NodeText::Label => store.node_label(node).map(str::to_string),
            NodeText::Custom(selector) => selector(node),
        };
        text.ok_or_else(|| TraversalError::MissingProperty {
            node,
            key: match &self.node_text {
                NodeText::Property(key) => key.clone(),
                NodeText::Label => "<label>".to_string(),
                NodeText::Custom(_) => "<custom>".to_string(),
            },
        })
    }
}

/// Strings print bare; anything else as JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, RelationshipRef};
    use serde_json::json;

    fn named_graph() -> Graph {
        let mut g = Graph::new();
        for (id, name) in [(0, "John"), (1, "Jane"), (2, "Bob")] {
            g.add_node(id, "User".into(), None);
            g.set_node_property(id, "name", json!(name));
        }
        g.add_node(3, "Movie".into(), None);
        g.set_node_property(3, "year", json!(1996));
        let friend = g.intern_rel_type("IS_FRIEND_OF");
        let knows = g.intern_rel_type("KNOWS");
        g.add_relationship(0, 1, friend).unwrap();
        g.add_relationship(2, 1, knows).unwrap();
        g.add_relationship(2, 3, knows).unwrap();
        g
    }

    fn rel(g: &Graph, id: u64) -> RelationshipRef {
        g.relationship(id).unwrap()
    }

    #[test]
    fn test_single_node_is_just_the_name() {
        let g = named_graph();
        let s = PathFormatter::new().format(&g, &Path::single(0)).unwrap();
        assert_eq!(s, "John");
    }

    #[test]
    fn test_directions_rendered() {
        let g = named_graph();
        let path = Path::single(0).extend(rel(&g, 0)).extend(rel(&g, 1));
        let s = PathFormatter::new().format(&g, &path).unwrap();
        assert_eq!(s, "John--[IS_FRIEND_OF]-->Jane<--[KNOWS]--Bob");
    }

    #[test]
    fn test_missing_property() {
        let g = named_graph();
        let path = Path::single(2).extend(rel(&g, 2));
        let err = PathFormatter::new().format(&g, &path).unwrap_err();
        assert_eq!(
            err,
            TraversalError::MissingProperty {
                node: 3,
                key: "name".into()
            }
        );
    }

    #[test]
    fn test_other_node_text_sources() {
        let g = named_graph();
        let path = Path::single(2).extend(rel(&g, 2));
        assert_eq!(
            PathFormatter::by_label().format(&g, &path).unwrap(),
            "User--[KNOWS]-->Movie"
        );
        assert_eq!(
            PathFormatter::with_property("year").format(&g, &Path::single(3)).unwrap(),
            "1996"
        );
        let ids = PathFormatter::with_selector(|n| Some(format!("n{}", n)));
        assert_eq!(ids.format(&g, &path).unwrap(), "n2--[KNOWS]-->n3");
        let none = PathFormatter::with_selector(|_| None);
        assert!(matches!(
            none.format(&g, &path),
            Err(TraversalError::MissingProperty { node: 2, .. })
        ));
    }

    #[test]
    fn test_format_all() {
        let g = named_graph();
        let paths = [Path::single(0), Path::single(0).extend(rel(&g, 0))];
        let s = PathFormatter::new().format_all(&g, &paths).unwrap();
        assert_eq!(s, "John\nJohn--[IS_FRIEND_OF]-->Jane");
    }
}
