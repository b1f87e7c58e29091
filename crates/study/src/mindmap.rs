use std::collections::HashSet;
use std::fmt::Write as _;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::reply::parse_json_reply;

static SNAKE_CASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9]*(?:_[a-z0-9]+)*$").expect("snake case regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindNode {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindEdge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: String,
}

/// Node/edge graph derived from the lecture summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMap {
    pub nodes: Vec<MindNode>,
    #[serde(default)]
    pub edges: Vec<MindEdge>,
}

impl MindMap {
    /// Parses and validates a model reply.
    pub fn parse(raw: &str) -> Result<Self> {
        let map: MindMap = parse_json_reply(raw, "mind map")?;
        map.validate()?;
        Ok(map)
    }

    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(anyhow!("mind map has no nodes"));
        }
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !SNAKE_CASE_RE.is_match(&node.id) {
                return Err(anyhow!(format!("node id {:?} is not snake_case", node.id)));
            }
            if !ids.insert(node.id.as_str()) {
                return Err(anyhow!(format!("duplicate node id {}", node.id)));
            }
        }
        for edge in &self.edges {
            for end in [&edge.from, &edge.to] {
                if !ids.contains(end.as_str()) {
                    return Err(anyhow!(format!(
                        "edge {} -> {} references unknown node {end}",
                        edge.from, edge.to
                    )));
                }
            }
        }
        Ok(())
    }

    /// Graphviz DOT source for the map.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph mindmap {\n");
        for node in &self.nodes {
            let _ = writeln!(out, "    \"{}\" [label=\"{}\"];", node.id, escape(&node.label));
        }
        for edge in &self.edges {
            if edge.label.is_empty() {
                let _ = writeln!(out, "    \"{}\" -> \"{}\";", edge.from, edge.to);
            } else {
                let _ = writeln!(
                    out,
                    "    \"{}\" -> \"{}\" [label=\"{}\"];",
                    edge.from,
                    edge.to,
                    escape(&edge.label)
                );
            }
        }
        out.push_str("}\n");
        out
    }
}

fn escape(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, label: &str) -> MindNode {
        MindNode {
            id: id.to_string(),
            label: label.to_string(),
        }
    }

    fn edge(from: &str, to: &str) -> MindEdge {
        MindEdge {
            from: from.to_string(),
            to: to.to_string(),
            label: "enthält".to_string(),
        }
    }

    #[test]
    fn parses_reply_and_renders_dot() {
        let raw = r#"```json
{"nodes": [{"id": "sortieren", "label": "Sortieren"}, {"id": "quick_sort", "label": "Quick \"Sort\""}],
 "edges": [{"from": "sortieren", "to": "quick_sort", "label": "Beispiel"}]}
```"#;
        let map = MindMap::parse(raw).unwrap();
        assert_eq!(
            map.to_dot(),
            "digraph mindmap {\n    \"sortieren\" [label=\"Sortieren\"];\n    \"quick_sort\" [label=\"Quick \\\"Sort\\\"\"];\n    \"sortieren\" -> \"quick_sort\" [label=\"Beispiel\"];\n}\n"
        );
    }

    #[test]
    fn edge_label_is_optional() {
        let map: MindMap = serde_json::from_str(
            r#"{"nodes":[{"id":"a","label":"A"},{"id":"b","label":"B"}],"edges":[{"from":"a","to":"b"}]}"#,
        )
        .unwrap();
        map.validate().unwrap();
        assert!(map.to_dot().contains("    \"a\" -> \"b\";\n"));
    }

    #[test]
    fn keyword_ids_stay_nodes() {
        let map = MindMap {
            nodes: vec![node("node", "Knoten"), node("graph", "Graph")],
            edges: vec![edge("graph", "node")],
        };
        map.validate().unwrap();
        let dot = map.to_dot();
        assert!(dot.contains("    \"node\" [label=\"Knoten\"];\n"));
        assert!(dot.contains("    \"graph\" -> \"node\" [label=\"enthält\"];\n"));
    }

    #[test]
    fn rejects_bad_ids_duplicates_and_dangling_edges() {
        let bad_id = MindMap {
            nodes: vec![node("Quick Sort", "x")],
            edges: vec![],
        };
        assert!(bad_id.validate().is_err());

        let duplicate = MindMap {
            nodes: vec![node("a", "x"), node("a", "y")],
            edges: vec![],
        };
        assert!(duplicate.validate().is_err());

        let dangling = MindMap {
            nodes: vec![node("a", "x")],
            edges: vec![edge("a", "b")],
        };
        let err = dangling.validate().unwrap_err();
        assert!(err.to_string().contains("unknown node b"));

        assert!(MindMap::default().validate().is_err());
    }
}
