//! Reading graph topology from node-link or adjacency JSON and GraphML.

use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::Path,
};

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum GraphLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed graph document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("malformed graphml document: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("graphml <{element}> is missing its `{attribute}` attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("unsupported graph format `{0}` (expected .json or .graphml)")]
    UnsupportedFormat(String),
    #[error("edge references unknown node `{0}`")]
    UnknownNode(String),
    #[error("graph has no nodes")]
    Empty,
}

/// Topology without positions; node indices follow document order.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphData {
    pub labels: Vec<String>,
    pub edges: Vec<(usize, usize)>,
}

#[derive(Deserialize)]
struct GraphDocument {
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    links: Option<Vec<LinkRecord>>,
    #[serde(default)]
    edges: Option<Vec<LinkRecord>>,
    #[serde(default)]
    adjacency: Option<Vec<Vec<NodeRecord>>>,
}

#[derive(Deserialize)]
struct NodeRecord {
    id: Value,
}

#[derive(Deserialize)]
struct LinkRecord {
    source: Value,
    target: Value,
}

pub fn load_graph_file(path: &Path) -> Result<GraphData, GraphLoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let parse: fn(&str) -> Result<GraphData, GraphLoadError> = match ext.as_str() {
        "json" => parse_graph_json,
        "graphml" => parse_graphml,
        _ => {
            return Err(GraphLoadError::UnsupportedFormat(
                path.display().to_string(),
            ));
        }
    };

    let content = fs::read_to_string(path).map_err(|source| GraphLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&content)
}

pub fn parse_graph_json(content: &str) -> Result<GraphData, GraphLoadError> {
    let doc: GraphDocument = serde_json::from_str(content)?;
    if doc.nodes.is_empty() {
        return Err(GraphLoadError::Empty);
    }

    let labels: Vec<String> = doc.nodes.iter().map(|n| id_label(&n.id)).collect();
    let index: HashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(idx, label)| (label.as_str(), idx))
        .collect();
    let lookup = |id: &Value| -> Result<usize, GraphLoadError> {
        let label = id_label(id);
        index
            .get(label.as_str())
            .copied()
            .ok_or(GraphLoadError::UnknownNode(label))
    };

    let mut pairs = BTreeSet::new();
    let links = doc.links.or(doc.edges);
    if let Some(links) = links {
        for link in &links {
            insert_edge(&mut pairs, lookup(&link.source)?, lookup(&link.target)?);
        }
    } else if let Some(adjacency) = doc.adjacency {
        for (source, neighbours) in adjacency.iter().enumerate().take(labels.len()) {
            for neighbour in neighbours {
                insert_edge(&mut pairs, source, lookup(&neighbour.id)?);
            }
        }
    }

    Ok(GraphData {
        labels,
        edges: pairs.into_iter().collect(),
    })
}

/// Nodes and edges of every `<graph>` in the document; data keys are ignored.
pub fn parse_graphml(content: &str) -> Result<GraphData, GraphLoadError> {
    let doc = roxmltree::Document::parse(content)?;
    let elements = |name: &'static str| {
        doc.descendants()
            .filter(move |n| n.is_element() && n.tag_name().name() == name)
    };
    let labels = elements("node")
        .map(|n| required_attribute(n, "node", "id").map(str::to_string))
        .collect::<Result<Vec<_>, _>>()?;
    if labels.is_empty() {
        return Err(GraphLoadError::Empty);
    }
    let index: HashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(idx, label)| (label.as_str(), idx))
        .collect();
    let lookup = |id: &str| {
        index
            .get(id)
            .copied()
            .ok_or_else(|| GraphLoadError::UnknownNode(id.to_string()))
    };

    let mut pairs = BTreeSet::new();
    for edge in elements("edge") {
        let source = lookup(required_attribute(edge, "edge", "source")?)?;
        let target = lookup(required_attribute(edge, "edge", "target")?)?;
        insert_edge(&mut pairs, source, target);
    }

    Ok(GraphData {
        labels,
        edges: pairs.into_iter().collect(),
    })
}

fn required_attribute<'a>(
    node: roxmltree::Node<'a, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<&'a str, GraphLoadError> {
    node.attribute(attribute)
        .ok_or(GraphLoadError::MissingAttribute { element, attribute })
}

fn insert_edge(pairs: &mut BTreeSet<(usize, usize)>, a: usize, b: usize) {
    if a == b {
        log::debug!("dropping self loop on node {a}");
        return;
    }
    pairs.insert((a.min(b), a.max(b)));
}

fn id_label(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_node_link_with_integer_ids() {
        let doc = r#"{
            "directed": false, "multigraph": false, "graph": {},
            "nodes": [{"id": 0}, {"id": 1}, {"id": 2}],
            "links": [{"source": 0, "target": 1}, {"source": 2, "target": 1}]
        }"#;
        let data = parse_graph_json(doc).unwrap();
        assert_eq!(data.labels, vec!["0", "1", "2"]);
        assert_eq!(data.edges, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn accepts_edges_key_and_string_ids() {
        let doc = r#"{"nodes": [{"id": "a"}, {"id": "b"}],
                      "edges": [{"source": "b", "target": "a"}, {"source": "a", "target": "b"}]}"#;
        let data = parse_graph_json(doc).unwrap();
        assert_eq!(data.edges, vec![(0, 1)]);
    }

    #[test]
    fn parses_adjacency_document() {
        let doc = r#"{"nodes": [{"id": "x"}, {"id": "y"}, {"id": "z"}],
                      "adjacency": [[{"id": "y"}], [{"id": "x"}, {"id": "z"}], [{"id": "y"}]]}"#;
        let data = parse_graph_json(doc).unwrap();
        assert_eq!(data.edges, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn unknown_endpoint_is_rejected() {
        let doc = r#"{"nodes": [{"id": 0}], "links": [{"source": 0, "target": 9}]}"#;
        assert!(matches!(
            parse_graph_json(doc),
            Err(GraphLoadError::UnknownNode(id)) if id == "9"
        ));
    }

    #[test]
    fn empty_and_malformed_documents_fail() {
        assert!(matches!(
            parse_graph_json(r#"{"nodes": []}"#),
            Err(GraphLoadError::Empty)
        ));
        assert!(matches!(
            parse_graph_json("{not json"),
            Err(GraphLoadError::Parse(_))
        ));
    }

    const GRAPHML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d0" for="node" attr.name="label" attr.type="string"/>
  <graph id="G" edgedefault="undirected">
    <node id="a"><data key="d0">first</data></node>
    <node id="b"/>
    <node id="c"/>
    <edge source="a" target="b"/>
    <edge source="c" target="b"/>
    <edge source="b" target="a"/>
  </graph>
</graphml>"#;

    #[test]
    fn parses_graphml_nodes_and_edges() {
        let data = parse_graphml(GRAPHML).unwrap();
        assert_eq!(data.labels, vec!["a", "b", "c"]);
        assert_eq!(data.edges, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn malformed_graphml_fails() {
        assert!(matches!(
            parse_graphml("<graphml><graph><node id=\"a\"></graph>"),
            Err(GraphLoadError::Xml(_))
        ));
        assert!(matches!(
            parse_graphml("<graphml><graph><node id=\"a\"/><edge source=\"a\"/></graph></graphml>"),
            Err(GraphLoadError::MissingAttribute {
                element: "edge",
                attribute: "target"
            })
        ));
        assert!(matches!(
            parse_graphml("<graphml><graph/></graphml>"),
            Err(GraphLoadError::Empty)
        ));
        assert!(matches!(
            parse_graphml("<graphml><graph><node id=\"a\"/><edge source=\"a\" target=\"z\"/></graph></graphml>"),
            Err(GraphLoadError::UnknownNode(id)) if id == "z"
        ));
    }

    #[test]
    fn graphml_loads_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".GraphML").tempfile().unwrap();
        file.write_all(GRAPHML.as_bytes()).unwrap();
        let data = load_graph_file(file.path()).unwrap();
        assert_eq!(data.labels.len(), 3);
    }

    #[test]
    fn other_extensions_are_unsupported() {
        let file = tempfile::Builder::new().suffix(".gexf").tempfile().unwrap();
        assert!(matches!(
            load_graph_file(file.path()),
            Err(GraphLoadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"nodes": [{{"id": 1}}, {{"id": 2}}], "links": [{{"source": 1, "target": 2}}]}}"#).unwrap();
        let data = load_graph_file(file.path()).unwrap();
        assert_eq!(data.labels.len(), 2);
        assert_eq!(data.edges, vec![(0, 1)]);
    }
}
