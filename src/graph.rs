use std::collections::{BTreeSet, HashMap};

use crate::types::{Attributes, RawLink, RawNode};

/// Dense index of a node inside a [`Graph`], following the canonical node order.
pub type VIdx = usize;

/// Input silently skipped while building a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct IngestStats {
    pub duplicate_nodes: usize, // Node ids seen before, later attributes ignored.
    pub duplicate_links: usize, // Same unordered pair seen before.
    pub self_loops: usize, // Links with source == target.
    pub dangling_links: usize, // Links naming an unknown node.
}

impl IngestStats {
    pub fn skipped(&self) -> usize {
        self.duplicate_nodes + self.duplicate_links + self.self_loops + self.dangling_links
    }
}

// Canonical undirected simple graph built from raw input.
// Never mutated after `build`.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    ids: Vec<String>, // Node ids in canonical order.
    index: HashMap<String, VIdx>, // Locate the index of a node id.
    attrs: Vec<Attributes>, // Owned copy of the surviving attributes.
    adj: Vec<BTreeSet<VIdx>>, // Symmetric adjacency, one set per node.
    edges: Vec<(VIdx, VIdx)>, // Accepted edges in acceptance order.
    edge_attrs: Vec<Attributes>, // Extra fields of the link that introduced each edge.
    stats: IngestStats,
}

impl Graph {
    /// Build the graph, skipping duplicates, self-loops and links to unknown nodes.
    pub fn build(raw_nodes: &[RawNode], raw_links: &[RawLink]) -> Graph {
        let mut graph = Graph::default();

        for node in raw_nodes {
            if graph.contains(&node.id) {
                graph.stats.duplicate_nodes += 1;
                continue;
            }
            let mut attrs = node.attributes.clone();
            attrs.remove("id");
            graph.index.insert(node.id.clone(), graph.ids.len());
            graph.ids.push(node.id.clone());
            graph.attrs.push(attrs);
            graph.adj.push(BTreeSet::new());
        }

        for link in raw_links {
            let (u, v) = match (graph.index.get(&link.source), graph.index.get(&link.target)) {
                (Some(&u), Some(&v)) => (u, v),
                _ => {
                    graph.stats.dangling_links += 1;
                    continue;
                }
            };
            if u == v {
                graph.stats.self_loops += 1;
                continue;
            }
            if graph.adj[u].contains(&v) {
                graph.stats.duplicate_links += 1;
                continue;
            }
            graph.adj[u].insert(v);
            graph.adj[v].insert(u);
            graph.edges.push((u, v));
            graph.edge_attrs.push(link.attributes.clone());
        }

        if graph.stats.skipped() > 0 {
            log::debug!("Ingest skipped {} records: {:?}", graph.stats.skipped(), graph.stats);
        }
        graph
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn index_of(&self, id: &str) -> Option<VIdx> {
        self.index.get(id).copied()
    }

    pub fn node_id(&self, v: VIdx) -> &str {
        &self.ids[v]
    }

    /// Node ids in canonical order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.ids.iter().map(String::as_str)
    }

    pub fn attributes(&self, v: VIdx) -> &Attributes {
        &self.attrs[v]
    }

    /// Neighbors of `v` in ascending index order.
    pub fn neighbors(&self, v: VIdx) -> impl Iterator<Item = VIdx> + '_ {
        self.adj[v].iter().copied()
    }

    pub fn has_edge(&self, u: VIdx, v: VIdx) -> bool {
        self.adj.get(u).map_or(false, |neighbors| neighbors.contains(&v))
    }

    /// Degree of a node id, 0 for an unknown id.
    pub fn degree(&self, id: &str) -> usize {
        self.index_of(id).map_or(0, |v| self.degree_of(v))
    }

    pub fn degree_of(&self, v: VIdx) -> usize {
        self.adj[v].len()
    }

    /// Accepted edges in acceptance order.
    pub fn edges(&self) -> impl Iterator<Item = (VIdx, VIdx)> + '_ {
        self.edges.iter().copied()
    }

    /// Accepted edges with the attributes of the first link naming them.
    pub fn links(&self) -> impl Iterator<Item = (VIdx, VIdx, &Attributes)> + '_ {
        self.edges.iter().zip(&self.edge_attrs).map(|(&(u, v), attrs)| (u, v, attrs))
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }
}

#[cfg(test)]
mod test_graph {
    use serde_json::json;

    use crate::graph::Graph;
    use crate::types::{RawLink, RawNode};

    fn nodes(ids: &[&str]) -> Vec<RawNode> {
        ids.iter().map(|id| RawNode::new(*id)).collect()
    }

    #[test]
    fn test_self_loop_rejected() {
        let graph = Graph::build(&nodes(&["X"]), &[RawLink::new("X", "X")]);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.degree("X"), 0);
        assert_eq!(graph.stats().self_loops, 1);
    }

    #[test]
    fn test_duplicate_edges_collapsed() {
        let links = vec![RawLink::new("A", "B"), RawLink::new("A", "B"), RawLink::new("B", "A")];
        let graph = Graph::build(&nodes(&["A", "B"]), &links);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.degree("A"), 1);
        assert_eq!(graph.degree("B"), 1);
        assert_eq!(graph.stats().duplicate_links, 2);
    }

    #[test]
    fn test_duplicate_node_first_wins() {
        let raw = vec![
            RawNode::new("A").with_attr("label", "first"),
            RawNode::new("B"),
            RawNode::new("A").with_attr("label", "second"),
        ];
        let graph = Graph::build(&raw, &[]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.node_ids().collect::<Vec<_>>(), vec!["A", "B"]);
        let a = graph.index_of("A").unwrap();
        assert_eq!(graph.attributes(a).get("label"), Some(&json!("first")));
        assert_eq!(graph.stats().duplicate_nodes, 1);
        assert!(graph.contains("A"));
        assert!(!graph.contains("C"));
    }

    #[test]
    fn test_link_attributes_first_wins() {
        let links = vec![
            RawLink::new("A", "B").with_attr("weight", 2),
            RawLink::new("B", "A").with_attr("weight", 5),
            RawLink::new("B", "C"),
        ];
        let graph = Graph::build(&nodes(&["A", "B", "C"]), &links);
        let attrs: Vec<_> = graph.links().map(|(_, _, attrs)| attrs.get("weight").cloned()).collect();
        assert_eq!(attrs, vec![Some(json!(2)), None]);
    }

    #[test]
    fn test_dangling_link_dropped() {
        let graph = Graph::build(&nodes(&["A"]), &[RawLink::new("A", "Z"), RawLink::new("Q", "A")]);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.stats().dangling_links, 2);
        assert_eq!(graph.degree("Z"), 0);
    }

    #[test]
    fn test_adjacency_symmetric() {
        let links = vec![
            RawLink::new("A", "B"),
            RawLink::new("B", "C"),
            RawLink::new("C", "A"),
            RawLink::new("C", "D"),
        ];
        let graph = Graph::build(&nodes(&["A", "B", "C", "D"]), &links);
        for (u, v) in graph.edges() {
            assert!(graph.has_edge(u, v) && graph.has_edge(v, u));
        }
        for v in 0..graph.node_count() {
            let incident = graph.edges().filter(|(a, b)| *a == v || *b == v).count();
            assert_eq!(graph.degree_of(v), incident);
            assert!(!graph.has_edge(v, v));
        }
        assert_eq!(graph.degree("C"), 3);
    }

    #[test]
    fn test_input_not_mutated() {
        let raw = vec![RawNode::new("A").with_attr("weight", 3)];
        let before = raw.clone();
        let graph = Graph::build(&raw, &[]);
        assert_eq!(raw, before);
        assert_eq!(graph.attributes(0).get("weight"), Some(&json!(3)));
    }

    #[test]
    fn test_empty_graph() {
        let graph = Graph::build(&[], &[]);
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.stats().skipped(), 0);
    }
}
