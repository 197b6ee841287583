use crate::centrality::CentralityScores;
use crate::color::ColorAssigner;
use crate::community_algo::Partition;
use crate::graph::Graph;
use crate::types::{AnalyzedGraph, AnalyzedLink, AnalyzedNode, RESERVED_KEYS, UNASSIGNED_GROUP};

/// Join community, color, centrality and degree onto every node of the graph.
/// Nodes keep the canonical order; links are the accepted edges as id pairs with their own fields.
pub fn merge(
    graph: &Graph,
    partition: &Partition,
    centrality: &CentralityScores,
    colors: &impl ColorAssigner,
) -> AnalyzedGraph {
    let color_map = colors.color_map(partition);

    let nodes = (0..graph.node_count())
        .map(|v| {
            let id = graph.node_id(v);
            let mut attributes = graph.attributes(v).clone();
            for key in RESERVED_KEYS {
                attributes.remove(key);
            }
            let (group, color) = match partition.community_of(id) {
                Some(community) => {
                    // Partition ids are dense, the map covers all of them.
                    (community as i64, color_map[&community].clone())
                }
                None => (UNASSIGNED_GROUP, colors.color_for_node(id)),
            };
            AnalyzedNode {
                id: id.to_string(),
                attributes,
                group,
                color,
                centrality: centrality.score(id),
                degree: graph.degree_of(v),
            }
        })
        .collect();

    let links = graph
        .links()
        .map(|(u, v, attributes)| {
            let mut attributes = attributes.clone();
            attributes.remove("source");
            attributes.remove("target");
            AnalyzedLink {
                source: graph.node_id(u).to_string(),
                target: graph.node_id(v).to_string(),
                attributes,
            }
        })
        .collect();

    AnalyzedGraph { nodes, links }
}
