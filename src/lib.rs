//! Structural analysis of a relational network for visualization.
//!
//! Raw nodes and links are deduplicated into a simple undirected [`Graph`], then
//! partitioned into communities (Louvain) and scored by betweenness centrality (Brandes).
//! Both results are joined into an [`AnalyzedGraph`] ready for a renderer.

use std::time::Duration;

use serde::Serialize;

pub mod centrality;
pub mod color;
pub mod community_algo;
pub mod config;
pub mod error;
pub mod graph;
pub mod logger;
pub mod merge;
pub mod timeout;
pub mod types;

pub use crate::centrality::{Brandes, CentralityScores};
pub use crate::color::{ColorAssigner, ColorMap, LightPalette};
pub use crate::community_algo::{Detection, Louvain, Partition};
pub use crate::config::{AnalysisConfig, CentralityConfig, DetectorConfig};
pub use crate::error::{AnalysisError, Outcome};
pub use crate::graph::{Graph, IngestStats};
pub use crate::types::{AnalyzedGraph, AnalyzedLink, AnalyzedNode, NetworkInput, RawLink, RawNode};

/// Summary of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub nodes: usize,
    pub edges: usize,
    pub communities: usize,
    pub modularity: f64,
    pub levels: usize,
    pub ingest: IngestStats,
    pub community_degraded: Option<String>, // Reason, when detection fell back.
    pub centrality_degraded: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub graph: AnalyzedGraph,
    pub report: AnalysisReport,
}

/// Analyze with the default configuration.
pub fn analyze(nodes: &[RawNode], links: &[RawLink]) -> AnalyzedGraph {
    analyze_with(nodes, links, &AnalysisConfig::default()).graph
}

pub fn analyze_with(nodes: &[RawNode], links: &[RawLink], config: &AnalysisConfig) -> Analysis {
    let graph = Graph::build(nodes, links);
    let detector = Louvain::new(config.detector.clone());
    let calculator = Brandes::new(config.centrality.clone());

    let (detection, centrality) = if config.parallel {
        rayon::join(|| detector.detect(&graph), || calculator.compute(&graph))
    } else {
        (detector.detect(&graph), calculator.compute(&graph))
    };

    let report = AnalysisReport {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        communities: detection.value().partition.community_count(),
        modularity: detection.value().modularity,
        levels: detection.value().levels,
        ingest: graph.stats(),
        community_degraded: detection.reason().map(|reason| reason.to_string()),
        centrality_degraded: centrality.reason().map(|reason| reason.to_string()),
    };
    log::info!("Analyzed {} nodes and {} edges: {} communities, modularity {:.4}",
               report.nodes, report.edges, report.communities, report.modularity);

    let analyzed = merge::merge(&graph, &detection.value().partition, centrality.value(), &LightPalette);
    Analysis { graph: analyzed, report }
}

/// Analyze on a worker thread, giving up after `deadline`.
pub fn analyze_with_deadline(input: NetworkInput, config: AnalysisConfig, deadline: Duration)
    -> Result<Analysis, AnalysisError> {
    timeout::run_with_deadline(move || analyze_with(&input.nodes, &input.links, &config), deadline)
}
