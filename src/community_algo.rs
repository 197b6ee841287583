use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;

use crate::config::DetectorConfig;
use crate::error::{AnalysisError, Outcome};
use crate::graph::{Graph, VIdx};
use crate::types::CommunityId;

/// Mapping of node id to community id.
/// Nodes without a community (isolated, filtered as noise, or a degraded run) are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    assignment: BTreeMap<String, CommunityId>,
    community_count: usize,
}

impl Partition {
    pub fn community_of(&self, id: &str) -> Option<CommunityId> {
        self.assignment.get(id).copied()
    }

    /// Number of assigned nodes.
    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    /// Number of distinct communities, ids run from 0 to this value.
    pub fn community_count(&self) -> usize {
        self.community_count
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, CommunityId)> + '_ {
        self.assignment.iter().map(|(id, com)| (id.as_str(), *com))
    }

    /// Members of every community, each list sorted by node id.
    pub fn communities(&self) -> BTreeMap<CommunityId, Vec<&str>> {
        let mut communities = BTreeMap::<CommunityId, Vec<&str>>::new();
        for (id, com) in self.iter() {
            communities.entry(com).or_default().push(id);
        }
        communities
    }
}

/// Result of a detector run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub partition: Partition,
    pub modularity: f64, // Q of the final partition on the original graph.
    pub levels: usize, // Aggregations performed.
}

// Weighted graph of one aggregation level.
// Level 0 mirrors the graph store with unit weights.
#[derive(Debug, Clone, Default)]
struct LevelGraph {
    topology: Vec<BTreeMap<VIdx, f64>>, // Neighbor -> edge weight, never a self entry.
    inner_weight: Vec<f64>, // Twice the edge weight folded inside each vertex.
    total_weight: f64, // m, identical on every level.
}

impl LevelGraph {
    fn from_graph(graph: &Graph) -> LevelGraph {
        let topology: Vec<BTreeMap<VIdx, f64>> = (0..graph.node_count())
            .map(|v| graph.neighbors(v).map(|u| (u, 1.0)).collect::<BTreeMap<_, _>>())
            .collect();
        LevelGraph {
            topology,
            inner_weight: vec![0.0; graph.node_count()],
            total_weight: graph.edge_count() as f64,
        }
    }

    fn size(&self) -> usize {
        self.topology.len()
    }

    fn degree(&self, vertex: VIdx) -> f64 {
        self.topology[vertex].values().sum::<f64>() + self.inner_weight[vertex]
    }

    /// Collapse every community into one vertex.
    fn zoom_out(&self, membership: &[CommunityId], community_count: usize) -> LevelGraph {
        let mut topology = vec![BTreeMap::<VIdx, f64>::new(); community_count];
        let mut inner_weight = vec![0.0f64; community_count];
        for (vertex, neighbors) in self.topology.iter().enumerate() {
            let com = membership[vertex];
            inner_weight[com] += self.inner_weight[vertex];
            for (&neighbor, &weight) in neighbors {
                let adj_com = membership[neighbor];
                if adj_com == com {
                    // Seen from both endpoints, so this adds up to twice the weight.
                    inner_weight[com] += weight;
                } else {
                    *topology[com].entry(adj_com).or_insert(0.0) += weight;
                }
            }
        }
        LevelGraph {
            topology,
            inner_weight,
            total_weight: self.total_weight,
        }
    }
}

// Community assignment of the vertices of one level during a local pass.
struct CommunityStructure {
    vertex_community_map: Vec<CommunityId>, // Locate the community of a vertex.
    weight_list: Vec<f64>, // Vertex degree, one per vertex.
    weight_sum: Vec<f64>, // Total degree inside each community.
}

impl CommunityStructure {
    fn singletons(level: &LevelGraph) -> CommunityStructure {
        let weight_list: Vec<f64> = (0..level.size()).map(|v| level.degree(v)).collect();
        CommunityStructure {
            vertex_community_map: (0..level.size()).collect(),
            weight_sum: weight_list.clone(),
            weight_list,
        }
    }

    /// Edge weight from `vertex` into each neighboring community,
    /// in order of the first neighbor met.
    fn connections(&self, level: &LevelGraph, vertex: VIdx) -> Vec<(CommunityId, f64)> {
        let mut connections: Vec<(CommunityId, f64)> = Vec::new();
        let mut position = HashMap::<CommunityId, usize>::new();
        for (&neighbor, &weight) in &level.topology[vertex] {
            let com = self.vertex_community_map[neighbor];
            match position.get(&com) {
                Some(&slot) => connections[slot].1 += weight,
                None => {
                    position.insert(com, connections.len());
                    connections.push((com, weight));
                }
            }
        }
        connections
    }

    fn move_vertex_to(&mut self, vertex: VIdx, to: CommunityId) {
        let from = self.vertex_community_map[vertex];
        self.weight_sum[from] -= self.weight_list[vertex];
        self.weight_sum[to] += self.weight_list[vertex];
        self.vertex_community_map[vertex] = to;
    }

    /// Dense community ids in order of first appearance.
    fn renumber(&self) -> (Vec<CommunityId>, usize) {
        let mut dense = HashMap::<CommunityId, CommunityId>::new();
        let membership: Vec<CommunityId> = self
            .vertex_community_map
            .iter()
            .map(|com| {
                let next = dense.len();
                *dense.entry(*com).or_insert(next)
            })
            .collect();
        (membership, dense.len())
    }
}

/// Greedy modularity optimization with aggregation (Louvain).
pub struct Louvain {
    config: DetectorConfig,
}

impl Default for Louvain {
    fn default() -> Self {
        Louvain::new(DetectorConfig::default())
    }
}

impl Louvain {
    pub fn new(config: DetectorConfig) -> Louvain {
        Louvain { config }
    }

    /// Detect communities, degrading to an empty partition on internal failure.
    pub fn detect(&self, graph: &Graph) -> Outcome<Detection> {
        Outcome::fail_soft("community detection", || self.try_detect(graph), Detection::default)
    }

    pub fn try_detect(&self, graph: &Graph) -> Result<Detection, AnalysisError> {
        if graph.edge_count() == 0 {
            // Every node is isolated, nothing to group.
            return Ok(Detection::default());
        }

        let mut level = LevelGraph::from_graph(graph);
        let mut chain: Vec<Vec<CommunityId>> = Vec::new();
        for depth in 0..self.config.max_levels {
            let mut cs = CommunityStructure::singletons(&level);
            if !self.local_pass(&level, &mut cs, depth)? {
                break;
            }
            let (membership, community_count) = cs.renumber();
            log::debug!("Zooming out at level {}: {} vertices into {} communities",
                        depth, level.size(), community_count);
            let shrunk = community_count < level.size();
            level = level.zoom_out(&membership, community_count);
            chain.push(membership);
            if !shrunk {
                break;
            }
        }

        let membership = unroll(graph.node_count(), &chain)?;
        let modularity = final_q(graph, &membership, self.config.resolution);
        let partition = self.fill_partition(graph, &membership);
        log::debug!("Detected {} communities over {} levels, modularity {:.4}",
                    partition.community_count(), chain.len(), modularity);
        Ok(Detection {
            partition,
            modularity,
            levels: chain.len(),
        })
    }

    /// Sweep the vertices in order until nothing moves or the sweep cap is hit.
    /// Returns whether any vertex changed community.
    fn local_pass(&self, level: &LevelGraph, cs: &mut CommunityStructure, depth: usize)
        -> Result<bool, AnalysisError> {
        let mut some_change = false;
        for _ in 0..self.config.max_sweeps {
            let mut local_change = false;
            for vertex in 0..level.size() {
                if let Some(best_community) = self.update_best_community(level, cs, vertex, depth)? {
                    cs.move_vertex_to(vertex, best_community);
                    local_change = true;
                }
            }
            some_change |= local_change;
            if !local_change {
                break;
            }
        }
        Ok(some_change)
    }

    /// The community `vertex` should move to, if any beats its current one.
    fn update_best_community(&self, level: &LevelGraph, cs: &CommunityStructure,
                             vertex: VIdx, depth: usize) -> Result<Option<CommunityId>, AnalysisError> {
        let current = cs.vertex_community_map[vertex];
        let vertex_weight = cs.weight_list[vertex];
        let connections = cs.connections(level, vertex);

        let edges_to_current = connections
            .iter()
            .find(|(com, _)| *com == current)
            .map_or(0.0, |(_, weight)| *weight);
        // Staying is scored with the vertex taken out of its own community.
        let mut best = self.q(edges_to_current, cs.weight_sum[current] - vertex_weight,
                              vertex_weight, level.total_weight);
        if !best.is_finite() {
            return Err(AnalysisError::NonFiniteGain { node: vertex, level: depth });
        }

        let mut best_community = None;
        for (com, edges_to) in connections {
            if com == current {
                continue;
            }
            let q_value = self.q(edges_to, cs.weight_sum[com], vertex_weight, level.total_weight);
            if !q_value.is_finite() {
                return Err(AnalysisError::NonFiniteGain { node: vertex, level: depth });
            }
            if q_value > best + self.config.min_gain {
                best = q_value;
                best_community = Some(com);
            }
        }
        Ok(best_community)
    }

    /// Modularity gain of joining a community, scaled by m.
    fn q(&self, edges_to: f64, weight_sum: f64, vertex_weight: f64, total_weight: f64) -> f64 {
        edges_to - self.config.resolution * weight_sum * vertex_weight / (2.0 * total_weight)
    }

    /// Drop isolated vertices and noise communities, then number the rest densely.
    fn fill_partition(&self, graph: &Graph, membership: &[CommunityId]) -> Partition {
        let sizes = membership.iter().counts();

        let mut dense = HashMap::<CommunityId, CommunityId>::new();
        let mut assignment = BTreeMap::new();
        for (vertex, com) in membership.iter().enumerate() {
            if graph.degree_of(vertex) == 0 || sizes[&com] <= self.config.noise {
                continue;
            }
            let next = dense.len();
            let dense_id = *dense.entry(*com).or_insert(next);
            assignment.insert(graph.node_id(vertex).to_string(), dense_id);
        }
        Partition {
            assignment,
            community_count: dense.len(),
        }
    }
}

/// Follow the aggregation chain down to the original vertices.
fn unroll(vertex_count: usize, chain: &[Vec<CommunityId>]) -> Result<Vec<CommunityId>, AnalysisError> {
    let mut membership: Vec<CommunityId> = (0..vertex_count).collect();
    for (level, level_map) in chain.iter().enumerate() {
        for (vertex, com) in membership.iter_mut().enumerate() {
            *com = *level_map
                .get(*com)
                .ok_or(AnalysisError::BrokenLevelChain { node: vertex, level })?;
        }
    }
    Ok(membership)
}

fn final_q(graph: &Graph, membership: &[CommunityId], resolution: f64) -> f64 {
    let total_weight = graph.edge_count() as f64;
    if total_weight == 0.0 {
        return 0.0;
    }
    let mut internal = BTreeMap::<CommunityId, f64>::new();
    let mut degrees = BTreeMap::<CommunityId, f64>::new();
    for (u, v) in graph.edges() {
        if membership[u] == membership[v] {
            *internal.entry(membership[u]).or_insert(0.0) += 1.0;
        }
    }
    for (vertex, com) in membership.iter().enumerate() {
        *degrees.entry(*com).or_insert(0.0) += graph.degree_of(vertex) as f64;
    }
    degrees
        .iter()
        .map(|(com, degree)| {
            let inside = internal.get(com).copied().unwrap_or(0.0);
            inside / total_weight - resolution * (degree / (2.0 * total_weight)).powi(2)
        })
        .sum()
}

/// Modularity of a partition; unassigned nodes count as singleton communities.
pub fn modularity(graph: &Graph, partition: &Partition, resolution: f64) -> f64 {
    let offset = partition.community_count();
    let membership: Vec<CommunityId> = (0..graph.node_count())
        .map(|v| partition.community_of(graph.node_id(v)).unwrap_or(offset + v))
        .collect();
    final_q(graph, &membership, resolution)
}

/// Detect communities with the default configuration.
pub fn detect(graph: &Graph) -> Outcome<Partition> {
    match Louvain::default().detect(graph) {
        Outcome::Computed(detection) => Outcome::Computed(detection.partition),
        Outcome::Degraded { value, reason } => Outcome::Degraded { value: value.partition, reason },
    }
}
