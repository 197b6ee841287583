use std::collections::{BTreeMap, VecDeque};

use rayon::prelude::*;

use crate::config::CentralityConfig;
use crate::error::{AnalysisError, Outcome};
use crate::graph::{Graph, VIdx};

/// Betweenness score per node id. Absent ids score 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CentralityScores {
    scores: BTreeMap<String, f64>,
}

impl CentralityScores {
    /// All-zero scores for every node of the graph.
    pub fn zeros(graph: &Graph) -> CentralityScores {
        CentralityScores {
            scores: graph.node_ids().map(|id| (id.to_string(), 0.0)).collect(),
        }
    }

    pub fn score(&self, id: &str) -> f64 {
        self.scores.get(id).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.scores.iter().map(|(id, score)| (id.as_str(), *score))
    }

    /// Scores divided by (n-1)(n-2)/2, the number of pairs a node can sit between.
    pub fn normalized(&self) -> CentralityScores {
        let n = self.scores.len() as f64;
        if n <= 2.0 {
            return self.clone();
        }
        let factor = 2.0 / ((n - 1.0) * (n - 2.0));
        CentralityScores {
            scores: self.scores.iter().map(|(id, score)| (id.clone(), score * factor)).collect(),
        }
    }
}

// Bookkeeping of one breadth-first traversal, reset for every source.
struct SourceState {
    distance: Vec<i64>, // -1 while undiscovered.
    sigma: Vec<f64>, // Number of shortest paths from the source.
    predecessors: Vec<Vec<VIdx>>,
    dependency: Vec<f64>,
    stack: Vec<VIdx>, // Discovery order.
    queue: VecDeque<VIdx>,
}

impl SourceState {
    fn new(node_count: usize) -> SourceState {
        SourceState {
            distance: vec![-1; node_count],
            sigma: vec![0.0; node_count],
            predecessors: vec![Vec::new(); node_count],
            dependency: vec![0.0; node_count],
            stack: Vec::with_capacity(node_count),
            queue: VecDeque::new(),
        }
    }

    fn reset(&mut self) {
        // Only the discovered nodes were touched.
        for &v in &self.stack {
            self.distance[v] = -1;
            self.sigma[v] = 0.0;
            self.predecessors[v].clear();
            self.dependency[v] = 0.0;
        }
        self.stack.clear();
        self.queue.clear();
    }

    /// Add the dependencies of every node on `source` into `betweenness`.
    fn accumulate(&mut self, graph: &Graph, source: VIdx, betweenness: &mut [f64]) {
        self.reset();
        self.distance[source] = 0;
        self.sigma[source] = 1.0;
        self.queue.push_back(source);

        while let Some(v) = self.queue.pop_front() {
            self.stack.push(v);
            for w in graph.neighbors(v) {
                // Path discovery.
                if self.distance[w] < 0 {
                    self.distance[w] = self.distance[v] + 1;
                    self.queue.push_back(w);
                }
                // Path counting.
                if self.distance[w] == self.distance[v] + 1 {
                    self.sigma[w] += self.sigma[v];
                    self.predecessors[w].push(v);
                }
            }
        }

        for &w in self.stack.iter().rev() {
            for &v in &self.predecessors[w] {
                let coeff = (self.sigma[v] / self.sigma[w]) * (1.0 + self.dependency[w]);
                self.dependency[v] += coeff;
            }
            if w != source {
                betweenness[w] += self.dependency[w];
            }
        }
    }
}

/// Brandes' betweenness centrality for unweighted undirected graphs.
pub struct Brandes {
    config: CentralityConfig,
}

impl Default for Brandes {
    fn default() -> Self {
        Brandes::new(CentralityConfig::default())
    }
}

impl Brandes {
    pub fn new(config: CentralityConfig) -> Brandes {
        Brandes { config }
    }

    /// Compute scores, degrading to all zeros on internal failure.
    pub fn compute(&self, graph: &Graph) -> Outcome<CentralityScores> {
        Outcome::fail_soft("betweenness centrality", || self.try_compute(graph),
                           || CentralityScores::zeros(graph))
    }

    pub fn try_compute(&self, graph: &Graph) -> Result<CentralityScores, AnalysisError> {
        let n = graph.node_count();
        let mut betweenness = if self.config.parallel && n > self.config.chunk_size {
            self.accumulate_parallel(graph)
        } else {
            let mut betweenness = vec![0.0f64; n];
            let mut state = SourceState::new(n);
            for source in 0..n {
                state.accumulate(graph, source, &mut betweenness);
            }
            betweenness
        };

        // Every unordered pair was counted from both ends.
        for (v, score) in betweenness.iter_mut().enumerate() {
            *score /= 2.0;
            if !score.is_finite() {
                return Err(AnalysisError::NonFiniteScore { node: v });
            }
        }

        Ok(CentralityScores {
            scores: betweenness
                .into_iter()
                .enumerate()
                .map(|(v, score)| (graph.node_id(v).to_string(), score))
                .collect(),
        })
    }

    /// Chunks of sources on the rayon pool, summed back in chunk order.
    fn accumulate_parallel(&self, graph: &Graph) -> Vec<f64> {
        let n = graph.node_count();
        let chunk_size = self.config.chunk_size.max(1);
        let sources: Vec<VIdx> = (0..n).collect();
        let partials: Vec<Vec<f64>> = sources
            .par_chunks(chunk_size)
            .map(|chunk| {
                let mut partial = vec![0.0f64; n];
                let mut state = SourceState::new(n);
                for &source in chunk {
                    state.accumulate(graph, source, &mut partial);
                }
                partial
            })
            .collect();

        let mut betweenness = vec![0.0f64; n];
        for partial in partials {
            for (total, value) in betweenness.iter_mut().zip(partial) {
                *total += value;
            }
        }
        betweenness
    }
}

/// Betweenness with the default configuration.
pub fn compute(graph: &Graph) -> Outcome<CentralityScores> {
    Brandes::default().compute(graph)
}
