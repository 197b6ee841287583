use std::time::Duration;

use derive_more::Display;

use crate::graph::VIdx;

/// Failures raised inside the analysis components.
/// None of them abort an analysis on their own, see [`Outcome`].
#[derive(Debug, Display, Clone, PartialEq)]
pub enum AnalysisError {
    #[display(fmt = "non-finite modularity gain for node {} at level {}", node, level)]
    NonFiniteGain { node: VIdx, level: usize },
    #[display(fmt = "level {} has no community for node {}", level, node)]
    BrokenLevelChain { node: VIdx, level: usize },
    #[display(fmt = "non-finite betweenness score for node {}", node)]
    NonFiniteScore { node: VIdx },
    #[display(fmt = "analysis did not finish within {:?}", _0)]
    DeadlineExceeded(Duration),
    #[display(fmt = "analysis worker exited without a result")]
    WorkerLost,
}

impl std::error::Error for AnalysisError {}

/// Result of a fail-soft component.
///
/// `Degraded` still carries a usable value (an empty partition, all-zero scores),
/// together with the reason the real computation was abandoned.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Computed(T),
    Degraded { value: T, reason: AnalysisError },
}

impl<T> Outcome<T> {
    /// Run `compute`, falling back to `fallback()` on error.
    pub fn fail_soft<F, D>(component: &str, compute: F, fallback: D) -> Outcome<T>
    where
        F: FnOnce() -> Result<T, AnalysisError>,
        D: FnOnce() -> T,
    {
        match compute() {
            Ok(value) => Outcome::Computed(value),
            Err(reason) => {
                log::warn!("{} degraded: {}", component, reason);
                Outcome::Degraded { value: fallback(), reason }
            }
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Computed(value) => value,
            Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Computed(value) => value,
            Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&AnalysisError> {
        match self {
            Outcome::Computed(_) => None,
            Outcome::Degraded { reason, .. } => Some(reason),
        }
    }
}
