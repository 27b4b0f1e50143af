//! Iterative rank propagation
//!
//! A shared fixed-point relaxation kernel and the rankers built on it:
//! - [`PageRankWithPriors`] (and plain PageRank with a uniform prior)
//! - [`Hits`] authority/hub scores with priors
//! - [`KStepMarkov`] fixed-length random walks from a seed set
//! - [`VoltageRanker`] source/sink boundary-value relaxation
//!
//! Variants differ only in the propagated quantity, the transition weights
//! and the stopping rule; see [`StopRule`].

pub mod hits;
pub mod markov;
pub mod pagerank;
pub mod voltage;

use super::common::{AlgoError, AlgoResult, GraphView};
use crate::graph::store::describe;
use crate::graph::{EdgeKey, FxIndexMap, VertexKey};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

pub use hits::Hits;
pub use markov::{KStepMarkov, MarkovConfig};
pub use pagerank::{page_rank, PageRankWithPriors};
pub use voltage::VoltageRanker;

/// Where rank held by vertices without out-edges goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingPolicy {
    /// Spread uniformly over all vertices
    #[default]
    Uniform,
    /// Spread according to the prior distribution
    Prior,
}

/// Rank propagation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Teleport probability towards the prior (0 = pure propagation)
    pub alpha: f64,
    /// Convergence threshold on the maximum per-vertex change
    pub tolerance: f64,
    /// Iteration cap; reaching it is reported, not an error
    pub max_iterations: usize,
    /// Optional wall-clock budget per run, in milliseconds
    pub time_budget_ms: Option<u64>,
    /// Dangling vertex policy
    pub dangling: DanglingPolicy,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            alpha: 0.15,
            tolerance: 1e-6,
            max_iterations: 100,
            time_budget_ms: None,
            dangling: DanglingPolicy::Uniform,
        }
    }
}

impl RankingConfig {
    pub fn validate(&self) -> AlgoResult<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(AlgoError::InvalidAlpha(self.alpha));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(AlgoError::InvalidParameter(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    pub(crate) fn stop_rule(&self) -> StopRule {
        StopRule::Tolerance {
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            time_budget: self.time_budget_ms.map(Duration::from_millis),
        }
    }
}

/// How a relaxation run decides to stop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopRule {
    /// Stop once the largest per-vertex change falls below `tolerance`
    Tolerance {
        tolerance: f64,
        max_iterations: usize,
        time_budget: Option<Duration>,
    },
    /// Run exactly this many steps
    FixedSteps(usize),
}

/// Why a relaxation run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    Converged,
    IterationCap,
    TimeBudget,
    FixedSteps,
}

/// Scores of a finished ranking run
#[derive(Debug, Clone)]
pub struct RankingOutcome<V, S = f64> {
    scores: FxIndexMap<V, S>,
    iterations: usize,
    max_delta: f64,
    stop_reason: StopReason,
}

impl<V: VertexKey, S: Copy> RankingOutcome<V, S> {
    pub(crate) fn new(scores: FxIndexMap<V, S>, relaxation: Relaxation) -> Self {
        RankingOutcome {
            scores,
            iterations: relaxation.iterations,
            max_delta: relaxation.max_delta,
            stop_reason: relaxation.stop_reason,
        }
    }

    pub fn score(&self, vertex: &V) -> Option<S> {
        self.scores.get(vertex).copied()
    }

    /// Scores in vertex insertion order
    pub fn scores(&self) -> &FxIndexMap<V, S> {
        &self.scores
    }

    pub fn into_scores(self) -> FxIndexMap<V, S> {
        self.scores
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Largest per-vertex change in the last iteration
    pub fn max_delta(&self) -> f64 {
        self.max_delta
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    /// True unless the run was cut short by the iteration cap or time budget
    pub fn converged(&self) -> bool {
        matches!(self.stop_reason, StopReason::Converged | StopReason::FixedSteps)
    }

    pub fn hit_iteration_cap(&self) -> bool {
        self.stop_reason == StopReason::IterationCap
    }
}

impl<V: VertexKey> RankingOutcome<V, f64> {
    /// Vertices sorted by descending score; ties keep insertion order
    pub fn ranked(&self) -> Vec<(V, f64)> {
        let mut ranked: Vec<(V, f64)> = self
            .scores
            .iter()
            .map(|(vertex, score)| (vertex.clone(), *score))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    /// Sum of all scores
    pub fn total(&self) -> f64 {
        self.scores.values().sum()
    }
}

/// Bookkeeping of one relaxation run
#[derive(Debug, Clone, Copy)]
pub(crate) struct Relaxation {
    pub iterations: usize,
    pub max_delta: f64,
    pub stop_reason: StopReason,
}

/// Fixed-point iteration driver shared by every ranker.
///
/// `step` reads the current state and writes the next one. After each step
/// the new state is checked for non-finite values (fatal) and the largest
/// per-entry change is compared against the stop rule.
pub(crate) fn relax<F>(state: &mut Vec<f64>, rule: StopRule, mut step: F) -> AlgoResult<Relaxation>
where
    F: FnMut(&[f64], &mut [f64]) -> AlgoResult<()>,
{
    let started = Instant::now();
    let mut next = vec![0.0; state.len()];
    let mut iterations = 0;
    let mut max_delta = 0.0_f64;

    let stop_reason = loop {
        match rule {
            StopRule::FixedSteps(steps) if iterations >= steps => break StopReason::FixedSteps,
            StopRule::Tolerance { max_iterations, .. } if iterations >= max_iterations => {
                warn!(iterations, max_delta, "rank propagation hit the iteration cap");
                break StopReason::IterationCap;
            }
            StopRule::Tolerance {
                time_budget: Some(budget),
                ..
            } if iterations > 0 && started.elapsed() >= budget => {
                warn!(iterations, max_delta, "rank propagation ran out of time budget");
                break StopReason::TimeBudget;
            }
            _ => {}
        }

        step(state, &mut next)?;
        iterations += 1;

        max_delta = 0.0;
        for (current, updated) in state.iter().zip(next.iter()) {
            if !updated.is_finite() {
                return Err(AlgoError::NonFiniteValue { iteration: iterations });
            }
            max_delta = max_delta.max((updated - current).abs());
        }
        std::mem::swap(state, &mut next);
        trace!(iteration = iterations, max_delta, "relaxation step");

        if let StopRule::Tolerance { tolerance, .. } = rule {
            if max_delta < tolerance {
                break StopReason::Converged;
            }
        }
    };

    debug!(iterations, max_delta, reason = ?stop_reason, "relaxation finished");
    Ok(Relaxation {
        iterations,
        max_delta,
        stop_reason,
    })
}

/// Per-vertex inbound transitions with raw weights
#[derive(Debug, Clone)]
pub(crate) struct Transitions {
    /// index -> (source index, raw weight) for every link entering the vertex
    pub incoming: Vec<Vec<(usize, f64)>>,
    /// Sum of raw weights leaving each vertex; zero marks a dangling vertex
    pub out_total: Vec<f64>,
}

impl Transitions {
    /// Build transitions over the view's links. Without a weight function
    /// every link weighs 1, which makes transitions uniform over out-edges.
    pub fn build<V, E, W>(view: &GraphView<V, E>, weight: Option<&W>) -> AlgoResult<Self>
    where
        V: VertexKey,
        E: EdgeKey,
        W: Fn(&V, &E) -> f64 + ?Sized,
    {
        let n = view.node_count;
        let mut incoming = vec![Vec::new(); n];
        let mut out_total = vec![0.0; n];

        for (source_idx, links) in view.outgoing.iter().enumerate() {
            for link in links {
                let w = match weight {
                    Some(weight) => weight(&view.index_to_vertex[source_idx], &view.edges[link.edge]),
                    None => 1.0,
                };
                if !w.is_finite() || w < 0.0 {
                    return Err(AlgoError::InvalidWeight(describe(&view.edges[link.edge])));
                }
                // Zero-weight links carry no mass; a source left with none is dangling
                if w == 0.0 {
                    continue;
                }
                incoming[link.vertex].push((source_idx, w));
                out_total[source_idx] += w;
            }
        }

        Ok(Transitions { incoming, out_total })
    }

    pub fn is_dangling(&self, idx: usize) -> bool {
        self.out_total[idx] <= 0.0
    }

    /// Rank mass reaching `idx` through normalized transitions
    pub fn inbound_mass(&self, idx: usize, rank: &[f64]) -> f64 {
        self.incoming[idx]
            .iter()
            .map(|&(source, w)| rank[source] * w / self.out_total[source])
            .sum()
    }
}

/// One random-surfer step: propagate along transitions, spread dangling mass
/// per `policy`, then teleport to the prior with probability `alpha`.
pub(crate) fn surfer_step(
    transitions: &Transitions,
    priors: &[f64],
    alpha: f64,
    policy: DanglingPolicy,
    current: &[f64],
    next: &mut [f64],
) {
    let n = current.len();
    let dangling: f64 = (0..n)
        .filter(|&idx| transitions.is_dangling(idx))
        .map(|idx| current[idx])
        .sum();
    let uniform = 1.0 / n as f64;

    for (idx, slot) in next.iter_mut().enumerate() {
        let share = match policy {
            DanglingPolicy::Uniform => uniform,
            DanglingPolicy::Prior => priors[idx],
        };
        let propagated = transitions.inbound_mass(idx, current) + dangling * share;
        *slot = (1.0 - alpha) * propagated + alpha * priors[idx];
    }
}

/// Validate and normalize caller priors to a probability distribution
pub(crate) fn normalize_priors<V, E, P>(view: &GraphView<V, E>, prior: P) -> AlgoResult<Vec<f64>>
where
    V: VertexKey,
    E: EdgeKey,
    P: Fn(&V) -> f64,
{
    let mut values = Vec::with_capacity(view.node_count);
    for vertex in &view.index_to_vertex {
        let value = prior(vertex);
        if !value.is_finite() || value < 0.0 {
            return Err(AlgoError::InvalidPrior(describe(vertex)));
        }
        values.push(value);
    }

    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return Err(AlgoError::EmptyPriorSet);
    }
    for value in values.iter_mut() {
        *value /= total;
    }
    Ok(values)
}

/// Map dense scores back to vertices
pub(crate) fn collect_scores<V, E, S>(view: &GraphView<V, E>, scores: impl Iterator<Item = S>) -> FxIndexMap<V, S>
where
    V: VertexKey,
    E: EdgeKey,
{
    view.index_to_vertex.iter().cloned().zip(scores).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(RankingConfig::default().validate().is_ok());

        let config = RankingConfig {
            alpha: 1.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(AlgoError::InvalidAlpha(1.5)));

        let config = RankingConfig {
            tolerance: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relax_converges() {
        // x' = x / 2 converges to zero
        let mut state = vec![1.0, 4.0];
        let rule = StopRule::Tolerance {
            tolerance: 1e-3,
            max_iterations: 100,
            time_budget: None,
        };
        let run = relax(&mut state, rule, |current, next| {
            for (c, n) in current.iter().zip(next.iter_mut()) {
                *n = c / 2.0;
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(run.stop_reason, StopReason::Converged);
        assert!(run.max_delta < 1e-3);
        assert!(state.iter().all(|x| *x < 2e-3));
    }

    #[test]
    fn test_relax_iteration_cap() {
        let mut state = vec![0.0];
        let rule = StopRule::Tolerance {
            tolerance: 1e-9,
            max_iterations: 5,
            time_budget: None,
        };
        let run = relax(&mut state, rule, |current, next| {
            next[0] = current[0] + 1.0;
            Ok(())
        })
        .unwrap();

        assert_eq!(run.stop_reason, StopReason::IterationCap);
        assert_eq!(run.iterations, 5);
        assert_eq!(state[0], 5.0);
    }

    #[test]
    fn test_relax_fixed_steps() {
        let mut state = vec![1.0];
        let run = relax(&mut state, StopRule::FixedSteps(3), |current, next| {
            next[0] = current[0] * 2.0;
            Ok(())
        })
        .unwrap();
        assert_eq!(run.stop_reason, StopReason::FixedSteps);
        assert_eq!(state[0], 8.0);
    }

    #[test]
    fn test_relax_rejects_non_finite() {
        let mut state = vec![1.0];
        let result = relax(&mut state, StopRule::FixedSteps(3), |_, next| {
            next[0] = f64::NAN;
            Ok(())
        });
        assert_eq!(result.unwrap_err(), AlgoError::NonFiniteValue { iteration: 1 });
    }
}
