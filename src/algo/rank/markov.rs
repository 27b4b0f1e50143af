//! K-step Markov centrality
//!
//! Ranks vertices by the probability of reaching them in a fixed number of
//! random-walk steps started from a seed set.

use super::{
    collect_scores, normalize_priors, relax, surfer_step, RankingConfig, RankingOutcome, StopRule, Transitions,
};
use crate::algo::common::{AlgoError, AlgoResult, GraphView};
use crate::graph::{EdgeKey, GraphStore, VertexKey};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkovConfig {
    /// Walk length
    pub steps: usize,
    /// Average the distributions of every step instead of reporting only the last
    pub cumulative: bool,
}

impl Default for MarkovConfig {
    fn default() -> Self {
        Self {
            steps: 10,
            cumulative: true,
        }
    }
}

impl MarkovConfig {
    pub fn validate(&self) -> AlgoResult<()> {
        if self.steps == 0 {
            return Err(AlgoError::InvalidParameter("markov steps must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Fixed-length random walk from a seed set.
///
/// Steps use the same transition as PageRank with priors (teleport back to
/// the seeds with probability `alpha`, dangling mass per the configured
/// policy), but stop after exactly `steps` iterations.
pub struct KStepMarkov<V, E> {
    view: GraphView<V, E>,
    priors: Vec<f64>,
    ranking: RankingConfig,
    markov: MarkovConfig,
}

impl<V: VertexKey, E: EdgeKey> KStepMarkov<V, E> {
    /// Seeds share the starting mass uniformly. An empty seed set is
    /// rejected with `EmptyPriorSet`.
    pub fn new(
        graph: &GraphStore<V, E>,
        seeds: &[V],
        ranking: RankingConfig,
        markov: MarkovConfig,
    ) -> AlgoResult<Self> {
        ranking.validate()?;
        markov.validate()?;
        let view = GraphView::new(graph);

        let mut seed_set = FxHashSet::default();
        for seed in seeds {
            view.index_of(seed)?;
            seed_set.insert(seed);
        }
        let priors = normalize_priors(&view, |v| if seed_set.contains(v) { 1.0 } else { 0.0 })?;

        Ok(KStepMarkov {
            view,
            priors,
            ranking,
            markov,
        })
    }

    pub fn evaluate(&self) -> AlgoResult<RankingOutcome<V>> {
        let transitions = Transitions::build::<V, E, dyn Fn(&V, &E) -> f64>(&self.view, None)?;
        let n = self.view.node_count;
        let alpha = self.ranking.alpha;
        let policy = self.ranking.dangling;
        let priors = &self.priors;

        let mut cumulative = vec![0.0; n];
        let mut rank = priors.clone();
        let run = relax(&mut rank, StopRule::FixedSteps(self.markov.steps), |current, next| {
            surfer_step(&transitions, priors, alpha, policy, current, next);
            for (total, value) in cumulative.iter_mut().zip(next.iter()) {
                *total += value;
            }
            Ok(())
        })?;

        let scores = if self.markov.cumulative {
            let steps = run.iterations as f64;
            cumulative.into_iter().map(|total| total / steps).collect()
        } else {
            rank
        };

        debug!(vertices = n, steps = run.iterations, "K-step Markov finished");
        Ok(RankingOutcome::new(collect_scores(&self.view, scores.into_iter()), run))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::rank::StopReason;
    use crate::graph::GraphError;

    // 0 -> 1 -> 2 -> 3
    fn chain() -> GraphStore<u32, u32> {
        let mut store = GraphStore::new();
        for v in 0..4 {
            store.add_vertex(v);
        }
        for v in 0..3 {
            store.add_directed_edge(v, v, v + 1).unwrap();
        }
        store
    }

    fn pure_walk() -> RankingConfig {
        RankingConfig {
            alpha: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_last_step_distribution() {
        let store = chain();
        let markov = MarkovConfig {
            steps: 2,
            cumulative: false,
        };
        let outcome = KStepMarkov::new(&store, &[0], pure_walk(), markov)
            .unwrap()
            .evaluate()
            .unwrap();

        assert_eq!(outcome.stop_reason(), StopReason::FixedSteps);
        assert_eq!(outcome.iterations(), 2);
        assert!((outcome.score(&2).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(outcome.score(&0), Some(0.0));
    }

    #[test]
    fn test_cumulative_distribution() {
        let store = chain();
        let markov = MarkovConfig {
            steps: 2,
            cumulative: true,
        };
        let outcome = KStepMarkov::new(&store, &[0], pure_walk(), markov)
            .unwrap()
            .evaluate()
            .unwrap();

        // Step 1 puts everything on 1, step 2 on 2
        assert!((outcome.score(&1).unwrap() - 0.5).abs() < 1e-12);
        assert!((outcome.score(&2).unwrap() - 0.5).abs() < 1e-12);
        assert!((outcome.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_seed_validation() {
        let store = chain();
        assert_eq!(
            KStepMarkov::new(&store, &[], pure_walk(), MarkovConfig::default()).err(),
            Some(AlgoError::EmptyPriorSet)
        );
        assert_eq!(
            KStepMarkov::new(&store, &[9], pure_walk(), MarkovConfig::default()).err(),
            Some(AlgoError::Graph(GraphError::VertexNotFound("9".to_string())))
        );

        let markov = MarkovConfig {
            steps: 0,
            cumulative: true,
        };
        assert!(matches!(
            KStepMarkov::new(&store, &[0], pure_walk(), markov),
            Err(AlgoError::InvalidParameter(_))
        ));
    }
}
