//! PageRank with priors
//!
//! Random-surfer ranking where the teleport step jumps according to a
//! caller-supplied prior distribution. Plain PageRank is the uniform prior.

use super::{
    collect_scores, normalize_priors, relax, surfer_step, RankingConfig, RankingOutcome, Relaxation, StopReason,
    Transitions,
};
use crate::algo::common::{AlgoResult, GraphView};
use crate::graph::{EdgeKey, FxIndexMap, GraphStore, VertexKey};
use tracing::debug;

type EdgeWeight<'a, V, E> = Box<dyn Fn(&V, &E) -> f64 + 'a>;

/// PageRank with a prior (teleport) distribution.
///
/// Each step computes
/// `next(v) = (1 - alpha) * (inbound(v) + dangling * share(v)) + alpha * prior(v)`
/// where `inbound` is rank flowing in through normalized out-edge weights and
/// `dangling` is the rank held by vertices without out-edges.
pub struct PageRankWithPriors<'a, V, E> {
    view: GraphView<V, E>,
    priors: Vec<f64>,
    config: RankingConfig,
    edge_weight: Option<EdgeWeight<'a, V, E>>,
}

impl<'a, V: VertexKey, E: EdgeKey> PageRankWithPriors<'a, V, E> {
    /// Prepare a run. Priors are normalized to sum to one.
    pub fn new<P>(graph: &GraphStore<V, E>, prior: P, config: RankingConfig) -> AlgoResult<Self>
    where
        P: Fn(&V) -> f64,
    {
        config.validate()?;
        let view = GraphView::new(graph);
        let priors = normalize_priors(&view, prior)?;
        Ok(PageRankWithPriors {
            view,
            priors,
            config,
            edge_weight: None,
        })
    }

    /// Replace uniform out-edge transitions with weighted ones. Weights are
    /// normalized per source vertex.
    pub fn with_edge_weights<W>(mut self, weight: W) -> Self
    where
        W: Fn(&V, &E) -> f64 + 'a,
    {
        self.edge_weight = Some(Box::new(weight));
        self
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Normalized prior of a vertex
    pub fn prior(&self, vertex: &V) -> Option<f64> {
        self.view.vertex_to_index.get(vertex).map(|&idx| self.priors[idx])
    }

    pub fn evaluate(&self) -> AlgoResult<RankingOutcome<V>> {
        let transitions = Transitions::build(&self.view, self.edge_weight.as_deref())?;
        let n = self.view.node_count;
        let alpha = self.config.alpha;
        let policy = self.config.dangling;
        let priors = &self.priors;

        let mut rank = priors.clone();
        let run = relax(&mut rank, self.config.stop_rule(), |current, next| {
            surfer_step(&transitions, priors, alpha, policy, current, next);
            Ok(())
        })?;

        debug!(
            vertices = n,
            iterations = run.iterations,
            converged = run.stop_reason == StopReason::Converged,
            "PageRank with priors finished"
        );
        Ok(RankingOutcome::new(collect_scores(&self.view, rank.into_iter()), run))
    }
}

/// Plain PageRank: uniform prior over every vertex.
///
/// An empty graph yields an empty outcome rather than an `EmptyPriorSet` error.
pub fn page_rank<V: VertexKey, E: EdgeKey>(
    graph: &GraphStore<V, E>,
    config: RankingConfig,
) -> AlgoResult<RankingOutcome<V>> {
    if graph.vertex_count() == 0 {
        config.validate()?;
        let run = Relaxation {
            iterations: 0,
            max_delta: 0.0,
            stop_reason: StopReason::Converged,
        };
        return Ok(RankingOutcome::new(FxIndexMap::default(), run));
    }
    PageRankWithPriors::new(graph, |_| 1.0, config)?.evaluate()
}
