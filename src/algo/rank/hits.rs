//! HITS with priors
//!
//! Hub and authority scores computed by mutual reinforcement. Each step the
//! raw scores are L1-normalized and blended with the prior distribution.

use super::{collect_scores, normalize_priors, relax, RankingConfig, RankingOutcome};
use crate::algo::common::{AlgoError, AlgoResult, GraphView};
use crate::graph::store::describe;
use crate::graph::{EdgeKey, GraphStore, Pair, VertexKey};
use tracing::debug;

type EdgeWeight<'a, V, E> = Box<dyn Fn(&V, &E) -> f64 + 'a>;

/// HITS ranker. Scores are reported as `Pair(authority, hub)`.
pub struct Hits<'a, V, E> {
    view: GraphView<V, E>,
    priors: Vec<f64>,
    config: RankingConfig,
    edge_weight: Option<EdgeWeight<'a, V, E>>,
}

impl<'a, V: VertexKey, E: EdgeKey> Hits<'a, V, E> {
    pub fn new<P>(graph: &GraphStore<V, E>, prior: P, config: RankingConfig) -> AlgoResult<Self>
    where
        P: Fn(&V) -> f64,
    {
        config.validate()?;
        let view = GraphView::new(graph);
        let priors = normalize_priors(&view, prior)?;
        Ok(Hits {
            view,
            priors,
            config,
            edge_weight: None,
        })
    }

    /// HITS with a uniform prior
    pub fn uniform(graph: &GraphStore<V, E>, config: RankingConfig) -> AlgoResult<Self> {
        Self::new(graph, |_| 1.0, config)
    }

    pub fn with_edge_weights<W>(mut self, weight: W) -> Self
    where
        W: Fn(&V, &E) -> f64 + 'a,
    {
        self.edge_weight = Some(Box::new(weight));
        self
    }

    fn link_weights(&self) -> AlgoResult<Vec<f64>> {
        let mut weights = vec![1.0; self.view.edge_count()];
        if let Some(weight) = &self.edge_weight {
            for (edge_idx, &(source, _)) in self.view.endpoints.iter().enumerate() {
                let edge = &self.view.edges[edge_idx];
                let w = weight(&self.view.index_to_vertex[source], edge);
                if !w.is_finite() || w < 0.0 {
                    return Err(AlgoError::InvalidWeight(describe(edge)));
                }
                weights[edge_idx] = w;
            }
        }
        Ok(weights)
    }

    /// Run to convergence. Authority and hub vectors each sum to one.
    pub fn evaluate(&self) -> AlgoResult<RankingOutcome<V, Pair<f64>>> {
        let weights = self.link_weights()?;
        let view = &self.view;
        let priors = &self.priors;
        let n = view.node_count;
        let alpha = self.config.alpha;

        // state = [authority; hub]
        let mut state: Vec<f64> = priors.iter().chain(priors.iter()).copied().collect();
        let run = relax(&mut state, self.config.stop_rule(), |current, next| {
            let hub = &current[n..];
            let (next_authority, next_hub) = next.split_at_mut(n);

            // Authorities from the previous hubs, then hubs from the new authorities
            for (idx, slot) in next_authority.iter_mut().enumerate() {
                *slot = view.incoming[idx]
                    .iter()
                    .map(|link| hub[link.vertex] * weights[link.edge])
                    .sum();
            }
            blend(next_authority, priors, alpha);

            for (idx, slot) in next_hub.iter_mut().enumerate() {
                *slot = view.outgoing[idx]
                    .iter()
                    .map(|link| next_authority[link.vertex] * weights[link.edge])
                    .sum();
            }
            blend(next_hub, priors, alpha);
            Ok(())
        })?;

        debug!(vertices = n, iterations = run.iterations, "HITS finished");
        let (authority, hub) = state.split_at(n);
        let scores = authority.iter().zip(hub.iter()).map(|(a, h)| Pair::new(*a, *h));
        Ok(RankingOutcome::new(collect_scores(view, scores), run))
    }
}

/// L1-normalize `raw` in place and mix in the prior. A vector with no mass
/// falls back to the prior.
fn blend(raw: &mut [f64], priors: &[f64], alpha: f64) {
    let total: f64 = raw.iter().sum();
    for (value, prior) in raw.iter_mut().zip(priors) {
        let normalized = if total > 0.0 { *value / total } else { *prior };
        *value = (1.0 - alpha) * normalized + alpha * prior;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // h1 -> x, h1 -> y, h2 -> x
    fn bipartite() -> GraphStore<&'static str, u32> {
        let mut store = GraphStore::new();
        for v in ["h1", "h2", "x", "y"] {
            store.add_vertex(v);
        }
        store.add_directed_edge(1, "h1", "x").unwrap();
        store.add_directed_edge(2, "h1", "y").unwrap();
        store.add_directed_edge(3, "h2", "x").unwrap();
        store
    }

    #[test]
    fn test_hits_authorities_and_hubs() {
        let store = bipartite();
        let outcome = Hits::uniform(&store, RankingConfig::default())
            .unwrap()
            .evaluate()
            .unwrap();
        assert!(outcome.converged());

        let x = outcome.score(&"x").unwrap();
        let y = outcome.score(&"y").unwrap();
        let h1 = outcome.score(&"h1").unwrap();
        let h2 = outcome.score(&"h2").unwrap();

        assert!(x.first() > y.first());
        assert!(y.first() > h1.first());
        assert!(h1.second() > h2.second());
        assert!(h2.second() > x.second());

        let authority_total: f64 = outcome.scores().values().map(|p| *p.first()).sum();
        let hub_total: f64 = outcome.scores().values().map(|p| *p.second()).sum();
        assert!((authority_total - 1.0).abs() < 1e-9);
        assert!((hub_total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_hits_without_edges_returns_prior() {
        let mut store: GraphStore<u32, u32> = GraphStore::new();
        store.add_vertex(1);
        store.add_vertex(2);
        let outcome = Hits::new(&store, |v| *v as f64, RankingConfig::default())
            .unwrap()
            .evaluate()
            .unwrap();
        let score = outcome.score(&2).unwrap();
        assert!((score.first() - 2.0 / 3.0).abs() < 1e-12);
        assert!((score.second() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_hits_prior_lifts_seed_authority() {
        let store = bipartite();
        let uniform = Hits::uniform(&store, RankingConfig::default())
            .unwrap()
            .evaluate()
            .unwrap();
        let seeded = Hits::new(&store, |v| if *v == "y" { 1.0 } else { 0.0 }, RankingConfig::default())
            .unwrap()
            .evaluate()
            .unwrap();

        let uniform_y = *uniform.score(&"y").unwrap().first();
        let seeded_y = *seeded.score(&"y").unwrap().first();
        assert!(seeded_y > uniform_y);
        // h1 is the only hub pointing at y, so it gains on h2
        let hub_ratio = |outcome: &RankingOutcome<&str, Pair<f64>>| {
            outcome.score(&"h1").unwrap().second() / outcome.score(&"h2").unwrap().second()
        };
        assert!(hub_ratio(&seeded) > hub_ratio(&uniform));

        let authority_total: f64 = seeded.scores().values().map(|p| *p.first()).sum();
        assert!((authority_total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_hits_alpha_one_returns_prior() {
        let store = bipartite();
        let config = RankingConfig {
            alpha: 1.0,
            ..Default::default()
        };
        let outcome = Hits::new(&store, |v| if *v == "y" { 3.0 } else { 1.0 }, config)
            .unwrap()
            .evaluate()
            .unwrap();
        assert!(outcome.converged());

        for (vertex, score) in outcome.scores() {
            let expected = if *vertex == "y" { 0.5 } else { 1.0 / 6.0 };
            assert!((score.first() - expected).abs() < 1e-12);
            assert!((score.second() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_hits_rejects_negative_weights() {
        let store = bipartite();
        let hits = Hits::uniform(&store, RankingConfig::default())
            .unwrap()
            .with_edge_weights(|_, _| -1.0);
        assert!(matches!(hits.evaluate(), Err(AlgoError::InvalidWeight(_))));
    }
}
