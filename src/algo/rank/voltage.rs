//! Voltage ranking
//!
//! Treats the graph as an electrical network with sources held at 1 and
//! sinks at 0. Every other vertex relaxes to the weighted mean of the
//! vertices linking into it.

use super::{collect_scores, relax, RankingConfig, RankingOutcome};
use crate::algo::common::{AlgoError, AlgoResult, GraphView};
use crate::graph::store::describe;
use crate::graph::{EdgeKey, GraphStore, Pair, VertexKey};
use tracing::debug;

type EdgeWeight<'a, V, E> = Box<dyn Fn(&V, &E) -> f64 + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clamp {
    Free,
    Source,
    Sink,
}

pub struct VoltageRanker<'a, V, E> {
    view: GraphView<V, E>,
    clamps: Vec<Clamp>,
    config: RankingConfig,
    edge_weight: Option<EdgeWeight<'a, V, E>>,
}

impl<'a, V: VertexKey, E: EdgeKey> VoltageRanker<'a, V, E> {
    /// `boundary` holds the source vertices first and the sink vertices
    /// second. At least one source is required; a vertex may not be both.
    /// Only `tolerance`, `max_iterations` and `time_budget_ms` of `config`
    /// apply.
    pub fn new(graph: &GraphStore<V, E>, boundary: Pair<Vec<V>>, config: RankingConfig) -> AlgoResult<Self> {
        config.validate()?;
        let (sources, sinks) = boundary.into_tuple();
        if sources.is_empty() {
            return Err(AlgoError::EmptyPriorSet);
        }

        let view = GraphView::new(graph);
        let mut clamps = vec![Clamp::Free; view.node_count];
        for source in &sources {
            clamps[view.index_of(source)?] = Clamp::Source;
        }
        for sink in &sinks {
            let idx = view.index_of(sink)?;
            if clamps[idx] == Clamp::Source {
                return Err(AlgoError::InvalidParameter(format!(
                    "vertex {} is both a source and a sink",
                    describe(sink)
                )));
            }
            clamps[idx] = Clamp::Sink;
        }

        Ok(VoltageRanker {
            view,
            clamps,
            config,
            edge_weight: None,
        })
    }

    /// Conductance per edge; the default is 1
    pub fn with_edge_weights<W>(mut self, weight: W) -> Self
    where
        W: Fn(&V, &E) -> f64 + 'a,
    {
        self.edge_weight = Some(Box::new(weight));
        self
    }

    pub fn evaluate(&self) -> AlgoResult<RankingOutcome<V>> {
        let view = &self.view;
        let clamps = &self.clamps;

        // (source index, weight) per inbound link
        let mut inbound: Vec<Vec<(usize, f64)>> = vec![Vec::new(); view.node_count];
        for (idx, links) in view.incoming.iter().enumerate() {
            for link in links {
                let w = match &self.edge_weight {
                    Some(weight) => weight(&view.index_to_vertex[link.vertex], &view.edges[link.edge]),
                    None => 1.0,
                };
                if !w.is_finite() || w < 0.0 {
                    return Err(AlgoError::InvalidWeight(describe(&view.edges[link.edge])));
                }
                inbound[idx].push((link.vertex, w));
            }
        }

        let mut voltage: Vec<f64> = clamps
            .iter()
            .map(|clamp| if *clamp == Clamp::Source { 1.0 } else { 0.0 })
            .collect();
        let run = relax(&mut voltage, self.config.stop_rule(), |current, next| {
            for (idx, slot) in next.iter_mut().enumerate() {
                *slot = match clamps[idx] {
                    Clamp::Source => 1.0,
                    Clamp::Sink => 0.0,
                    Clamp::Free => {
                        let total: f64 = inbound[idx].iter().map(|(_, w)| w).sum();
                        if total > 0.0 {
                            inbound[idx].iter().map(|&(from, w)| current[from] * w).sum::<f64>() / total
                        } else {
                            current[idx]
                        }
                    }
                };
            }
            Ok(())
        })?;

        debug!(vertices = view.node_count, iterations = run.iterations, "voltage ranking finished");
        Ok(RankingOutcome::new(collect_scores(view, voltage.into_iter()), run))
    }
}
