//! Ordinals for parallel edges
//!
//! Edges sharing the same unordered endpoint pair form a parallel group.
//! Each edge in a group of size `k` gets a distinct ordinal in `0..k`,
//! which presentation layers use to fan out parallel edges.

use super::store::{GraphResult, GraphStore};
use super::types::{EdgeKey, GraphId, VertexKey};
use rustc_hash::FxHashMap;
use tracing::trace;

/// Lazily computed, explicitly invalidated cache of parallel-edge ordinals.
///
/// Keyed by `(GraphId, edge)`, so one indexer may serve several graphs. The
/// indexer never owns or mutates a graph. Ordinals follow the iteration order
/// of the incident-edge collection and are not stable across structural
/// changes: call [`reset_edge`](Self::reset_edge) or [`reset`](Self::reset)
/// after adding or removing a parallel edge.
///
/// Every cached ordinal remembers the graph generation it was computed at.
/// Recomputing a group evicts cached ordinals of edges the graph no longer
/// holds.
#[derive(Debug, Clone)]
pub struct ParallelEdgeIndexer<E> {
    /// (graph, edge) -> (ordinal, graph generation at computation)
    indices: FxHashMap<(GraphId, E), (usize, u64)>,
}

impl<E: EdgeKey> Default for ParallelEdgeIndexer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EdgeKey> ParallelEdgeIndexer<E> {
    pub fn new() -> Self {
        ParallelEdgeIndexer {
            indices: FxHashMap::default(),
        }
    }

    /// Ordinal of `edge` within its parallel group.
    ///
    /// On a cache miss the whole group is indexed: the other members get
    /// `0..k-1` in incidence order and `edge` gets the last ordinal.
    pub fn get_index<V: VertexKey>(
        &mut self,
        graph: &GraphStore<V, E>,
        edge: &E,
    ) -> GraphResult<usize> {
        if let Some(&(index, _)) = self.indices.get(&(graph.id(), edge.clone())) {
            return Ok(index);
        }
        self.index_group(graph, edge)
    }

    /// Recompute the group containing `edge`, leaving other groups cached
    pub fn reset_edge<V: VertexKey>(
        &mut self,
        graph: &GraphStore<V, E>,
        edge: &E,
    ) -> GraphResult<()> {
        self.index_group(graph, edge).map(|_| ())
    }

    /// Drop every cached ordinal without recomputing
    pub fn reset(&mut self) {
        self.indices.clear();
    }

    /// True if any ordinal cached for `graph` was computed before its latest
    /// structural change
    pub fn is_stale<V: VertexKey>(&self, graph: &GraphStore<V, E>) -> bool {
        let graph_id = graph.id();
        let generation = graph.generation();
        self.indices
            .iter()
            .any(|((id, _), &(_, seen))| *id == graph_id && seen != generation)
    }

    /// Number of cached ordinals
    pub fn cached_len(&self) -> usize {
        self.indices.len()
    }

    fn index_group<V: VertexKey>(
        &mut self,
        graph: &GraphStore<V, E>,
        edge: &E,
    ) -> GraphResult<usize> {
        let endpoints = graph.endpoints(edge)?;
        let graph_id = graph.id();
        let generation = graph.generation();

        let before = self.indices.len();
        self.indices.retain(|(id, cached), &mut (_, seen)| {
            *id != graph_id || seen == generation || graph.contains_edge(cached)
        });
        if self.indices.len() < before {
            trace!(evicted = before - self.indices.len(), "evicted ordinals of removed edges");
        }

        let mut count = 0;
        for other in graph.incident_edges(endpoints.first())? {
            if other == *edge {
                continue;
            }
            // Loops only group with loops on the same vertex
            if graph.endpoints(&other)?.same_unordered(endpoints) {
                self.indices.insert((graph_id, other), (count, generation));
                count += 1;
            }
        }
        self.indices.insert((graph_id, edge.clone()), (count, generation));

        trace!(group_size = count + 1, "indexed parallel edge group");
        Ok(count)
    }
}
