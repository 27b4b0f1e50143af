//! Betweenness centrality (Brandes)
//!
//! Vertex and edge betweenness from unweighted shortest paths. Directed
//! edges are followed in their direction, undirected edges both ways.
//! Parallel edges are distinct paths.

use super::common::GraphView;
use crate::graph::{EdgeKey, FxIndexMap, GraphStore, VertexKey};
use std::collections::VecDeque;
use tracing::debug;

/// Betweenness scores for every vertex and edge of a graph
#[derive(Debug, Clone)]
pub struct BetweennessCentrality<V, E> {
    vertex_scores: FxIndexMap<V, f64>,
    edge_scores: FxIndexMap<E, f64>,
}

impl<V: VertexKey, E: EdgeKey> BetweennessCentrality<V, E> {
    pub fn new(graph: &GraphStore<V, E>) -> Self {
        let view = GraphView::new(graph);
        let (vertex, edge) = brandes(&view);

        BetweennessCentrality {
            vertex_scores: view.index_to_vertex.iter().cloned().zip(vertex).collect(),
            edge_scores: view.edges.iter().cloned().zip(edge).collect(),
        }
    }

    pub fn vertex_score(&self, vertex: &V) -> Option<f64> {
        self.vertex_scores.get(vertex).copied()
    }

    pub fn edge_score(&self, edge: &E) -> Option<f64> {
        self.edge_scores.get(edge).copied()
    }

    /// Vertex scores in insertion order
    pub fn vertex_scores(&self) -> &FxIndexMap<V, f64> {
        &self.vertex_scores
    }

    /// Edge scores in insertion order
    pub fn edge_scores(&self) -> &FxIndexMap<E, f64> {
        &self.edge_scores
    }

    /// Edge with the highest score. Ties go to the earliest inserted edge.
    pub fn max_edge(&self) -> Option<(&E, f64)> {
        let mut best: Option<(&E, f64)> = None;
        for (edge, &score) in &self.edge_scores {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((edge, score)),
            }
        }
        best
    }
}

/// Brandes accumulation over dense indices. Returns (vertex, edge) scores.
pub(crate) fn brandes<V: VertexKey, E: EdgeKey>(view: &GraphView<V, E>) -> (Vec<f64>, Vec<f64>) {
    let n = view.node_count;
    let mut vertex_scores = vec![0.0; n];
    let mut edge_scores = vec![0.0; view.edge_count()];

    // Pre-allocate once, reset per source
    let mut stack: Vec<usize> = Vec::with_capacity(n);
    let mut pred: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    let mut sigma: Vec<f64> = vec![0.0; n];
    let mut dist: Vec<i64> = vec![-1; n];
    let mut delta: Vec<f64> = vec![0.0; n];
    let mut queue: VecDeque<usize> = VecDeque::with_capacity(n);

    for source in 0..n {
        stack.clear();
        queue.clear();
        for i in 0..n {
            pred[i].clear();
            sigma[i] = 0.0;
            dist[i] = -1;
            delta[i] = 0.0;
        }

        sigma[source] = 1.0;
        dist[source] = 0;
        queue.push_back(source);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let v_dist = dist[v];
            for link in &view.outgoing[v] {
                let w = link.vertex;
                if dist[w] < 0 {
                    dist[w] = v_dist + 1;
                    queue.push_back(w);
                }
                if dist[w] == v_dist + 1 {
                    sigma[w] += sigma[v];
                    pred[w].push((v, link.edge));
                }
            }
        }

        // Back propagation
        while let Some(w) = stack.pop() {
            for &(v, edge) in &pred[w] {
                let contribution = (sigma[v] / sigma[w]) * (1.0 + delta[w]);
                edge_scores[edge] += contribution;
                delta[v] += contribution;
            }
            if w != source {
                vertex_scores[w] += delta[w];
            }
        }
    }

    // Every pair is seen from both ends in an undirected graph
    if view.is_undirected() {
        for score in vertex_scores.iter_mut().chain(edge_scores.iter_mut()) {
            *score /= 2.0;
        }
    }

    debug!(vertices = n, edges = view.edge_count(), "betweenness computed");
    (vertex_scores, edge_scores)
}
