//! Shared utilities for graph algorithms
//!
//! Provides the algorithm error type and a read-only, dense snapshot of the
//! graph topology for algorithm execution.

use crate::graph::store::describe;
use crate::graph::{EdgeKey, EdgeType, GraphError, GraphStore, VertexKey};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors raised by algorithm engines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlgoError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Invalid endpoints: {0}")]
    InvalidEndpoints(String),

    #[error("Missing capacity for edge {0}")]
    MissingCapacity(String),

    #[error("Invalid capacity for edge {0}: capacities must be positive and finite")]
    InvalidCapacity(String),

    #[error("Invalid weight for edge {0}: weights must be non-negative and finite")]
    InvalidWeight(String),

    #[error("Prior distribution sums to zero")]
    EmptyPriorSet,

    #[error("Invalid prior for vertex {0}: priors must be non-negative and finite")]
    InvalidPrior(String),

    #[error("Damping factor alpha must lie in [0, 1], got {0}")]
    InvalidAlpha(f64),

    #[error("Non-finite value produced at iteration {iteration}")]
    NonFiniteValue { iteration: usize },

    #[error("Malformed predecessor map: {0}")]
    MalformedPredecessorMap(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type AlgoResult<T> = Result<T, AlgoError>;

/// One end of an edge as seen from a vertex: the edge's dense index and the
/// dense index of the vertex reached through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub edge: usize,
    pub vertex: usize,
}

/// A dense, integer-indexed view of the graph topology.
///
/// Iterative algorithms run over dense indices instead of hashing vertex
/// identities on every step. The view is a snapshot: later mutations of the
/// source graph do not affect it.
///
/// Undirected edges appear as links in both directions; an undirected
/// self-loop appears once.
#[derive(Debug, Clone)]
pub struct GraphView<V, E> {
    /// Number of vertices
    pub node_count: usize,
    /// Mapping from dense index (0..N) back to the vertex
    pub index_to_vertex: Vec<V>,
    /// Mapping from vertex to dense index
    pub vertex_to_index: FxHashMap<V, usize>,
    /// Edges in graph insertion order
    pub edges: Vec<E>,
    /// Dense endpoints of each edge, aligned with `edges`
    pub endpoints: Vec<(usize, usize)>,
    /// Edge types, aligned with `edges`
    pub edge_types: Vec<EdgeType>,
    /// Outgoing links: index -> links leaving the vertex
    pub outgoing: Vec<Vec<Link>>,
    /// Incoming links: index -> links entering the vertex
    pub incoming: Vec<Vec<Link>>,
}

impl<V: VertexKey, E: EdgeKey> GraphView<V, E> {
    /// Project a graph into a dense view.
    pub fn new(store: &GraphStore<V, E>) -> Self {
        let index_to_vertex: Vec<V> = store.vertices().cloned().collect();
        let node_count = index_to_vertex.len();

        let mut vertex_to_index = FxHashMap::default();
        vertex_to_index.reserve(node_count);
        for (idx, vertex) in index_to_vertex.iter().enumerate() {
            vertex_to_index.insert(vertex.clone(), idx);
        }

        let mut edges = Vec::with_capacity(store.edge_count());
        let mut endpoints = Vec::with_capacity(store.edge_count());
        let mut edge_types = Vec::with_capacity(store.edge_count());
        let mut outgoing = vec![Vec::new(); node_count];
        let mut incoming = vec![Vec::new(); node_count];

        for (edge, pair, edge_type) in store.edge_entries() {
            // Store invariant: endpoints are always members
            let (Some(&a), Some(&b)) = (
                vertex_to_index.get(pair.first()),
                vertex_to_index.get(pair.second()),
            ) else {
                continue;
            };
            let edge_idx = edges.len();
            edges.push(edge.clone());
            endpoints.push((a, b));
            edge_types.push(edge_type);

            outgoing[a].push(Link { edge: edge_idx, vertex: b });
            incoming[b].push(Link { edge: edge_idx, vertex: a });
            if edge_type == EdgeType::Undirected && a != b {
                outgoing[b].push(Link { edge: edge_idx, vertex: a });
                incoming[a].push(Link { edge: edge_idx, vertex: b });
            }
        }

        GraphView {
            node_count,
            index_to_vertex,
            vertex_to_index,
            edges,
            endpoints,
            edge_types,
            outgoing,
            incoming,
        }
    }

    /// Dense index of a vertex
    pub fn index_of(&self, vertex: &V) -> AlgoResult<usize> {
        self.vertex_to_index
            .get(vertex)
            .copied()
            .ok_or_else(|| GraphError::VertexNotFound(describe(vertex)).into())
    }

    /// Get the out-degree of a vertex (by index)
    pub fn out_degree(&self, idx: usize) -> usize {
        self.outgoing[idx].len()
    }

    /// Get the in-degree of a vertex (by index)
    pub fn in_degree(&self, idx: usize) -> usize {
        self.incoming[idx].len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True if the view holds no directed edge
    pub fn is_undirected(&self) -> bool {
        self.edge_types.iter().all(|t| *t == EdgeType::Undirected)
    }

    /// Adjacency ignoring direction: every non-loop edge is listed at both
    /// endpoints exactly once. Self-loops are omitted.
    pub fn undirected_adjacency(&self) -> Vec<Vec<Link>> {
        let mut adjacency = vec![Vec::new(); self.node_count];
        for (edge_idx, &(a, b)) in self.endpoints.iter().enumerate() {
            if a == b {
                continue;
            }
            adjacency[a].push(Link { edge: edge_idx, vertex: b });
            adjacency[b].push(Link { edge: edge_idx, vertex: a });
        }
        adjacency
    }
}
