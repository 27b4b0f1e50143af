//! Network flow algorithms
//!
//! Implements Max Flow / Min Cut using the Edmonds-Karp algorithm
//! (BFS-based Ford-Fulkerson) over an engine-owned residual multigraph.

use super::common::{AlgoError, AlgoResult};
use super::pathfinding::reconstruct_path;
use crate::graph::store::describe;
use crate::graph::{EdgeKey, EdgeType, FxIndexMap, FxIndexSet, GraphStore, VertexKey};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::ops::{Add, Sub};
use tracing::{debug, trace};

/// Numeric domain for capacities and flows.
///
/// Implemented for the primitive integer and floating point types.
pub trait FlowValue: Copy + PartialOrd + Debug + Add<Output = Self> + Sub<Output = Self> {
    fn zero() -> Self;

    /// False for values that must never enter a computation (NaN, infinities)
    fn is_valid(&self) -> bool {
        true
    }
}

macro_rules! impl_flow_value_int {
    ($($t:ty),*) => {
        $(impl FlowValue for $t {
            fn zero() -> Self {
                0
            }
        })*
    };
}

macro_rules! impl_flow_value_float {
    ($($t:ty),*) => {
        $(impl FlowValue for $t {
            fn zero() -> Self {
                0.0
            }

            fn is_valid(&self) -> bool {
                self.is_finite()
            }
        })*
    };
}

impl_flow_value_int!(i32, i64, u32, u64, usize);
impl_flow_value_float!(f32, f64);

/// Edge identity inside the residual graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlowEdge<E> {
    /// An edge of the input graph
    Original(E),
    /// Synthetic back-edge for an input edge with no antiparallel partner
    Reverse(E),
}

/// Lifecycle of an [`EdmondsKarp`] engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Constructed,
    Evaluating,
    Finalized,
}

/// Outcome of a max-flow computation
#[derive(Debug, Clone)]
pub struct FlowResult<V, E, C> {
    /// Total flow value (sum of augmenting bottlenecks)
    pub max_flow: C,
    /// Flow on every input edge, in input insertion order
    pub edge_flows: FxIndexMap<E, C>,
    /// Input edges from the source side to the sink side of the minimum cut
    pub min_cut_edges: Vec<E>,
    /// Vertices reachable from the source in the final residual graph
    pub source_partition: FxIndexSet<V>,
    /// Every other vertex
    pub sink_partition: FxIndexSet<V>,
    /// Number of augmenting paths applied
    pub augmentations: usize,
}

impl<V: VertexKey, E: EdgeKey, C: FlowValue> FlowResult<V, E, C> {
    pub fn flow(&self, edge: &E) -> Option<C> {
        self.edge_flows.get(edge).copied()
    }
}

/// Result of one breadth-first search over positive residual edges
struct Search<V, E, C> {
    /// Reached vertices in discovery order (source first)
    reached: FxIndexSet<V>,
    /// Residual edge through which each vertex was first reached
    parents: FxHashMap<V, FlowEdge<E>>,
    /// Bottleneck along the path to the sink, if it was reached
    sink_bottleneck: Option<C>,
}

/// Edmonds-Karp max-flow / min-cut engine.
///
/// Construction validates the endpoints and capacities and builds the
/// residual graph; [`evaluate`](Self::evaluate) runs the augmenting-path loop
/// and finalizes the result. The input graph is only read during
/// construction.
pub struct EdmondsKarp<V, E, C> {
    source: V,
    sink: V,
    /// Input capacities, keyed by input edge
    capacities: FxIndexMap<E, C>,
    /// Residual multigraph (directed)
    residual: GraphStore<V, FlowEdge<E>>,
    /// Remaining capacity on every residual edge
    residual_capacity: FxHashMap<FlowEdge<E>, C>,
    /// Residual edge that receives capacity when flow is pushed along the key
    twin: FxHashMap<FlowEdge<E>, FlowEdge<E>>,
    max_flow: C,
    augmentations: usize,
    state: FlowState,
    result: Option<FlowResult<V, E, C>>,
}

impl<V, E, C> EdmondsKarp<V, E, C>
where
    V: VertexKey,
    E: EdgeKey,
    C: FlowValue,
{
    /// Build the engine for `graph`, flowing from `source` to `sink`.
    ///
    /// `capacity` must return a positive, finite capacity for every edge.
    /// Every edge must be directed.
    pub fn new<F>(graph: &GraphStore<V, E>, source: V, sink: V, capacity: F) -> AlgoResult<Self>
    where
        F: Fn(&E) -> Option<C>,
    {
        if source == sink {
            return Err(AlgoError::InvalidEndpoints(format!(
                "source and sink are the same vertex {}",
                describe(&source)
            )));
        }
        for vertex in [&source, &sink] {
            if !graph.contains_vertex(vertex) {
                return Err(AlgoError::InvalidEndpoints(format!(
                    "vertex {} is not in the graph",
                    describe(vertex)
                )));
            }
        }

        let mut residual = GraphStore::new();
        for vertex in graph.vertices() {
            residual.add_vertex(vertex.clone());
        }

        let mut capacities = FxIndexMap::default();
        let mut residual_capacity = FxHashMap::default();

        for edge in graph.edges() {
            let from = graph.source(edge)?.clone();
            let to = graph.dest(edge)?.clone();

            let cap = capacity(edge).ok_or_else(|| AlgoError::MissingCapacity(describe(edge)))?;
            if !cap.is_valid() || cap <= C::zero() {
                return Err(AlgoError::InvalidCapacity(describe(edge)));
            }

            residual.add_edge(FlowEdge::Original(edge.clone()), (from, to), EdgeType::Directed)?;
            capacities.insert(edge.clone(), cap);
            residual_capacity.insert(FlowEdge::Original(edge.clone()), cap);
        }

        let twin = Self::pair_back_edges(&mut residual, &capacities, &mut residual_capacity)?;

        debug!(
            vertices = residual.vertex_count(),
            residual_edges = residual.edge_count(),
            "built residual flow graph"
        );

        Ok(EdmondsKarp {
            source,
            sink,
            capacities,
            residual,
            residual_capacity,
            twin,
            max_flow: C::zero(),
            augmentations: 0,
            state: FlowState::Constructed,
            result: None,
        })
    }

    /// Give every input edge a twin that absorbs pushed flow: an unpaired
    /// antiparallel input edge if one exists, otherwise a synthetic
    /// zero-capacity back-edge.
    fn pair_back_edges(
        residual: &mut GraphStore<V, FlowEdge<E>>,
        capacities: &FxIndexMap<E, C>,
        residual_capacity: &mut FxHashMap<FlowEdge<E>, C>,
    ) -> AlgoResult<FxHashMap<FlowEdge<E>, FlowEdge<E>>> {
        let mut twin: FxHashMap<FlowEdge<E>, FlowEdge<E>> = FxHashMap::default();

        for edge in capacities.keys() {
            let forward = FlowEdge::Original(edge.clone());
            if twin.contains_key(&forward) {
                continue;
            }
            let endpoints = residual.endpoints(&forward)?.clone();
            let (from, to) = endpoints.into_tuple();

            let partner = if from == to {
                None
            } else {
                residual
                    .find_edge_set(&to, &from)
                    .into_iter()
                    .find(|candidate| {
                        matches!(candidate, FlowEdge::Original(_)) && !twin.contains_key(candidate)
                    })
            };

            let back = match partner {
                Some(partner) => partner,
                None => {
                    let back = FlowEdge::Reverse(edge.clone());
                    residual.add_edge(back.clone(), (to, from), EdgeType::Directed)?;
                    residual_capacity.insert(back.clone(), C::zero());
                    back
                }
            };

            twin.insert(back.clone(), forward.clone());
            twin.insert(forward, back);
        }

        Ok(twin)
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// The engine-owned residual graph
    pub fn residual_graph(&self) -> &GraphStore<V, FlowEdge<E>> {
        &self.residual
    }

    /// Remaining capacity on a residual edge
    pub fn residual_capacity(&self, edge: &FlowEdge<E>) -> Option<C> {
        self.residual_capacity.get(edge).copied()
    }

    /// Run augmenting-path iterations until none remains, then finalize.
    ///
    /// Evaluating an already finalized engine is a no-op.
    pub fn evaluate(&mut self) -> AlgoResult<&FlowResult<V, E, C>> {
        if self.result.is_none() {
            self.state = FlowState::Evaluating;

            let final_search = loop {
                let search = self.search()?;
                match search.sink_bottleneck {
                    Some(bottleneck) if bottleneck > C::zero() => {
                        let path = reconstruct_path(
                            &self.residual,
                            &search.parents,
                            &self.source,
                            &self.sink,
                        )?;
                        self.augment(&path, bottleneck)?;
                    }
                    _ => break search,
                }
            };

            let result = self.finalize(final_search.reached);
            self.result = Some(result);
            self.state = FlowState::Finalized;
        }

        self.result.as_ref().ok_or_else(|| {
            AlgoError::InvalidParameter("flow evaluation produced no result".to_string())
        })
    }

    /// The finalized result, if [`evaluate`](Self::evaluate) has completed
    pub fn result(&self) -> Option<&FlowResult<V, E, C>> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<FlowResult<V, E, C>> {
        self.result
    }

    /// Breadth-first search from the source over positive residual edges,
    /// tracking the tightest bottleneck seen on the way to each vertex.
    fn search(&self) -> AlgoResult<Search<V, E, C>> {
        let mut reached: FxIndexSet<V> = FxIndexSet::default();
        let mut parents: FxHashMap<V, FlowEdge<E>> = FxHashMap::default();
        let mut bottleneck: FxHashMap<V, C> = FxHashMap::default();
        let mut queue = VecDeque::new();

        reached.insert(self.source.clone());
        queue.push_back(self.source.clone());

        while let Some(current) = queue.pop_front() {
            for edge in self.residual.out_edges(&current)? {
                let remaining = self.residual_capacity(&edge).unwrap_or_else(C::zero);
                if remaining <= C::zero() {
                    continue;
                }
                let next = self.residual.dest(&edge)?.clone();
                if reached.contains(&next) {
                    continue;
                }

                let limit = match bottleneck.get(&current) {
                    Some(&upstream) if upstream < remaining => upstream,
                    _ => remaining,
                };

                reached.insert(next.clone());
                parents.insert(next.clone(), edge);
                bottleneck.insert(next.clone(), limit);

                if next == self.sink {
                    return Ok(Search {
                        reached,
                        parents,
                        sink_bottleneck: Some(limit),
                    });
                }
                queue.push_back(next);
            }
        }

        Ok(Search {
            reached,
            parents,
            sink_bottleneck: None,
        })
    }

    /// Push `amount` along `path`: forward residuals shrink, twins grow
    fn augment(&mut self, path: &[FlowEdge<E>], amount: C) -> AlgoResult<()> {
        let iteration = self.augmentations + 1;

        for edge in path {
            let back = self.twin.get(edge).cloned().ok_or_else(|| {
                AlgoError::InvalidParameter(format!("residual edge {} has no twin", describe(edge)))
            })?;

            let forward_left = self.residual_capacity(edge).unwrap_or_else(C::zero) - amount;
            let back_left = self.residual_capacity(&back).unwrap_or_else(C::zero) + amount;
            if !forward_left.is_valid() || !back_left.is_valid() {
                return Err(AlgoError::NonFiniteValue { iteration });
            }

            self.residual_capacity.insert(edge.clone(), forward_left);
            self.residual_capacity.insert(back, back_left);
        }

        self.max_flow = self.max_flow + amount;
        self.augmentations += 1;
        trace!(
            augmentation = self.augmentations,
            path_len = path.len(),
            amount = ?amount,
            "pushed flow along augmenting path"
        );
        Ok(())
    }

    fn finalize(&self, source_side: FxIndexSet<V>) -> FlowResult<V, E, C> {
        let sink_side: FxIndexSet<V> = self
            .residual
            .vertices()
            .filter(|vertex| !source_side.contains(*vertex))
            .cloned()
            .collect();

        let mut edge_flows = FxIndexMap::default();
        let mut min_cut_edges = Vec::new();

        for (flow_edge, endpoints, _) in self.residual.edge_entries() {
            // Synthetic back-edges have no input capacity and are dropped
            let FlowEdge::Original(edge) = flow_edge else {
                continue;
            };
            let Some(&capacity) = self.capacities.get(edge) else {
                continue;
            };

            let remaining = self.residual_capacity(flow_edge).unwrap_or(capacity);
            // A paired antiparallel edge can hold more residual than its own
            // capacity: that flow belongs to its partner
            let flow = if remaining >= capacity {
                C::zero()
            } else {
                capacity - remaining
            };
            edge_flows.insert(edge.clone(), flow);

            if source_side.contains(endpoints.first()) && !source_side.contains(endpoints.second()) {
                min_cut_edges.push(edge.clone());
            }
        }

        debug!(
            max_flow = ?self.max_flow,
            augmentations = self.augmentations,
            cut_edges = min_cut_edges.len(),
            "max flow finalized"
        );

        FlowResult {
            max_flow: self.max_flow,
            edge_flows,
            min_cut_edges,
            source_partition: source_side,
            sink_partition: sink_side,
            augmentations: self.augmentations,
        }
    }
}

/// Convenience: run Edmonds-Karp to completion
pub fn edmonds_karp<V, E, C, F>(
    graph: &GraphStore<V, E>,
    source: V,
    sink: V,
    capacity: F,
) -> AlgoResult<FlowResult<V, E, C>>
where
    V: VertexKey,
    E: EdgeKey,
    C: FlowValue,
    F: Fn(&E) -> Option<C>,
{
    let mut engine = EdmondsKarp::new(graph, source, sink, capacity)?;
    engine.evaluate()?;
    engine.into_result().ok_or_else(|| {
        AlgoError::InvalidParameter("flow evaluation produced no result".to_string())
    })
}
