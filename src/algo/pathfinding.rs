//! Pathfinding algorithms
//!
//! Shortest-path trees (unweighted BFS layering and Dijkstra) expressed as
//! predecessor-edge maps, and reconstruction of edge paths from such maps.

use super::common::{AlgoError, AlgoResult, GraphView};
use crate::graph::store::describe;
use crate::graph::{EdgeKey, FxIndexMap, GraphError, GraphStore, VertexKey};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::hash::BuildHasher;
use tracing::debug;

/// Shortest-path tree rooted at `source`
#[derive(Debug, Clone)]
pub struct ShortestPathTree<V, E> {
    pub source: V,
    /// Distance of every reached vertex, in discovery order
    pub distances: FxIndexMap<V, f64>,
    /// Incoming tree edge of every reached vertex except the source
    pub predecessors: FxHashMap<V, E>,
}

impl<V: VertexKey, E: EdgeKey> ShortestPathTree<V, E> {
    pub fn distance(&self, target: &V) -> Option<f64> {
        self.distances.get(target).copied()
    }

    pub fn is_reachable(&self, target: &V) -> bool {
        self.distances.contains_key(target)
    }

    /// Edge sequence from the tree's source to `target`
    pub fn path_to(&self, graph: &GraphStore<V, E>, target: &V) -> AlgoResult<Vec<E>> {
        reconstruct_path(graph, &self.predecessors, &self.source, target)
    }
}

/// Reconstruct the ordered edge sequence from `source` to `target`.
///
/// Walks back from `target` through `predecessors`, moving to the opposite
/// endpoint of each edge until `source` is reached. Returns an empty path if
/// `target` has no entry or equals `source`. A chain longer than the vertex
/// count, or one that breaks before reaching `source`, is reported as
/// [`AlgoError::MalformedPredecessorMap`].
pub fn reconstruct_path<V, E, S>(
    graph: &GraphStore<V, E>,
    predecessors: &HashMap<V, E, S>,
    source: &V,
    target: &V,
) -> AlgoResult<Vec<E>>
where
    V: VertexKey,
    E: EdgeKey,
    S: BuildHasher,
{
    if source == target || !predecessors.contains_key(target) {
        return Ok(Vec::new());
    }

    let limit = graph.vertex_count();
    let mut path = Vec::new();
    let mut current = target;

    while current != source {
        let edge = predecessors.get(current).ok_or_else(|| {
            AlgoError::MalformedPredecessorMap(format!(
                "chain from {} breaks at {} before reaching {}",
                describe(target),
                describe(current),
                describe(source)
            ))
        })?;
        if path.len() >= limit {
            return Err(AlgoError::MalformedPredecessorMap(format!(
                "chain from {} exceeds {} steps",
                describe(target),
                limit
            )));
        }
        path.push(edge.clone());
        current = graph.opposite(current, edge)?;
    }

    path.reverse();
    Ok(path)
}

/// Breadth-First Search (unweighted shortest-path tree)
///
/// Follows out-edges (undirected edges in both directions). The first
/// discovered predecessor of each vertex wins.
pub fn bfs_tree<V: VertexKey, E: EdgeKey>(
    graph: &GraphStore<V, E>,
    source: &V,
) -> AlgoResult<ShortestPathTree<V, E>> {
    let view = GraphView::new(graph);
    let source_idx = view.index_of(source)?;

    let mut depth: Vec<Option<usize>> = vec![None; view.node_count];
    let mut parent_edge: Vec<Option<usize>> = vec![None; view.node_count];
    let mut order = Vec::with_capacity(view.node_count);
    let mut queue = VecDeque::new();

    depth[source_idx] = Some(0);
    queue.push_back(source_idx);

    while let Some(current_idx) = queue.pop_front() {
        order.push(current_idx);
        let next_depth = depth[current_idx].unwrap_or(0) + 1;

        for link in &view.outgoing[current_idx] {
            if depth[link.vertex].is_none() {
                depth[link.vertex] = Some(next_depth);
                parent_edge[link.vertex] = Some(link.edge);
                queue.push_back(link.vertex);
            }
        }
    }

    let hops = |idx: usize| depth[idx].map(|d| d as f64);
    let tree = collect_tree(&view, source, &order, hops, &parent_edge);
    debug!(reached = tree.distances.len(), "bfs tree complete");
    Ok(tree)
}

/// State for Dijkstra priority queue
#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: f64,
    node_idx: usize,
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Compare costs reversed for min-heap, then prefer lower index
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.node_idx.cmp(&self.node_idx))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra's Algorithm (weighted shortest-path tree)
///
/// `weight` gives the cost of each edge; costs must be non-negative and
/// finite, otherwise [`AlgoError::InvalidWeight`] is returned.
pub fn dijkstra_tree<V, E, W>(
    graph: &GraphStore<V, E>,
    source: &V,
    weight: W,
) -> AlgoResult<ShortestPathTree<V, E>>
where
    V: VertexKey,
    E: EdgeKey,
    W: Fn(&E) -> f64,
{
    let view = GraphView::new(graph);
    let source_idx = view.index_of(source)?;

    let mut costs = Vec::with_capacity(view.edge_count());
    for edge in &view.edges {
        let cost = weight(edge);
        if !cost.is_finite() || cost < 0.0 {
            return Err(AlgoError::InvalidWeight(describe(edge)));
        }
        costs.push(cost);
    }

    let mut dist: Vec<Option<f64>> = vec![None; view.node_count];
    let mut parent_edge: Vec<Option<usize>> = vec![None; view.node_count];
    let mut settled = vec![false; view.node_count];
    let mut order = Vec::with_capacity(view.node_count);
    let mut heap = BinaryHeap::new();

    dist[source_idx] = Some(0.0);
    heap.push(State { cost: 0.0, node_idx: source_idx });

    while let Some(State { cost, node_idx }) = heap.pop() {
        if settled[node_idx] {
            continue;
        }
        settled[node_idx] = true;
        order.push(node_idx);

        for link in &view.outgoing[node_idx] {
            let next_cost = cost + costs[link.edge];
            let better = match dist[link.vertex] {
                Some(known) => next_cost < known,
                None => true,
            };
            if better && !settled[link.vertex] {
                dist[link.vertex] = Some(next_cost);
                parent_edge[link.vertex] = Some(link.edge);
                heap.push(State { cost: next_cost, node_idx: link.vertex });
            }
        }
    }

    let tree = collect_tree(&view, source, &order, |idx| dist[idx], &parent_edge);
    debug!(reached = tree.distances.len(), "dijkstra tree complete");
    Ok(tree)
}

fn collect_tree<V, E, D>(
    view: &GraphView<V, E>,
    source: &V,
    order: &[usize],
    distance: D,
    parent_edge: &[Option<usize>],
) -> ShortestPathTree<V, E>
where
    V: VertexKey,
    E: EdgeKey,
    D: Fn(usize) -> Option<f64>,
{
    let mut distances = FxIndexMap::default();
    let mut predecessors = FxHashMap::default();

    for &idx in order {
        let vertex = view.index_to_vertex[idx].clone();
        if let Some(d) = distance(idx) {
            distances.insert(vertex.clone(), d);
        }
        if let Some(edge_idx) = parent_edge[idx] {
            predecessors.insert(vertex, view.edges[edge_idx].clone());
        }
    }

    ShortestPathTree {
        source: source.clone(),
        distances,
        predecessors,
    }
}

/// Convenience: shortest unweighted edge path, empty if unreachable
pub fn shortest_path<V: VertexKey, E: EdgeKey>(
    graph: &GraphStore<V, E>,
    source: &V,
    target: &V,
) -> AlgoResult<Vec<E>> {
    if !graph.contains_vertex(target) {
        return Err(GraphError::VertexNotFound(describe(target)).into());
    }
    bfs_tree(graph, source)?.path_to(graph, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStore;

    fn diamond() -> GraphStore<u32, &'static str> {
        // 1 -> 2 -> 4, 1 -> 3 -> 4, 4 -- 5
        let mut store = GraphStore::new();
        for v in 1..=5 {
            store.add_vertex(v);
        }
        store.add_directed_edge("a", 1, 2).unwrap();
        store.add_directed_edge("b", 1, 3).unwrap();
        store.add_directed_edge("c", 2, 4).unwrap();
        store.add_directed_edge("d", 3, 4).unwrap();
        store.add_undirected_edge("e", 4, 5).unwrap();
        store
    }

    #[test]
    fn test_bfs_tree() {
        let store = diamond();
        let tree = bfs_tree(&store, &1).unwrap();

        assert_eq!(tree.distance(&1), Some(0.0));
        assert_eq!(tree.distance(&4), Some(2.0));
        assert_eq!(tree.distance(&5), Some(3.0));
        // First-discovered predecessor wins
        assert_eq!(tree.predecessors.get(&4), Some(&"c"));
        assert_eq!(tree.path_to(&store, &5).unwrap(), vec!["a", "c", "e"]);
    }

    #[test]
    fn test_bfs_respects_direction() {
        let store = diamond();
        let tree = bfs_tree(&store, &4).unwrap();
        assert!(tree.is_reachable(&5));
        assert!(!tree.is_reachable(&1));
        assert!(tree.path_to(&store, &1).unwrap().is_empty());
    }

    #[test]
    fn test_dijkstra_tree() {
        let store = diamond();
        let weights: FxHashMap<&str, f64> =
            [("a", 5.0), ("b", 1.0), ("c", 1.0), ("d", 1.0), ("e", 2.5)]
                .into_iter()
                .collect();
        let tree = dijkstra_tree(&store, &1, |e| weights[e]).unwrap();

        assert_eq!(tree.distance(&4), Some(2.0));
        assert_eq!(tree.distance(&5), Some(4.5));
        assert_eq!(tree.path_to(&store, &5).unwrap(), vec!["b", "d", "e"]);
    }

    #[test]
    fn test_dijkstra_rejects_negative_weight() {
        let store = diamond();
        let result = dijkstra_tree(&store, &1, |e| if *e == "c" { -1.0 } else { 1.0 });
        assert_eq!(result.unwrap_err(), AlgoError::InvalidWeight("\"c\"".to_string()));
    }

    #[test]
    fn test_reconstruct_trivial_cases() {
        let store = diamond();
        let predecessors: FxHashMap<u32, &str> = FxHashMap::default();
        assert!(reconstruct_path(&store, &predecessors, &1, &1).unwrap().is_empty());
        assert!(reconstruct_path(&store, &predecessors, &1, &4).unwrap().is_empty());
    }

    #[test]
    fn test_reconstruct_detects_cycle() {
        let mut store: GraphStore<u32, &str> = GraphStore::new();
        for v in 1..=3 {
            store.add_vertex(v);
        }
        store.add_undirected_edge("x", 2, 3).unwrap();

        // 2 and 3 point at each other and never reach 1
        let mut predecessors = HashMap::new();
        predecessors.insert(2, "x");
        predecessors.insert(3, "x");

        let result = reconstruct_path(&store, &predecessors, &1, &3);
        assert!(matches!(result, Err(AlgoError::MalformedPredecessorMap(_))));
    }

    #[test]
    fn test_reconstruct_detects_broken_chain() {
        let store = diamond();
        let mut predecessors = HashMap::new();
        predecessors.insert(4, "c");
        let result = reconstruct_path(&store, &predecessors, &1, &4);
        assert!(matches!(result, Err(AlgoError::MalformedPredecessorMap(_))));
    }

    #[test]
    fn test_shortest_path_unknown_target() {
        let store = diamond();
        assert!(shortest_path(&store, &1, &99).is_err());
        assert_eq!(shortest_path(&store, &1, &4).unwrap(), vec!["a", "c"]);
    }
}
