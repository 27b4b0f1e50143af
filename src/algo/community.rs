//! Connectivity and clustering
//!
//! Weakly connected components, biconnected components with articulation
//! points, and edge-betweenness clustering.

use super::betweenness::BetweennessCentrality;
use super::common::{AlgoError, AlgoResult, GraphView};
use crate::graph::{EdgeKey, GraphStore, VertexKey};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Result of WCC algorithm
#[derive(Debug, Clone)]
pub struct WccResult<V> {
    /// Components ordered by their first vertex; members in insertion order
    pub components: Vec<Vec<V>>,
    /// Map of vertex -> index into `components`
    pub node_component: FxHashMap<V, usize>,
}

impl<V: VertexKey> WccResult<V> {
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn component_of(&self, vertex: &V) -> Option<usize> {
        self.node_component.get(vertex).copied()
    }

    pub fn same_component(&self, a: &V, b: &V) -> bool {
        match (self.component_of(a), self.component_of(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }
}

/// Union-Find data structure
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        UnionFind {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        let mut node = i;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, i: usize, j: usize) {
        let root_i = self.find(i);
        let root_j = self.find(j);

        if root_i != root_j {
            if self.rank[root_i] < self.rank[root_j] {
                self.parent[root_i] = root_j;
            } else if self.rank[root_i] > self.rank[root_j] {
                self.parent[root_j] = root_i;
            } else {
                self.parent[root_j] = root_i;
                self.rank[root_i] += 1;
            }
        }
    }
}

/// Weakly Connected Components (WCC)
///
/// Partitions the vertex set, ignoring edge direction.
pub fn weak_components<V: VertexKey, E: EdgeKey>(graph: &GraphStore<V, E>) -> WccResult<V> {
    let view = GraphView::new(graph);
    let n = view.node_count;
    let mut uf = UnionFind::new(n);

    for &(a, b) in &view.endpoints {
        uf.union(a, b);
    }

    let mut root_slot: FxHashMap<usize, usize> = FxHashMap::default();
    let mut components: Vec<Vec<V>> = Vec::new();
    let mut node_component = FxHashMap::default();
    node_component.reserve(n);

    for (idx, vertex) in view.index_to_vertex.iter().enumerate() {
        let root = uf.find(idx);
        let slot = *root_slot.entry(root).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[slot].push(vertex.clone());
        node_component.insert(vertex.clone(), slot);
    }

    trace!(vertices = n, components = components.len(), "weak components");
    WccResult {
        components,
        node_component,
    }
}

/// Biconnected components of the underlying undirected graph
#[derive(Debug, Clone)]
pub struct BiconnectedResult<V, E> {
    /// Vertex sets; articulation points appear in more than one
    pub components: Vec<Vec<V>>,
    /// Edge sets aligned with `components`; each edge appears exactly once
    pub component_edges: Vec<Vec<E>>,
    /// Articulation points in insertion order
    pub articulation_points: Vec<V>,
}

impl<V: VertexKey, E: EdgeKey> BiconnectedResult<V, E> {
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn is_articulation_point(&self, vertex: &V) -> bool {
        self.articulation_points.contains(vertex)
    }

    /// Indices of the components a vertex belongs to
    pub fn components_of(&self, vertex: &V) -> Vec<usize> {
        self.components
            .iter()
            .enumerate()
            .filter(|(_, members)| members.contains(vertex))
            .map(|(idx, _)| idx)
            .collect()
    }
}

#[derive(Clone, Copy, Default)]
struct NodeInfo {
    discovery: usize,
    low: usize,
}

impl NodeInfo {
    fn update_low(&mut self, value: usize) {
        self.low = self.low.min(value);
    }
}

/// DFS frame: vertex, edge used to reach it, next adjacency position
struct Frame {
    vertex: usize,
    via: Option<usize>,
    cursor: usize,
}

/// Biconnected components (Tarjan low-link, iterative).
///
/// Direction is ignored. Every non-loop edge lands in exactly one component.
/// Self-loops are attached to the first component holding their vertex and
/// vertices without other neighbors form singleton components.
pub fn biconnected_components<V: VertexKey, E: EdgeKey>(graph: &GraphStore<V, E>) -> BiconnectedResult<V, E> {
    let view = GraphView::new(graph);
    let n = view.node_count;
    let adjacency = view.undirected_adjacency();

    let mut info: Vec<Option<NodeInfo>> = vec![None; n];
    let mut is_articulation = vec![false; n];
    let mut edge_stack: Vec<usize> = Vec::new();
    let mut edge_groups: Vec<Vec<usize>> = Vec::new();
    let mut singletons: Vec<usize> = Vec::new();
    let mut time = 0;

    for root in 0..n {
        if info[root].is_some() {
            continue;
        }
        info[root] = Some(NodeInfo {
            discovery: time,
            low: time,
        });
        time += 1;
        if adjacency[root].is_empty() {
            singletons.push(root);
            continue;
        }

        let mut root_children = 0;
        let mut stack = vec![Frame {
            vertex: root,
            via: None,
            cursor: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let v = frame.vertex;
            if let Some(link) = adjacency[v].get(frame.cursor).copied() {
                frame.cursor += 1;
                if Some(link.edge) == frame.via {
                    continue;
                }
                let w = link.vertex;
                let v_disc = info[v].map_or(0, |i| i.discovery);
                match info[w] {
                    None => {
                        edge_stack.push(link.edge);
                        info[w] = Some(NodeInfo {
                            discovery: time,
                            low: time,
                        });
                        time += 1;
                        if v == root {
                            root_children += 1;
                        }
                        stack.push(Frame {
                            vertex: w,
                            via: Some(link.edge),
                            cursor: 0,
                        });
                    }
                    Some(w_info) if w_info.discovery < v_disc => {
                        // Back edge to an ancestor
                        edge_stack.push(link.edge);
                        if let Some(v_info) = info[v].as_mut() {
                            v_info.update_low(w_info.discovery);
                        }
                    }
                    // Edge to a finished descendant, already stacked from its side
                    Some(_) => {}
                }
            } else {
                let Some(done) = stack.pop() else { break };
                let Some(parent) = stack.last() else { continue };
                let u = parent.vertex;
                let (Some(v_info), Some(mut u_info)) = (info[done.vertex], info[u]) else {
                    continue;
                };
                u_info.update_low(v_info.low);
                info[u] = Some(u_info);

                if v_info.low >= u_info.discovery {
                    if u != root {
                        is_articulation[u] = true;
                    }
                    let mut group = Vec::new();
                    while let Some(edge) = edge_stack.pop() {
                        group.push(edge);
                        if Some(edge) == done.via {
                            break;
                        }
                    }
                    edge_groups.push(group);
                }
            }
        }

        if root_children > 1 {
            is_articulation[root] = true;
        }
    }

    // Materialize groups in insertion order of their members
    let mut components = Vec::with_capacity(edge_groups.len() + singletons.len());
    let mut component_edges = Vec::with_capacity(edge_groups.len() + singletons.len());
    let mut first_component: Vec<Option<usize>> = vec![None; n];

    for mut group in edge_groups {
        group.sort_unstable();
        let mut members: Vec<usize> = group
            .iter()
            .flat_map(|&edge| {
                let (a, b) = view.endpoints[edge];
                [a, b]
            })
            .collect();
        members.sort_unstable();
        members.dedup();
        let slot = components.len();
        for &m in &members {
            first_component[m].get_or_insert(slot);
        }
        components.push(members);
        component_edges.push(group);
    }
    for vertex in singletons {
        first_component[vertex] = Some(components.len());
        components.push(vec![vertex]);
        component_edges.push(Vec::new());
    }

    for (edge, &(a, b)) in view.endpoints.iter().enumerate() {
        if a == b {
            if let Some(slot) = first_component[a] {
                component_edges[slot].push(edge);
            }
        }
    }

    let articulation_points: Vec<V> = (0..n)
        .filter(|&idx| is_articulation[idx])
        .map(|idx| view.index_to_vertex[idx].clone())
        .collect();

    debug!(
        components = components.len(),
        articulation_points = articulation_points.len(),
        "biconnected components"
    );

    BiconnectedResult {
        components: components
            .into_iter()
            .map(|members| members.into_iter().map(|m| view.index_to_vertex[m].clone()).collect())
            .collect(),
        component_edges: component_edges
            .into_iter()
            .map(|edges| edges.into_iter().map(|e| view.edges[e].clone()).collect())
            .collect(),
        articulation_points,
    }
}

/// When edge-betweenness clustering stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum ClusterTarget {
    /// Remove edges until at least this many weak components exist
    Components(usize),
    /// Remove exactly this many edges
    EdgesRemoved(usize),
}

impl Default for ClusterTarget {
    fn default() -> Self {
        ClusterTarget::Components(2)
    }
}

/// Clusters produced by [`EdgeBetweennessClusterer`]
#[derive(Debug, Clone)]
pub struct ClusteringResult<V, E> {
    /// Weak components of the graph after removal
    pub clusters: Vec<Vec<V>>,
    /// Removed edges, in removal order
    pub removed_edges: Vec<E>,
}

impl<V: VertexKey, E: EdgeKey> ClusteringResult<V, E> {
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn cluster_of(&self, vertex: &V) -> Option<usize> {
        self.clusters.iter().position(|members| members.contains(vertex))
    }
}

/// Girvan-Newman style divisive clustering: repeatedly remove the edge with
/// the highest betweenness. Runs on a private copy of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeBetweennessClusterer {
    target: ClusterTarget,
}

impl EdgeBetweennessClusterer {
    pub fn new(target: ClusterTarget) -> Self {
        EdgeBetweennessClusterer { target }
    }

    pub fn target(&self) -> ClusterTarget {
        self.target
    }

    fn validate<V: VertexKey, E: EdgeKey>(&self, graph: &GraphStore<V, E>) -> AlgoResult<()> {
        match self.target {
            ClusterTarget::Components(k) if k == 0 || k > graph.vertex_count() => {
                Err(AlgoError::InvalidParameter(format!(
                    "target of {} components is outside 1..={}",
                    k,
                    graph.vertex_count()
                )))
            }
            ClusterTarget::EdgesRemoved(count) if count > graph.edge_count() => {
                Err(AlgoError::InvalidParameter(format!(
                    "cannot remove {} edges from a graph with {}",
                    count,
                    graph.edge_count()
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn cluster<V: VertexKey, E: EdgeKey>(&self, graph: &GraphStore<V, E>) -> AlgoResult<ClusteringResult<V, E>> {
        self.validate(graph)?;

        let mut working = graph.clone();
        let mut removed_edges = Vec::new();

        loop {
            let wcc = weak_components(&working);
            let done = match self.target {
                ClusterTarget::Components(k) => wcc.component_count() >= k,
                ClusterTarget::EdgesRemoved(count) => removed_edges.len() >= count,
            };
            if done {
                debug!(
                    clusters = wcc.component_count(),
                    removed = removed_edges.len(),
                    "edge betweenness clustering finished"
                );
                return Ok(ClusteringResult {
                    clusters: wcc.components,
                    removed_edges,
                });
            }

            let betweenness = BetweennessCentrality::new(&working);
            let Some((edge, score)) = betweenness.max_edge() else {
                // No edges left: every vertex is already its own cluster
                return Ok(ClusteringResult {
                    clusters: wcc.components,
                    removed_edges,
                });
            };
            let edge = edge.clone();
            trace!(edge = ?edge, score, "removing edge");
            working.remove_edge(&edge)?;
            removed_edges.push(edge);
        }
    }
}
