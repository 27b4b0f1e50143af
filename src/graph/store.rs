//! In-memory multigraph storage implementation
//!
//! Incidence-based storage for mixed directed/undirected multigraphs:
//! - vertices: V -> Incidence (per-vertex incident edge sets)
//! - edges: E -> EdgeRecord (endpoint pair and edge type)
//!
//! Both maps preserve insertion order, so every traversal (and every
//! algorithm built on one) is deterministic.

use super::types::{EdgeKey, EdgeType, GraphId, Pair, VertexKey};
use super::{FxIndexMap, FxIndexSet};
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Vertex {0} not found")]
    VertexNotFound(String),

    #[error("Edge {0} not found")]
    EdgeNotFound(String),

    #[error("Invalid endpoint: vertex {0} is not a member of the graph")]
    InvalidEndpoint(String),

    #[error("Edge {0} already exists")]
    DuplicateEdge(String),

    #[error("Edge {0} is undirected and has no source or destination")]
    UndirectedEdge(String),

    #[error("Vertex {vertex} is not incident to edge {edge}")]
    NotIncident { vertex: String, edge: String },
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Render an element identity for an error message
pub(crate) fn describe<T: std::fmt::Debug>(value: &T) -> String {
    format!("{:?}", value)
}

/// Endpoint pair and type of a stored edge
#[derive(Debug, Clone, PartialEq, Eq)]
struct EdgeRecord<V> {
    endpoints: Pair<V>,
    edge_type: EdgeType,
}

/// Per-vertex incidence bookkeeping
#[derive(Debug, Clone)]
struct Incidence<E> {
    /// Every incident edge, in insertion order (self-loops listed once)
    incident: FxIndexSet<E>,
    /// Directed edges whose destination is this vertex
    incoming: FxIndexSet<E>,
    /// Directed edges whose source is this vertex
    outgoing: FxIndexSet<E>,
}

impl<E: EdgeKey> Incidence<E> {
    fn new() -> Self {
        Incidence {
            incident: FxIndexSet::default(),
            incoming: FxIndexSet::default(),
            outgoing: FxIndexSet::default(),
        }
    }
}

/// Mutable, typed multigraph
///
/// Supports directed and undirected edges in the same graph, parallel edges
/// and self-loops. Vertex and edge identities are caller-supplied values.
///
/// In/out queries follow the multigraph convention: an undirected edge is
/// both an in-edge and an out-edge of each of its endpoints.
#[derive(Debug)]
pub struct GraphStore<V, E> {
    /// Identity of this instance (fresh for every clone)
    id: GraphId,

    /// Bumped on every structural mutation
    generation: u64,

    /// Vertex set with incidence indices
    vertices: FxIndexMap<V, Incidence<E>>,

    /// Edge set with endpoints
    edges: FxIndexMap<E, EdgeRecord<V>>,
}

impl<V: VertexKey, E: EdgeKey> Default for GraphStore<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: VertexKey, E: EdgeKey> Clone for GraphStore<V, E> {
    fn clone(&self) -> Self {
        GraphStore {
            id: GraphId::next(),
            generation: self.generation,
            vertices: self.vertices.clone(),
            edges: self.edges.clone(),
        }
    }
}

impl<V: VertexKey, E: EdgeKey> GraphStore<V, E> {
    /// Create a new empty graph
    pub fn new() -> Self {
        GraphStore {
            id: GraphId::next(),
            generation: 0,
            vertices: FxIndexMap::default(),
            edges: FxIndexMap::default(),
        }
    }

    /// Identity of this graph instance
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Structural generation; changes whenever a vertex or edge is added or removed
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ----------------------------------------------------------------
    // Mutation
    // ----------------------------------------------------------------

    /// Add a vertex. Returns `false` if it was already a member.
    pub fn add_vertex(&mut self, vertex: V) -> bool {
        if self.vertices.contains_key(&vertex) {
            return false;
        }
        self.vertices.insert(vertex, Incidence::new());
        self.generation += 1;
        true
    }

    /// Remove a vertex and, first, every edge incident to it.
    ///
    /// Returns the removed edges in incidence order.
    pub fn remove_vertex(&mut self, vertex: &V) -> GraphResult<Vec<E>> {
        let incident: Vec<E> = self
            .incidence(vertex)?
            .incident
            .iter()
            .cloned()
            .collect();

        for edge in &incident {
            self.remove_edge(edge)?;
        }

        self.vertices.shift_remove(vertex);
        self.generation += 1;
        Ok(incident)
    }

    /// Add an edge between two existing vertices.
    pub fn add_edge(
        &mut self,
        edge: E,
        endpoints: impl Into<Pair<V>>,
        edge_type: EdgeType,
    ) -> GraphResult<()> {
        let endpoints = endpoints.into();

        // Validate before touching any index
        if self.edges.contains_key(&edge) {
            return Err(GraphError::DuplicateEdge(describe(&edge)));
        }
        for vertex in [endpoints.first(), endpoints.second()] {
            if !self.vertices.contains_key(vertex) {
                return Err(GraphError::InvalidEndpoint(describe(vertex)));
            }
        }

        let (first, second) = (endpoints.first().clone(), endpoints.second().clone());

        if let Some(inc) = self.vertices.get_mut(&first) {
            inc.incident.insert(edge.clone());
            if edge_type == EdgeType::Directed {
                inc.outgoing.insert(edge.clone());
            }
        }
        if let Some(inc) = self.vertices.get_mut(&second) {
            inc.incident.insert(edge.clone());
            if edge_type == EdgeType::Directed {
                inc.incoming.insert(edge.clone());
            }
        }

        self.edges.insert(edge, EdgeRecord { endpoints, edge_type });
        self.generation += 1;
        Ok(())
    }

    /// Add a directed edge `source -> dest`
    pub fn add_directed_edge(&mut self, edge: E, source: V, dest: V) -> GraphResult<()> {
        self.add_edge(edge, (source, dest), EdgeType::Directed)
    }

    /// Add an undirected edge `a -- b`
    pub fn add_undirected_edge(&mut self, edge: E, a: V, b: V) -> GraphResult<()> {
        self.add_edge(edge, (a, b), EdgeType::Undirected)
    }

    /// Remove an edge. Endpoints stay in the graph.
    ///
    /// Returns the removed edge's endpoints and type.
    pub fn remove_edge(&mut self, edge: &E) -> GraphResult<(Pair<V>, EdgeType)> {
        let record = self
            .edges
            .shift_remove(edge)
            .ok_or_else(|| GraphError::EdgeNotFound(describe(edge)))?;

        for vertex in [record.endpoints.first(), record.endpoints.second()] {
            if let Some(inc) = self.vertices.get_mut(vertex) {
                inc.incident.shift_remove(edge);
                inc.incoming.shift_remove(edge);
                inc.outgoing.shift_remove(edge);
            }
        }

        self.generation += 1;
        Ok((record.endpoints, record.edge_type))
    }

    // ----------------------------------------------------------------
    // Membership
    // ----------------------------------------------------------------

    pub fn contains_vertex(&self, vertex: &V) -> bool {
        self.vertices.contains_key(vertex)
    }

    pub fn contains_edge(&self, edge: &E) -> bool {
        self.edges.contains_key(edge)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Vertices in insertion order
    pub fn vertices(&self) -> impl Iterator<Item = &V> + '_ {
        self.vertices.keys()
    }

    /// Edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &E> + '_ {
        self.edges.keys()
    }

    /// Edges with their endpoints and type, in insertion order
    pub fn edge_entries(&self) -> impl Iterator<Item = (&E, &Pair<V>, EdgeType)> + '_ {
        self.edges
            .iter()
            .map(|(edge, record)| (edge, &record.endpoints, record.edge_type))
    }

    /// Position of a vertex in insertion order
    pub fn vertex_position(&self, vertex: &V) -> Option<usize> {
        self.vertices.get_index_of(vertex)
    }

    /// Position of an edge in insertion order
    pub fn edge_position(&self, edge: &E) -> Option<usize> {
        self.edges.get_index_of(edge)
    }

    /// All edges of the given type
    pub fn edges_of_type(&self, edge_type: EdgeType) -> Vec<E> {
        self.edges
            .iter()
            .filter(|(_, record)| record.edge_type == edge_type)
            .map(|(edge, _)| edge.clone())
            .collect()
    }

    pub fn edge_count_of_type(&self, edge_type: EdgeType) -> usize {
        self.edges
            .values()
            .filter(|record| record.edge_type == edge_type)
            .count()
    }

    // ----------------------------------------------------------------
    // Edge queries
    // ----------------------------------------------------------------

    /// Endpoints of an edge
    pub fn endpoints(&self, edge: &E) -> GraphResult<&Pair<V>> {
        Ok(&self.record(edge)?.endpoints)
    }

    pub fn edge_type(&self, edge: &E) -> GraphResult<EdgeType> {
        Ok(self.record(edge)?.edge_type)
    }

    pub fn is_directed(&self, edge: &E) -> GraphResult<bool> {
        Ok(self.edge_type(edge)? == EdgeType::Directed)
    }

    /// Source (tail) of a directed edge
    pub fn source(&self, edge: &E) -> GraphResult<&V> {
        let record = self.record(edge)?;
        match record.edge_type {
            EdgeType::Directed => Ok(record.endpoints.first()),
            EdgeType::Undirected => Err(GraphError::UndirectedEdge(describe(edge))),
        }
    }

    /// Destination (head) of a directed edge
    pub fn dest(&self, edge: &E) -> GraphResult<&V> {
        let record = self.record(edge)?;
        match record.edge_type {
            EdgeType::Directed => Ok(record.endpoints.second()),
            EdgeType::Undirected => Err(GraphError::UndirectedEdge(describe(edge))),
        }
    }

    /// The endpoint of `edge` opposite to `vertex`
    pub fn opposite(&self, vertex: &V, edge: &E) -> GraphResult<&V> {
        let record = self.record(edge)?;
        record
            .endpoints
            .opposite(vertex)
            .ok_or_else(|| GraphError::NotIncident {
                vertex: describe(vertex),
                edge: describe(edge),
            })
    }

    /// True if `vertex` is an endpoint of `edge`
    pub fn is_incident(&self, vertex: &V, edge: &E) -> bool {
        self.edges
            .get(edge)
            .map(|record| record.endpoints.contains(vertex))
            .unwrap_or(false)
    }

    // ----------------------------------------------------------------
    // Incidence and adjacency
    // ----------------------------------------------------------------

    /// Every edge touching `vertex` (self-loops listed once)
    pub fn incident_edges(&self, vertex: &V) -> GraphResult<Vec<E>> {
        Ok(self.incidence(vertex)?.incident.iter().cloned().collect())
    }

    /// Directed edges ending at `vertex` plus incident undirected edges
    pub fn in_edges(&self, vertex: &V) -> GraphResult<Vec<E>> {
        let inc = self.incidence(vertex)?;
        Ok(inc
            .incident
            .iter()
            .filter(|edge| !inc.outgoing.contains(*edge) || inc.incoming.contains(*edge))
            .cloned()
            .collect())
    }

    /// Directed edges starting at `vertex` plus incident undirected edges
    pub fn out_edges(&self, vertex: &V) -> GraphResult<Vec<E>> {
        let inc = self.incidence(vertex)?;
        Ok(inc
            .incident
            .iter()
            .filter(|edge| !inc.incoming.contains(*edge) || inc.outgoing.contains(*edge))
            .cloned()
            .collect())
    }

    /// Distinct vertices adjacent to `vertex` through any incident edge.
    /// A vertex with a self-loop is its own neighbor.
    pub fn neighbors(&self, vertex: &V) -> GraphResult<Vec<V>> {
        let inc = self.incidence(vertex)?;
        let mut seen: FxIndexSet<V> = FxIndexSet::default();
        for edge in &inc.incident {
            if let Some(other) = self.record(edge)?.endpoints.opposite(vertex) {
                seen.insert(other.clone());
            }
        }
        Ok(seen.into_iter().collect())
    }

    /// Distinct vertices reachable from `vertex` along one out-edge
    pub fn successors(&self, vertex: &V) -> GraphResult<Vec<V>> {
        self.opposites(vertex, self.out_edges(vertex)?)
    }

    /// Distinct vertices that reach `vertex` along one in-edge
    pub fn predecessors(&self, vertex: &V) -> GraphResult<Vec<V>> {
        self.opposites(vertex, self.in_edges(vertex)?)
    }

    pub fn is_neighbor(&self, a: &V, b: &V) -> bool {
        self.vertices
            .get(a)
            .map(|inc| {
                inc.incident.iter().any(|edge| {
                    self.edges
                        .get(edge)
                        .and_then(|record| record.endpoints.opposite(a))
                        .map(|other| other == b)
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false)
    }

    /// Number of edge ends at `vertex`; a self-loop contributes 2
    pub fn degree(&self, vertex: &V) -> GraphResult<usize> {
        let inc = self.incidence(vertex)?;
        let loops = inc
            .incident
            .iter()
            .filter(|edge| {
                self.edges
                    .get(*edge)
                    .map(|record| record.endpoints.is_loop())
                    .unwrap_or(false)
            })
            .count();
        Ok(inc.incident.len() + loops)
    }

    pub fn in_degree(&self, vertex: &V) -> GraphResult<usize> {
        Ok(self.in_edges(vertex)?.len())
    }

    pub fn out_degree(&self, vertex: &V) -> GraphResult<usize> {
        Ok(self.out_edges(vertex)?.len())
    }

    /// First edge leading from `from` to `to`: a directed edge `from -> to`
    /// or an undirected edge between them. `None` if either vertex is absent.
    pub fn find_edge(&self, from: &V, to: &V) -> Option<E> {
        self.connecting_edges(from, to).next()
    }

    /// Every edge leading from `from` to `to`, in incidence order
    pub fn find_edge_set(&self, from: &V, to: &V) -> Vec<E> {
        self.connecting_edges(from, to).collect()
    }

    // ----------------------------------------------------------------
    // Internal helpers
    // ----------------------------------------------------------------

    fn record(&self, edge: &E) -> GraphResult<&EdgeRecord<V>> {
        self.edges
            .get(edge)
            .ok_or_else(|| GraphError::EdgeNotFound(describe(edge)))
    }

    fn incidence(&self, vertex: &V) -> GraphResult<&Incidence<E>> {
        self.vertices
            .get(vertex)
            .ok_or_else(|| GraphError::VertexNotFound(describe(vertex)))
    }

    fn opposites(&self, vertex: &V, edges: Vec<E>) -> GraphResult<Vec<V>> {
        let mut seen: FxIndexSet<V> = FxIndexSet::default();
        for edge in &edges {
            seen.insert(self.opposite(vertex, edge)?.clone());
        }
        Ok(seen.into_iter().collect())
    }

    fn connecting_edges<'a>(&'a self, from: &'a V, to: &'a V) -> impl Iterator<Item = E> + 'a {
        self.vertices
            .get(from)
            .into_iter()
            .flat_map(|inc| inc.incident.iter())
            .filter(move |edge| match self.edges.get(*edge) {
                Some(record) => match record.edge_type {
                    EdgeType::Directed => {
                        record.endpoints.first() == from && record.endpoints.second() == to
                    }
                    EdgeType::Undirected => record.endpoints.opposite(from) == Some(to),
                },
                None => false,
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> GraphStore<u32, &'static str> {
        let mut store = GraphStore::new();
        for v in 1..=3 {
            store.add_vertex(v);
        }
        store.add_directed_edge("a", 1, 2).unwrap();
        store.add_directed_edge("b", 2, 3).unwrap();
        store.add_undirected_edge("c", 3, 1).unwrap();
        store
    }

    #[test]
    fn test_add_vertex_is_idempotent() {
        let mut store: GraphStore<u32, u32> = GraphStore::new();
        assert!(store.add_vertex(1));
        assert!(!store.add_vertex(1));
        assert_eq!(store.vertex_count(), 1);
    }

    #[test]
    fn test_edge_validation() {
        let mut store: GraphStore<u32, u32> = GraphStore::new();
        store.add_vertex(1);

        let result = store.add_directed_edge(10, 1, 99);
        assert_eq!(result, Err(GraphError::InvalidEndpoint("99".to_string())));

        store.add_vertex(2);
        store.add_directed_edge(10, 1, 2).unwrap();
        let result = store.add_undirected_edge(10, 2, 1);
        assert_eq!(result, Err(GraphError::DuplicateEdge("10".to_string())));

        // Failed insertions leave no trace
        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.incident_edges(&2).unwrap(), vec![10]);
    }

    #[test]
    fn test_adjacency_lists() {
        let store = triangle();

        assert_eq!(store.out_edges(&1).unwrap(), vec!["a", "c"]);
        assert_eq!(store.in_edges(&1).unwrap(), vec!["c"]);
        assert_eq!(store.in_edges(&3).unwrap(), vec!["b", "c"]);
        assert_eq!(store.out_edges(&3).unwrap(), vec!["c"]);

        assert_eq!(store.successors(&1).unwrap(), vec![2, 3]);
        assert_eq!(store.predecessors(&2).unwrap(), vec![1]);
        assert_eq!(store.neighbors(&2).unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_source_and_dest() {
        let store = triangle();
        assert_eq!(store.source(&"a"), Ok(&1));
        assert_eq!(store.dest(&"a"), Ok(&2));
        assert!(store.is_directed(&"a").unwrap());

        assert_eq!(
            store.source(&"c"),
            Err(GraphError::UndirectedEdge("\"c\"".to_string()))
        );
        assert!(store.dest(&"c").is_err());
        assert_eq!(store.endpoints(&"c").unwrap(), &Pair::new(3, 1));
        assert_eq!(store.opposite(&1, &"c"), Ok(&3));
        assert!(store.opposite(&2, &"c").is_err());
    }

    #[test]
    fn test_self_loop_degree() {
        let mut store: GraphStore<u32, u32> = GraphStore::new();
        store.add_vertex(1);
        store.add_vertex(2);
        store.add_directed_edge(1, 1, 1).unwrap();
        store.add_undirected_edge(2, 1, 1).unwrap();
        store.add_directed_edge(3, 1, 2).unwrap();

        assert_eq!(store.incident_edges(&1).unwrap(), vec![1, 2, 3]);
        assert_eq!(store.degree(&1).unwrap(), 5);
        assert_eq!(store.in_degree(&1).unwrap(), 2);
        assert_eq!(store.out_degree(&1).unwrap(), 3);
        assert_eq!(store.neighbors(&1).unwrap(), vec![1, 2]);
        assert!(store.is_neighbor(&1, &1));
    }

    #[test]
    fn test_remove_vertex_cascades() {
        let mut store = triangle();
        let removed = store.remove_vertex(&3).unwrap();
        assert_eq!(removed, vec!["b", "c"]);

        assert_eq!(store.vertex_count(), 2);
        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.incident_edges(&1).unwrap(), vec!["a"]);
        assert!(matches!(
            store.incident_edges(&3),
            Err(GraphError::VertexNotFound(_))
        ));
    }

    #[test]
    fn test_remove_edge_keeps_vertices() {
        let mut store = triangle();
        let (endpoints, edge_type) = store.remove_edge(&"a").unwrap();
        assert_eq!(endpoints, Pair::new(1, 2));
        assert_eq!(edge_type, EdgeType::Directed);
        assert_eq!(store.vertex_count(), 3);
        assert!(store.out_edges(&1).unwrap().iter().all(|e| *e != "a"));
        assert!(store.remove_edge(&"a").is_err());
    }

    #[test]
    fn test_find_edge_respects_direction() {
        let mut store = triangle();
        store.add_directed_edge("a2", 1, 2).unwrap();

        assert_eq!(store.find_edge(&1, &2), Some("a"));
        assert_eq!(store.find_edge(&2, &1), None);
        assert_eq!(store.find_edge_set(&1, &2), vec!["a", "a2"]);
        assert_eq!(store.find_edge(&1, &3), Some("c"));
        assert_eq!(store.find_edge(&3, &1), Some("c"));
        assert_eq!(store.find_edge(&7, &1), None);
    }

    #[test]
    fn test_generation_and_identity() {
        let mut store = triangle();
        let before = store.generation();
        store.add_vertex(4);
        assert!(store.generation() > before);

        let copy = store.clone();
        assert_ne!(copy.id(), store.id());
        assert_eq!(copy.edge_count(), store.edge_count());
    }

    #[test]
    fn test_edges_of_type() {
        let store = triangle();
        assert_eq!(store.edges_of_type(EdgeType::Directed), vec!["a", "b"]);
        assert_eq!(store.edge_count_of_type(EdgeType::Undirected), 1);
        assert_eq!(store.edge_position(&"b"), Some(1));
        assert_eq!(store.vertex_position(&3), Some(2));
    }
}
