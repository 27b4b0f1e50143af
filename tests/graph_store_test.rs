use graphweave::graph::{EdgeType, GraphError, GraphStore, ParallelEdgeIndexer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};

/// Incident edges of every vertex are exactly the edges touching it, and
/// degrees count loops twice.
fn assert_incidence_invariant(graph: &GraphStore<u32, u32>) {
    for vertex in graph.vertices() {
        let expected: HashSet<u32> = graph
            .edge_entries()
            .filter(|(_, pair, _)| pair.contains(vertex))
            .map(|(edge, _, _)| *edge)
            .collect();
        let actual: HashSet<u32> = graph.incident_edges(vertex).unwrap().into_iter().collect();
        assert_eq!(actual, expected, "incidence of vertex {}", vertex);

        let expected_degree: usize = graph
            .edge_entries()
            .map(|(_, pair, _)| {
                (*pair.first() == *vertex) as usize + (*pair.second() == *vertex) as usize
            })
            .sum();
        assert_eq!(graph.degree(vertex).unwrap(), expected_degree);
    }

    for (edge, pair, _) in graph.edge_entries() {
        assert!(graph.contains_vertex(pair.first()), "edge {} has a dangling endpoint", edge);
        assert!(graph.contains_vertex(pair.second()), "edge {} has a dangling endpoint", edge);
    }
}

#[test]
fn test_incidence_invariant_under_random_mutation() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut graph: GraphStore<u32, u32> = GraphStore::new();
    let mut next_edge = 0u32;

    for _ in 0..2000 {
        match rng.gen_range(0..10) {
            0..=2 => {
                graph.add_vertex(rng.gen_range(0..30));
            }
            3..=7 => {
                let a = rng.gen_range(0..30);
                let b = rng.gen_range(0..30);
                let edge_type = if rng.gen_bool(0.5) {
                    EdgeType::Directed
                } else {
                    EdgeType::Undirected
                };
                let result = graph.add_edge(next_edge, (a, b), edge_type);
                if graph.contains_vertex(&a) && graph.contains_vertex(&b) {
                    assert!(result.is_ok());
                    next_edge += 1;
                } else {
                    assert!(matches!(result, Err(GraphError::InvalidEndpoint(_))));
                }
            }
            8 => {
                if next_edge > 0 {
                    let edge = rng.gen_range(0..next_edge);
                    let present = graph.contains_edge(&edge);
                    assert_eq!(graph.remove_edge(&edge).is_ok(), present);
                }
            }
            _ => {
                let vertex = rng.gen_range(0..30);
                if let Ok(removed) = graph.remove_vertex(&vertex) {
                    assert!(removed.iter().all(|edge| !graph.contains_edge(edge)));
                }
            }
        }
        assert_incidence_invariant(&graph);
    }
}

#[test]
fn test_structural_errors() {
    let mut graph: GraphStore<&str, u32> = GraphStore::new();
    graph.add_vertex("a");
    graph.add_vertex("b");
    graph.add_directed_edge(1, "a", "b").unwrap();
    graph.add_undirected_edge(2, "a", "b").unwrap();

    assert_eq!(
        graph.add_directed_edge(1, "b", "a"),
        Err(GraphError::DuplicateEdge("1".to_string()))
    );
    assert_eq!(
        graph.add_directed_edge(3, "a", "z"),
        Err(GraphError::InvalidEndpoint("\"z\"".to_string()))
    );
    assert_eq!(graph.source(&1), Ok(&"a"));
    assert_eq!(graph.dest(&1), Ok(&"b"));
    assert_eq!(graph.source(&2), Err(GraphError::UndirectedEdge("2".to_string())));
    assert_eq!(graph.dest(&2), Err(GraphError::UndirectedEdge("2".to_string())));

    // Failed inserts leave the graph untouched
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.find_edge_set(&"a", &"b"), vec![1, 2]);
    assert_eq!(graph.find_edge_set(&"b", &"a"), vec![2]);
}

#[test]
fn test_indexer_reset_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut graph: GraphStore<u32, u32> = GraphStore::new();
    for v in 0..6 {
        graph.add_vertex(v);
    }
    for edge in 0..40 {
        let a = rng.gen_range(0..6);
        let b = rng.gen_range(0..6);
        if rng.gen_bool(0.5) {
            graph.add_directed_edge(edge, a, b).unwrap();
        } else {
            graph.add_undirected_edge(edge, a, b).unwrap();
        }
    }

    // Group key: unordered endpoint pair
    let group_of = |edge: &u32| {
        let pair = graph.endpoints(edge).unwrap();
        let (a, b) = (*pair.first(), *pair.second());
        (a.min(b), a.max(b))
    };

    let mut indexer = ParallelEdgeIndexer::new();
    let mut rounds: Vec<HashMap<(u32, u32), Vec<usize>>> = Vec::new();

    for _ in 0..2 {
        let mut groups: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
        for edge in graph.edges() {
            let index = indexer.get_index(&graph, edge).unwrap();
            groups.entry(group_of(edge)).or_default().push(index);
        }
        for indices in groups.values_mut() {
            indices.sort_unstable();
            let expected: Vec<usize> = (0..indices.len()).collect();
            assert_eq!(*indices, expected);
        }
        rounds.push(groups);
        indexer.reset();
        assert_eq!(indexer.cached_len(), 0);
    }

    assert_eq!(rounds[0], rounds[1]);
}

#[test]
fn test_indexer_tracks_structural_changes() {
    let mut graph: GraphStore<char, u32> = GraphStore::new();
    graph.add_vertex('x');
    graph.add_vertex('y');
    graph.add_undirected_edge(1, 'x', 'y').unwrap();
    graph.add_undirected_edge(2, 'x', 'y').unwrap();

    let mut indexer = ParallelEdgeIndexer::new();
    assert_eq!(indexer.get_index(&graph, &2).unwrap(), 1);
    assert!(!indexer.is_stale(&graph));

    graph.add_undirected_edge(3, 'y', 'x').unwrap();
    assert!(indexer.is_stale(&graph));

    indexer.reset_edge(&graph, &3).unwrap();
    let mut indices: Vec<usize> = (1..=3).map(|e| indexer.get_index(&graph, &e).unwrap()).collect();
    indices.sort_unstable();
    assert_eq!(indices, vec![0, 1, 2]);

    // A clone is a different graph to the cache
    let copy = graph.clone();
    assert_ne!(copy.id(), graph.id());
    assert_eq!(indexer.get_index(&copy, &3).unwrap(), 2);
}
