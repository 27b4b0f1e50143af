use anyhow::Context;
use graphweave::algo::{
    biconnected_components, edmonds_karp, page_rank, weak_components, EdgeBetweennessClusterer, Hits,
};
use graphweave::{EngineConfig, GraphStore};
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path).with_context(|| format!("loading config from {}", path))?,
        None => EngineConfig::default(),
    };
    info!(?config, "engine configuration");

    println!("Graphweave v{}", graphweave::version());
    println!("==========================================");

    demo_max_flow()?;
    demo_ranking(&config)?;
    demo_clustering(&config)?;

    Ok(())
}

fn demo_max_flow() -> anyhow::Result<()> {
    println!("\n=== Demo 1: Max Flow / Min Cut ===");

    let mut graph = GraphStore::new();
    for v in ["s", "v1", "v2", "v3", "v4", "t"] {
        graph.add_vertex(v);
    }
    let edges = [
        ("s", "v1", 16),
        ("s", "v2", 13),
        ("v2", "v1", 6),
        ("v1", "v3", 12),
        ("v2", "v4", 14),
        ("v3", "v2", 9),
        ("v3", "t", 20),
        ("v4", "v3", 7),
        ("v4", "t", 4),
    ];
    let mut capacities = std::collections::HashMap::new();
    for (id, (from, to, capacity)) in edges.iter().enumerate() {
        graph.add_directed_edge(id, *from, *to)?;
        capacities.insert(id, *capacity);
    }

    let result = edmonds_karp(&graph, "s", "t", |e| capacities.get(e).copied())?;
    println!("  Max flow: {}", result.max_flow);
    for edge in &result.min_cut_edges {
        let (from, to, capacity) = edges[*edge];
        println!("  Cut edge {} -> {} (capacity {})", from, to, capacity);
    }
    Ok(())
}

fn demo_ranking(config: &EngineConfig) -> anyhow::Result<()> {
    println!("\n=== Demo 2: Rank Propagation ===");

    // Two hubs linking into a small set of pages
    let mut graph = GraphStore::new();
    for v in ["hub-a", "hub-b", "page-1", "page-2", "page-3"] {
        graph.add_vertex(v);
    }
    graph.add_directed_edge(0, "hub-a", "page-1")?;
    graph.add_directed_edge(1, "hub-a", "page-2")?;
    graph.add_directed_edge(2, "hub-b", "page-1")?;
    graph.add_directed_edge(3, "page-1", "page-3")?;
    graph.add_directed_edge(4, "page-3", "hub-a")?;

    let outcome = page_rank(&graph, config.ranking.clone())?;
    println!(
        "  PageRank ({} iterations, {:?}):",
        outcome.iterations(),
        outcome.stop_reason()
    );
    for (vertex, score) in outcome.ranked() {
        println!("    {:<8} {:.4}", vertex, score);
    }

    let hits = Hits::uniform(&graph, config.ranking.clone())?.evaluate()?;
    println!("  HITS (authority, hub):");
    for (vertex, score) in hits.scores() {
        println!("    {:<8} {:.4} {:.4}", vertex, score.first(), score.second());
    }
    Ok(())
}

fn demo_clustering(config: &EngineConfig) -> anyhow::Result<()> {
    println!("\n=== Demo 3: Clustering ===");

    // Two triangles joined by a bridge
    let mut graph = GraphStore::new();
    for v in 0..6u32 {
        graph.add_vertex(v);
    }
    let edges = [(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 5), (5, 3)];
    for (id, (a, b)) in edges.iter().enumerate() {
        graph.add_undirected_edge(id, *a, *b)?;
    }

    let weak = weak_components(&graph);
    println!("  Weak components: {:?}", weak.components);

    let biconnected = biconnected_components(&graph);
    println!("  Biconnected components: {:?}", biconnected.components);
    println!("  Articulation points: {:?}", biconnected.articulation_points);

    let clusters = EdgeBetweennessClusterer::new(config.clustering.target).cluster(&graph)?;
    println!(
        "  Edge betweenness clusters: {:?} (removed {:?})",
        clusters.clusters, clusters.removed_edges
    );
    Ok(())
}
