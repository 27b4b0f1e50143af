//! Graph algorithms module
//!
//! Algorithms never store traversal state inside the graph. Each engine
//! works on a dense [`GraphView`] snapshot or on a private clone, so any
//! number of them can run over the same read-only graph.

pub mod betweenness;
pub mod common;
pub mod community;
pub mod flow;
pub mod pathfinding;
pub mod rank;

pub use betweenness::BetweennessCentrality;
pub use common::{AlgoError, AlgoResult, GraphView, Link};
pub use community::{
    biconnected_components, weak_components, BiconnectedResult, ClusterTarget, ClusteringResult,
    EdgeBetweennessClusterer, WccResult,
};
pub use flow::{edmonds_karp, EdmondsKarp, FlowEdge, FlowResult, FlowState, FlowValue};
pub use pathfinding::{bfs_tree, dijkstra_tree, reconstruct_path, shortest_path, ShortestPathTree};
pub use rank::{
    page_rank, DanglingPolicy, Hits, KStepMarkov, MarkovConfig, PageRankWithPriors, RankingConfig, RankingOutcome,
    StopReason, VoltageRanker,
};
