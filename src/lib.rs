//! Graphweave
//!
//! A typed, mutable multigraph with an analytics engine on top.
//!
//! # Architecture
//!
//! - [`graph`]: the incidence-based multigraph ADT. Directed and undirected
//!   edges, parallel edges and self-loops, with insertion-ordered iteration.
//!   Also the [`ParallelEdgeIndexer`] cache.
//! - [`algo`]: algorithms built on the ADT
//!   - shortest-path trees and path reconstruction
//!   - Edmonds-Karp max-flow / min-cut
//!   - rank propagation: PageRank with priors, HITS, K-step Markov, voltage
//!   - weak and biconnected components, edge-betweenness clustering
//! - [`config`]: engine defaults loadable from YAML or JSON
//!
//! ## Example Usage
//!
//! ```rust
//! use graphweave::algo::edmonds_karp;
//! use graphweave::GraphStore;
//!
//! let mut graph = GraphStore::new();
//! for v in ["s", "a", "t"] {
//!     graph.add_vertex(v);
//! }
//! graph.add_directed_edge("sa", "s", "a").unwrap();
//! graph.add_directed_edge("at", "a", "t").unwrap();
//!
//! let capacity = |e: &&str| match *e {
//!     "sa" => Some(5),
//!     "at" => Some(3),
//!     _ => None,
//! };
//! let result = edmonds_karp(&graph, "s", "t", capacity).unwrap();
//! assert_eq!(result.max_flow, 3);
//! assert_eq!(result.min_cut_edges, vec!["at"]);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod graph;

// Re-export main types for convenience
pub use graph::{
    EdgeKey, EdgeType, GraphError, GraphId, GraphResult, GraphStore, Pair, ParallelEdgeIndexer, VertexKey,
};

pub use algo::{AlgoError, AlgoResult};

pub use config::{ClusteringConfig, ConfigError, ConfigResult, EngineConfig};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.1.0");
    }
}
