//! Core multigraph implementation
//!
//! This module implements the incidence-based multigraph ADT:
//! - Caller-supplied vertex and edge identities
//! - Directed and undirected edges in the same graph
//! - Parallel edges and self-loops, individually addressable
//! - Stable ordinals for parallel edge groups

pub mod parallel;
pub mod store;
pub mod types;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;

/// Insertion-ordered map with the Fx hasher
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Insertion-ordered set with the Fx hasher
pub type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

// Re-export main types
pub use parallel::ParallelEdgeIndexer;
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{EdgeKey, EdgeType, GraphId, Pair, VertexKey};
