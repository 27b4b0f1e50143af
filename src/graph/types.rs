//! Core type definitions for the multigraph

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// Bound for vertex identities.
///
/// Vertices are opaque, caller-supplied values; the graph only needs to
/// compare, hash, clone and print them.
pub trait VertexKey: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> VertexKey for T {}

/// Bound for edge identities. Same requirements as [`VertexKey`].
pub trait EdgeKey: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> EdgeKey for T {}

/// Directedness tag carried by every edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    /// `first` is the source (tail), `second` the destination (head)
    Directed,
    /// No inherent order between the endpoints
    Undirected,
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeType::Directed => write!(f, "directed"),
            EdgeType::Undirected => write!(f, "undirected"),
        }
    }
}

/// An immutable 2-tuple with value equality.
///
/// Used as the endpoint carrier for edges and as a general two-sided result
/// or parameter type (e.g. source/sink priors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair<T> {
    first: T,
    second: T,
}

impl<T> Pair<T> {
    pub fn new(first: T, second: T) -> Self {
        Pair { first, second }
    }

    pub fn first(&self) -> &T {
        &self.first
    }

    pub fn second(&self) -> &T {
        &self.second
    }

    pub fn into_tuple(self) -> (T, T) {
        (self.first, self.second)
    }
}

impl<T: PartialEq> Pair<T> {
    /// True if either element equals `value`
    pub fn contains(&self, value: &T) -> bool {
        self.first == *value || self.second == *value
    }

    /// True if both elements are equal (a self-loop when used as endpoints)
    pub fn is_loop(&self) -> bool {
        self.first == self.second
    }

    /// The element on the other side of `value`, if `value` is in the pair.
    /// For a loop this returns `value`'s twin.
    pub fn opposite(&self, value: &T) -> Option<&T> {
        if self.first == *value {
            Some(&self.second)
        } else if self.second == *value {
            Some(&self.first)
        } else {
            None
        }
    }

    /// Equality ignoring element order
    pub fn same_unordered(&self, other: &Pair<T>) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }
}

impl<T> From<(T, T)> for Pair<T> {
    fn from((first, second): (T, T)) -> Self {
        Pair { first, second }
    }
}

impl<T: fmt::Display> fmt::Display for Pair<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}>", self.first, self.second)
    }
}

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a graph instance.
///
/// Every `GraphStore`, including every clone, receives a fresh id so that
/// caches outside the graph can key on `(GraphId, element)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(u64);

impl GraphId {
    pub(crate) fn next() -> Self {
        GraphId(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GraphId({})", self.0)
    }
}
