//! # stackppr
//!
//! Personalized PageRank (PPR) over graphs that change under you.
//!
//! A query runs FORA: a forward local push from the source converts most of the unit mass
//! into exact *reserve*, and the leftover *residual* is redistributed with a precomputed
//! index of random-walk forests. The index is the interesting part: each forest records, per
//! node, a stack of successor choices (absorb with probability `alpha`, else step to a
//! uniform neighbour). Walks are rooted Wilson-style into trees, and each tree keeps its
//! degree volume and a linked member order so refinement is a single pass over the tree.
//!
//! Invariants (must not drift):
//! - **Node order**: every vector is indexed by node id `0..n-1` of the graph adapter.
//! - **Borrowing**: indexes never hold the graph or the config; both are lent per call.
//! - **Randomness**: every build, repair and sampling refine takes an explicit
//!   [`RandomSource`]; a fixed seed plus a fixed call order reproduces the index bit for bit.
//! - **Conservation**: `refine` moves exactly the residual mass into the reserve.
//!
//! Swappable (allowed to change without breaking the contract):
//! - the repair strategy after an update, so long as the forest invariants hold
//!   ([`WalkForest::check`]);
//! - serial vs parallel index construction.

pub mod config;
pub mod fora;
pub mod forest;
pub mod graph;
pub mod index;
pub mod push;
pub mod queue;
pub mod random;
pub mod ranking;
pub mod stack;
pub mod stack_index;
pub mod static_index;
pub mod walk_index;

pub use config::PprConfig;
pub use fora::{Fora, QueryStats};
pub use forest::{Members, WalkForest};
pub use graph::{AdjacencyList, DynamicGraph, EdgeSerial, Graph};
pub use index::PprIndex;
pub use push::forward_push;
pub use queue::UniqueQueue;
pub use random::{seeded, RandomSource};
pub use ranking::{l1_error, top_k};
pub use stack::WalkStack;
pub use stack_index::{RebuildStackIndex, StackIndex, StackTree};
pub use static_index::StaticStackIndex;
pub use walk_index::{restart_walk, RealtimeIndex, WalkIndex};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("node {node} out of range (node_count={node_count})")]
    NodeOutOfRange { node: usize, node_count: usize },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("index does not support {0}")]
    UnsupportedUpdate(&'static str),
    #[error("failed to mirror arc {from} -> {to} of an undirected edge")]
    AsymmetricEdge { from: usize, to: usize },
    #[error("corrupt forest: {0}")]
    CorruptForest(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn check_node<G: Graph + ?Sized>(graph: &G, node: usize) -> Result<()> {
    let node_count = graph.node_count();
    if node >= node_count {
        return Err(Error::NodeOutOfRange { node, node_count });
    }
    Ok(())
}
