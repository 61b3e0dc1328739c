#![deny(unsafe_code)]
//! # seqgraph-graph
//!
//! The state graph built while folding actor event streams.
//!
//! States are deduplicated by `event_key`: asking for the same key twice
//! returns the same [`StateId`](seqgraph_types::StateId) and only adds the
//! actor to the member set. Links record every observed transition once per
//! ordered pair. Trajectories are shared by actors whose raw event sequences
//! produced the same key.
//!
//! ## Key Types
//!
//! - [`StateGraph`]: Incremental graph construction and read-out
//! - [`StateMapping`]: Id translation produced by [`StateGraph::merge`]

pub mod graph;
pub mod merge;

pub use graph::StateGraph;
pub use merge::StateMapping;
