#![deny(unsafe_code)]
//! # seqgraph-types
//!
//! Data model shared by the seqgraph crates.
//!
//! A game log is a sequence of [`EventRow`]s. Reducing it produces a graph of
//! [`State`]s connected by [`Link`]s, plus one [`Trajectory`] per distinct
//! actor event sequence:
//!
//! ```text
//! start(0) → st_dev r1: None voters: 2 → r1:risk high → round+risk1: ['high'] → end(1)
//! ```
//!
//! ## Key Types
//!
//! - [`EventRow`]: One decoded log line with positional fields
//! - [`ActorId`]: A team or player identity
//! - [`StateId`] / [`StateKind`]: Node identity and visual category
//! - [`State`], [`Link`], [`Trajectory`]: Graph records
//! - [`GraphExport`]: The per-group record handed to serializers

pub mod error;
pub mod export;
pub mod model;
pub mod row;
pub mod types;

pub use error::RowError;
pub use export::{GraphExport, TrajectorySimilarity};
pub use model::{Link, MemberSet, State, Trajectory};
pub use row::EventRow;
pub use types::{ActorId, StateId, StateKind};
