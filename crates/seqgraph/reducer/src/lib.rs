#![deny(unsafe_code)]
//! # seqgraph-reducer
//!
//! Folds game event logs into [`StateGraph`](seqgraph_graph::StateGraph)s.
//!
//! ## Architecture
//!
//! ```text
//! EventRow* → StreamReducer → SessionTracker (per actor) → StateGraph
//!                   │                 │
//!                   └── classifier ───┘  (risk, dispersion, milestones)
//! ```
//!
//! A team log holds many sessions back to back. Each session starts with a
//! fresh [`SessionTracker`], so item registries and counters never leak from
//! one actor to the next. Which derived states are emitted is controlled by
//! the [`FeatureSet`] in [`ReducerConfig`].
//!
//! ## Key Types
//!
//! - [`StreamReducer`]: Drives rows through sessions into a graph
//! - [`SessionTracker`]: Per-actor accumulators and path
//! - [`ReducerConfig`]: Features, column layout, event names, milestones
//! - [`ConditionBatch`]: Per-condition merge of single-team logs
//! - [`ReduceError`]: Fatal reduction errors

pub mod classifier;
pub mod condition;
pub mod config;
pub mod error;
pub mod reducer;
pub mod registry;
pub mod session;
pub mod similarity;

pub use classifier::{
    classify_risk, classify_risk_proneness, population_std_dev, reached_milestone, RiskAversion,
    RiskLevel, RiskProneness, VoteDispersion, VoteOffer,
};
pub use condition::{
    detect_condition, reduce_condition_file, ConditionBatch, ConditionGroup, FileOutcome,
    UNCONDITIONED,
};
pub use config::{
    AccumulationMode, ColumnLayout, EventVocabulary, Feature, FeatureSet, Focus,
    MalformedRowPolicy, MilestoneConfig, ReducerConfig, SimilarityConfig,
};
pub use error::ReduceError;
pub use reducer::{ReduceSummary, StreamReducer};
pub use registry::ItemRegistry;
pub use session::{
    DistanceTracker, MilestoneTracker, SessionPhase, SessionTracker, MAX_BACKFILL_STEPS,
};
pub use similarity::{attach_similarity, trajectory_similarity};
