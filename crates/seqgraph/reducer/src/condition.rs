//! Grouping of single-team logs by experimental condition.
//!
//! Each file holds one team's session. Its condition comes from the match
//! setup row; files of the same condition share one graph.

use crate::config::ReducerConfig;
use crate::error::ReduceError;
use crate::reducer::{ReduceSummary, StreamReducer};
use crate::similarity::attach_similarity;
use seqgraph_graph::StateGraph;
use seqgraph_types::{ActorId, EventRow, GraphExport};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Label of files without a match setup row.
pub const UNCONDITIONED: &str = "Unconditioned";

/// Prefix of condition labels, followed by the competition level.
pub const CONDITION_PREFIX: &str = "Competition";

/// Condition label of a single-team log.
///
/// Only rows before a suspension count. A setup row without a level column
/// leaves the file unconditioned.
pub fn detect_condition(rows: &[EventRow], config: &ReducerConfig) -> String {
    let columns = &config.columns;
    let events = &config.events;
    for row in rows {
        match row.field(columns.event) {
            Some(event) if event == events.game_suspended => break,
            Some(event) if event == events.setup_match => {
                return match row.field(columns.competition_level) {
                    Some(level) => format!("{}{}", CONDITION_PREFIX, level.trim()),
                    None => {
                        warn!(line = row.line, "Match setup row without competition level");
                        UNCONDITIONED.to_string()
                    }
                };
            }
            _ => {}
        }
    }
    UNCONDITIONED.to_string()
}

/// Result of reducing one single-team file.
#[derive(Debug)]
pub struct FileOutcome {
    pub name: String,
    pub condition: String,
    pub graph: StateGraph,
    pub summary: ReduceSummary,
}

/// Reduce a single-team log into its own graph. The file name is the actor.
pub fn reduce_condition_file(
    name: &str,
    rows: &[EventRow],
    config: &ReducerConfig,
) -> Result<FileOutcome, ReduceError> {
    let condition = detect_condition(rows, config);
    let mut graph = StateGraph::new();
    let summary =
        StreamReducer::new(config).reduce_session(ActorId::from(name), rows, &mut graph)?;
    Ok(FileOutcome {
        name: name.to_string(),
        condition,
        graph,
        summary,
    })
}

/// All files of one condition.
#[derive(Debug)]
pub struct ConditionGroup {
    pub label: String,
    pub graph: StateGraph,
    pub sessions: usize,
    pub files: Vec<String>,
}

impl ConditionGroup {
    fn new(label: String) -> Self {
        Self {
            label,
            graph: StateGraph::new(),
            sessions: 0,
            files: Vec::new(),
        }
    }

    pub fn export(&self, config: &ReducerConfig) -> GraphExport {
        let mut export = self.graph.export(self.label.clone(), self.sessions);
        attach_similarity(&mut export, &config.similarity);
        export
    }
}

/// Condition groups keyed by label.
#[derive(Debug, Default)]
pub struct ConditionBatch {
    groups: BTreeMap<String, ConditionGroup>,
}

impl ConditionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a file into its condition group. Add files in a stable order
    /// to get stable state ids.
    pub fn add(&mut self, outcome: FileOutcome) {
        let group = self
            .groups
            .entry(outcome.condition.clone())
            .or_insert_with(|| ConditionGroup::new(outcome.condition.clone()));
        group.graph.merge(&outcome.graph);
        group.sessions += outcome.summary.sessions;
        group.files.push(outcome.name);

        info!(
            condition = %group.label,
            files = group.files.len(),
            sessions = group.sessions,
            "File added to condition"
        );
    }

    pub fn get(&self, label: &str) -> Option<&ConditionGroup> {
        self.groups.get(label)
    }

    pub fn groups(&self) -> impl Iterator<Item = &ConditionGroup> {
        self.groups.values()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// One export per condition, in label order.
    pub fn exports(&self, config: &ReducerConfig) -> Vec<GraphExport> {
        self.groups.values().map(|g| g.export(config)).collect()
    }
}
