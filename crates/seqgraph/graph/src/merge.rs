use crate::graph::StateGraph;
use seqgraph_types::{StateId, Trajectory};
use tracing::debug;

/// Translation from a merged graph's state ids to the receiving graph's ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateMapping(Vec<StateId>);

impl StateMapping {
    pub fn get(&self, id: StateId) -> Option<StateId> {
        self.0.get(id.index()).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl StateGraph {
    /// Fold `other` into this graph.
    ///
    /// States are matched by `event_key` (start and end by position), so the
    /// result is the graph that folding both inputs' sessions in sequence
    /// would have produced: members are unioned, links re-keyed and
    /// trajectories with equal keys joined. New states keep `other`'s order.
    pub fn merge(&mut self, other: &StateGraph) -> StateMapping {
        let mut mapping = Vec::with_capacity(other.states().len());

        for state in other.states() {
            let target = if state.id.is_terminal() {
                state.id
            } else {
                match self.state_id(&state.event_key) {
                    Some(existing) => existing,
                    None => self.push_state(state.kind, &state.event_key),
                }
            };
            self.state_mut(target).member_ids.extend_from(&state.member_ids);
            mapping.push(target);
        }
        let mapping = StateMapping(mapping);

        for link in other.links() {
            let (source, target) = match (mapping.get(link.source), mapping.get(link.target)) {
                (Some(s), Some(t)) => (s, t),
                _ => continue,
            };
            self.link_members_mut(source, target)
                .extend_from(&link.member_ids);
        }

        for trajectory in other.trajectories() {
            let sequence = trajectory
                .sequence
                .iter()
                .filter_map(|&id| mapping.get(id))
                .collect();
            self.insert_or_join_trajectory(Trajectory {
                sequence,
                ..trajectory.clone()
            });
        }

        debug!(
            merged_states = mapping.len(),
            total_states = self.states().len(),
            "Graphs merged"
        );
        mapping
    }
}
