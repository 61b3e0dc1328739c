use seqgraph_types::{ActorId, GraphExport, Link, MemberSet, State, StateId, StateKind, Trajectory};
use std::collections::HashMap;
use tracing::debug;

/// Sequence graph for one processed group.
///
/// Owns the states, the link multiset and the shared trajectories. All
/// mutation is incremental and none of it can fail on well-formed input.
#[derive(Clone, Debug)]
pub struct StateGraph {
    states: Vec<State>,
    /// `event_key` → id for every non-terminal state.
    key_index: HashMap<String, StateId>,
    links: Vec<Link>,
    link_index: HashMap<(StateId, StateId), usize>,
    trajectories: Vec<Trajectory>,
    trajectory_index: HashMap<String, usize>,
}

impl StateGraph {
    /// A graph holding only the start (0) and end (1) states.
    pub fn new() -> Self {
        Self {
            states: vec![State::start(), State::end()],
            key_index: HashMap::new(),
            links: Vec::new(),
            link_index: HashMap::new(),
            trajectories: Vec::new(),
            trajectory_index: HashMap::new(),
        }
    }

    /// Add `actor` to the members of `state`. Returns `true` if it was new.
    pub fn ensure_member(&mut self, state: StateId, actor: &ActorId) -> bool {
        match self.states.get_mut(state.index()) {
            Some(s) => s.member_ids.insert(actor),
            None => {
                debug_assert!(false, "unknown state {}", state);
                false
            }
        }
    }

    /// Return the state for `event_key`, creating it on first sight.
    ///
    /// Start and end are never matched by key, so the same key always maps
    /// to the same non-terminal id for the lifetime of the graph.
    pub fn upsert_state(&mut self, event_key: &str, kind: StateKind, actor: &ActorId) -> StateId {
        debug_assert!(!event_key.is_empty(), "event keys must be non-empty");

        if let Some(&id) = self.key_index.get(event_key) {
            self.states[id.index()].member_ids.insert(actor);
            return id;
        }

        let id = StateId(self.states.len());
        let mut state = State::new(id, kind, event_key);
        state.member_ids.insert(actor);
        self.states.push(state);
        self.key_index.insert(event_key.to_string(), id);

        debug!(state = %id, kind = %kind, event_key, "State created");
        id
    }

    /// Record one `source → target` transition for `actor`.
    pub fn record_transition(&mut self, source: StateId, target: StateId, actor: &ActorId) {
        self.link_members_mut(source, target).insert(actor);
    }

    /// Record a transition for every consecutive pair in `sequence`.
    pub fn record_link_sequence(&mut self, sequence: &[StateId], actor: &ActorId) {
        for pair in sequence.windows(2) {
            self.record_transition(pair[0], pair[1], actor);
        }
    }

    /// Finish an actor session.
    ///
    /// Appends the end state and the `end_game` label, records the links of
    /// the finished path and files the trajectory under `key`. An existing
    /// trajectory with the same key only gains `actor` as a member.
    pub fn close_session(
        &mut self,
        mut sequence: Vec<StateId>,
        actor: &ActorId,
        mut action_labels: Vec<String>,
        key: String,
    ) {
        sequence.push(StateId::END);
        self.ensure_member(StateId::END, actor);
        action_labels.push(Trajectory::END_LABEL.to_string());

        self.record_link_sequence(&sequence, actor);

        match self.trajectory_index.get(&key) {
            Some(&idx) => {
                self.trajectories[idx].member_ids.insert(actor);
            }
            None => {
                let mut member_ids = MemberSet::new();
                member_ids.insert(actor);
                self.trajectory_index.insert(key.clone(), self.trajectories.len());
                self.trajectories.push(Trajectory {
                    key,
                    sequence,
                    action_labels,
                    member_ids,
                    completed: true,
                });
            }
        }
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id.index())
    }

    /// Id of the non-terminal state with `event_key`, if any.
    pub fn state_id(&self, event_key: &str) -> Option<StateId> {
        self.key_index.get(event_key).copied()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, source: StateId, target: StateId) -> Option<&Link> {
        self.link_index.get(&(source, target)).map(|&idx| &self.links[idx])
    }

    pub fn trajectories(&self) -> &[Trajectory] {
        &self.trajectories
    }

    pub fn trajectory(&self, key: &str) -> Option<&Trajectory> {
        self.trajectory_index
            .get(key)
            .map(|&idx| &self.trajectories[idx])
    }

    /// Whether `actor` has been registered in the start state.
    pub fn has_started(&self, actor: &ActorId) -> bool {
        self.states[StateId::START.index()].member_ids.contains(actor)
    }

    /// Assemble the serializable record for this graph.
    pub fn export(&self, group_label: impl Into<String>, session_count: usize) -> GraphExport {
        GraphExport {
            nodes: self.states.clone(),
            links: self.links.clone(),
            trajectories: self.trajectories.clone(),
            session_count,
            group_label: group_label.into(),
            trajectory_similarity: Vec::new(),
        }
    }

    pub(crate) fn push_state(&mut self, kind: StateKind, event_key: &str) -> StateId {
        let id = StateId(self.states.len());
        self.states.push(State::new(id, kind, event_key));
        self.key_index.insert(event_key.to_string(), id);
        id
    }

    pub(crate) fn state_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[id.index()]
    }

    pub(crate) fn link_members_mut(&mut self, source: StateId, target: StateId) -> &mut MemberSet {
        let idx = match self.link_index.get(&(source, target)) {
            Some(&idx) => idx,
            None => {
                self.links.push(Link::new(source, target));
                let idx = self.links.len() - 1;
                self.link_index.insert((source, target), idx);
                idx
            }
        };
        &mut self.links[idx].member_ids
    }

    pub(crate) fn insert_or_join_trajectory(&mut self, trajectory: Trajectory) {
        match self.trajectory_index.get(&trajectory.key) {
            Some(&idx) => self.trajectories[idx]
                .member_ids
                .extend_from(&trajectory.member_ids),
            None => {
                self.trajectory_index
                    .insert(trajectory.key.clone(), self.trajectories.len());
                self.trajectories.push(trajectory);
            }
        }
    }
}

impl Default for StateGraph {
    fn default() -> Self {
        Self::new()
    }
}
