use crate::types::{ActorId, StateId, StateKind};
use serde::{Deserialize, Serialize};

/// Insertion-ordered set of actor ids.
///
/// Serialized as a plain list; never holds duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberSet(Vec<ActorId>);

impl MemberSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add `actor` if absent. Returns `true` when it was inserted.
    pub fn insert(&mut self, actor: &ActorId) -> bool {
        if self.contains(actor) {
            return false;
        }
        self.0.push(actor.clone());
        true
    }

    pub fn contains(&self, actor: &ActorId) -> bool {
        self.0.iter().any(|a| a == actor)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorId> {
        self.0.iter()
    }

    /// Union `other` into `self`, keeping first-seen order.
    pub fn extend_from(&mut self, other: &MemberSet) {
        for actor in other.iter() {
            self.insert(actor);
        }
    }
}

impl FromIterator<ActorId> for MemberSet {
    fn from_iter<I: IntoIterator<Item = ActorId>>(iter: I) -> Self {
        let mut set = MemberSet::new();
        for actor in iter {
            set.insert(&actor);
        }
        set
    }
}

/// A node of the sequence graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub id: StateId,
    pub kind: StateKind,
    /// Canonical description of the semantic event this state stands for.
    pub event_key: String,
    pub member_ids: MemberSet,
}

impl State {
    pub fn new(id: StateId, kind: StateKind, event_key: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            event_key: event_key.into(),
            member_ids: MemberSet::new(),
        }
    }

    pub fn start() -> Self {
        Self::new(StateId::START, StateKind::Start, "start")
    }

    pub fn end() -> Self {
        Self::new(StateId::END, StateKind::End, "end")
    }
}

/// An observed transition between two states.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// `"<source>_<target>"`.
    pub id: String,
    pub source: StateId,
    pub target: StateId,
    pub member_ids: MemberSet,
}

impl Link {
    pub fn new(source: StateId, target: StateId) -> Self {
        Self {
            id: Self::link_id(source, target),
            source,
            target,
            member_ids: MemberSet::new(),
        }
    }

    pub fn link_id(source: StateId, target: StateId) -> String {
        format!("{}_{}", source, target)
    }
}

/// One actor path through the graph, shared by every actor whose raw event
/// sequence produced the same `key`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Concatenation of `"_" + event_name` for every raw event folded.
    pub key: String,
    pub sequence: Vec<StateId>,
    /// Raw event names framed by the `start_game` / `end_game` sentinels.
    pub action_labels: Vec<String>,
    pub member_ids: MemberSet,
    pub completed: bool,
}

impl Trajectory {
    /// Sentinel label opening every action sequence.
    pub const START_LABEL: &'static str = "start_game";
    /// Sentinel label closing every completed action sequence.
    pub const END_LABEL: &'static str = "end_game";

    /// Number of `label` occurrences in the action sequence.
    pub fn count_label(&self, label: &str) -> usize {
        self.action_labels.iter().filter(|l| l.as_str() == label).count()
    }
}
