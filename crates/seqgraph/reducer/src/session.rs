//! Per-actor session state.
//!
//! A [`SessionTracker`] owns everything one actor's session accumulates:
//! the path through the graph, the raw event key, the item registry and the
//! feature counters. A new tracker is created for every session, so nothing
//! carries over from one actor to the next.

use crate::classifier::{reached_milestone, RiskLevel, VoteOffer};
use crate::config::{AccumulationMode, MilestoneConfig, ReducerConfig};
use crate::registry::ItemRegistry;
use seqgraph_graph::StateGraph;
use seqgraph_types::{ActorId, StateId, StateKind, Trajectory};
use std::mem;
use tracing::{debug, info};

/// Lifecycle of an actor session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    Active,
    /// The game was suspended; remaining rows are ignored.
    Suspended,
    Closed,
}

/// Most boundaries a single update reports one by one.
pub const MAX_BACKFILL_STEPS: u64 = 10;

/// Running counter that reports each milestone boundary once.
#[derive(Clone, Debug)]
pub struct MilestoneTracker {
    config: MilestoneConfig,
    counter: u64,
    last: u64,
}

impl MilestoneTracker {
    pub fn new(config: MilestoneConfig) -> Self {
        Self {
            config,
            counter: 0,
            last: 0,
        }
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Apply a reported amount and return the boundaries newly reached, in
    /// ascending order.
    ///
    /// A jump of more than [`MAX_BACKFILL_STEPS`] boundaries reports only the
    /// highest one. Returns `None`, leaving the tracker unchanged, if the
    /// counter or its next boundary would overflow.
    pub fn update(&mut self, amount: u64, mode: AccumulationMode) -> Option<Vec<u64>> {
        let counter = match mode {
            AccumulationMode::Accumulate => self.counter.checked_add(amount)?,
            AccumulationMode::Replace => amount,
        };
        let reached = reached_milestone(counter, &self.config)?;
        self.counter = counter;
        Some(self.advance(reached))
    }

    fn advance(&mut self, reached: u64) -> Vec<u64> {
        let step = self.config.step;
        if step == 0 || reached <= self.last {
            return Vec::new();
        }
        let crossed = if (reached - self.last) / step > MAX_BACKFILL_STEPS {
            vec![reached]
        } else {
            let mut crossed = Vec::new();
            let mut next = self.last.checked_add(step);
            while let Some(boundary) = next.filter(|&b| b <= reached) {
                crossed.push(boundary);
                next = boundary.checked_add(step);
            }
            crossed
        };
        self.last = reached;
        crossed
    }
}

/// Manhattan distance walked between successive arrivals.
#[derive(Clone, Debug)]
pub struct DistanceTracker {
    origin: Option<(i64, i64)>,
    milestones: MilestoneTracker,
}

impl DistanceTracker {
    pub fn new(config: MilestoneConfig) -> Self {
        Self {
            origin: None,
            milestones: MilestoneTracker::new(config),
        }
    }

    pub fn covered(&self) -> u64 {
        self.milestones.counter()
    }

    /// Register an arrival. The first arrival after a reset only sets the
    /// origin. Returns `None`, leaving the tracker unchanged, if the walked
    /// distance does not fit in a `u64`.
    pub fn arrive(&mut self, position: (i64, i64)) -> Option<Vec<u64>> {
        let Some((x, y)) = self.origin else {
            self.origin = Some(position);
            return Some(Vec::new());
        };
        let walked = position.0.abs_diff(x).checked_add(position.1.abs_diff(y))?;
        let crossed = self.milestones.update(walked, AccumulationMode::Accumulate)?;
        self.origin = Some(position);
        Some(crossed)
    }

    pub fn reset_origin(&mut self) {
        self.origin = None;
    }
}

/// Accumulators and path of one actor session.
#[derive(Debug)]
pub struct SessionTracker {
    actor: ActorId,
    phase: SessionPhase,
    sequence: Vec<StateId>,
    action_labels: Vec<String>,
    key: String,
    registry: ItemRegistry,
    gold: MilestoneTracker,
    distance: DistanceTracker,
    round: u32,
    votes: Vec<f64>,
    offer: Option<VoteOffer>,
    round_risks: Vec<RiskLevel>,
    selection_sum: f64,
    selection_count: u32,
}

impl SessionTracker {
    /// A session that has not been registered in any graph yet.
    pub fn new(actor: ActorId, config: &ReducerConfig) -> Self {
        Self {
            actor,
            phase: SessionPhase::NotStarted,
            sequence: vec![StateId::START],
            action_labels: vec![Trajectory::START_LABEL.to_string()],
            key: String::new(),
            registry: ItemRegistry::new(),
            gold: MilestoneTracker::new(config.gold),
            distance: DistanceTracker::new(config.distance),
            round: 1,
            votes: Vec::new(),
            offer: None,
            round_risks: Vec::new(),
            selection_sum: 0.0,
            selection_count: 0,
        }
    }

    /// Create a session and register its actor in the start state.
    pub fn open(actor: ActorId, config: &ReducerConfig, graph: &mut StateGraph) -> Self {
        let mut session = Self::new(actor, config);
        graph.ensure_member(StateId::START, &session.actor);
        session.phase = SessionPhase::Active;
        info!(actor = %session.actor, "Session opened");
        session
    }

    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn sequence(&self) -> &[StateId] {
        &self.sequence
    }

    pub fn action_labels(&self) -> &[String] {
        &self.action_labels
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Append a raw event to the trajectory key and the action labels.
    pub fn record_event(&mut self, name: &str) {
        self.key.push('_');
        self.key.push_str(name);
        self.action_labels.push(name.to_string());
    }

    /// Add a derived state to the graph and to this session's path.
    pub fn emit(&mut self, graph: &mut StateGraph, event_key: &str, kind: StateKind) -> StateId {
        graph.ensure_member(StateId::START, &self.actor);
        let id = graph.upsert_state(event_key, kind, &self.actor);
        self.sequence.push(id);
        debug!(actor = %self.actor, state = %id, event_key, "Derived state emitted");
        id
    }

    pub fn suspend(&mut self) {
        if self.phase == SessionPhase::Active {
            self.phase = SessionPhase::Suspended;
            info!(actor = %self.actor, round = self.round, "Session suspended");
        }
    }

    /// Close the session into `graph`. Returns `false` if it was already
    /// closed or never started.
    pub fn close(&mut self, graph: &mut StateGraph) -> bool {
        match self.phase {
            SessionPhase::Active | SessionPhase::Suspended => {}
            SessionPhase::NotStarted | SessionPhase::Closed => return false,
        }
        if !graph.has_started(&self.actor) {
            return false;
        }

        let states = self.sequence.len() + 1;
        graph.close_session(
            mem::take(&mut self.sequence),
            &self.actor,
            mem::take(&mut self.action_labels),
            mem::take(&mut self.key),
        );
        self.phase = SessionPhase::Closed;
        self.registry.clear();
        info!(actor = %self.actor, states, "Session closed");
        true
    }

    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ItemRegistry {
        &mut self.registry
    }

    pub fn gold_mut(&mut self) -> &mut MilestoneTracker {
        &mut self.gold
    }

    pub fn distance_mut(&mut self) -> &mut DistanceTracker {
        &mut self.distance
    }

    pub fn record_vote(&mut self, probability: f64) {
        self.votes.push(probability);
    }

    pub fn votes(&self) -> &[f64] {
        &self.votes
    }

    pub fn clear_votes(&mut self) {
        self.votes.clear();
    }

    pub fn set_offer(&mut self, offer: Option<VoteOffer>) {
        self.offer = offer;
    }

    pub fn offer(&self) -> Option<&VoteOffer> {
        self.offer.as_ref()
    }

    /// Record the risk of a selection and the selected item's probability.
    pub fn record_selection(&mut self, risk: RiskLevel, probability: f64) {
        self.round_risks.push(risk);
        self.selection_sum += probability;
        self.selection_count += 1;
    }

    pub fn round_risks(&self) -> &[RiskLevel] {
        &self.round_risks
    }

    pub fn take_round_risks(&mut self) -> Vec<RiskLevel> {
        mem::take(&mut self.round_risks)
    }

    /// Average selected-item probability of the round so far, resetting it.
    pub fn take_selection_average(&mut self) -> Option<f64> {
        let count = mem::take(&mut self.selection_count);
        let sum = mem::take(&mut self.selection_sum);
        (count > 0).then(|| sum / f64::from(count))
    }

    pub fn advance_round(&mut self) {
        self.round += 1;
        self.distance.reset_origin();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gold() -> MilestoneTracker {
        MilestoneTracker::new(MilestoneConfig::gold())
    }

    fn replace(m: &mut MilestoneTracker, amount: u64) -> Vec<u64> {
        m.update(amount, AccumulationMode::Replace).unwrap()
    }

    #[test]
    fn milestone_reported_once_for_repeated_totals() {
        let mut m = gold();
        assert_eq!(replace(&mut m, 100), vec![100]);
        assert!(replace(&mut m, 100).is_empty());
        assert!(replace(&mut m, 120).is_empty());
        assert_eq!(replace(&mut m, 196), vec![200]);
        assert!(replace(&mut m, 200).is_empty());
    }

    #[test]
    fn milestone_jump_reports_each_boundary() {
        let mut m = gold();
        assert_eq!(replace(&mut m, 310), vec![100, 200, 300]);
        assert!(replace(&mut m, 250).is_empty());
    }

    #[test]
    fn long_jump_reports_only_the_highest_boundary() {
        let mut m = gold();
        assert_eq!(replace(&mut m, 1000), (1..=10).map(|n| n * 100).collect::<Vec<_>>());
        assert_eq!(replace(&mut m, 2_000_000), vec![2_000_000]);
        assert_eq!(replace(&mut m, 2_000_100), vec![2_000_100]);
    }

    #[test]
    fn overflowing_total_leaves_tracker_unchanged() {
        let mut m = gold();
        assert_eq!(replace(&mut m, 100), vec![100]);
        assert_eq!(m.update(u64::MAX, AccumulationMode::Replace), None);
        assert_eq!(m.counter(), 100);
        assert_eq!(replace(&mut m, 200), vec![200]);

        let mut acc = gold();
        assert_eq!(acc.update(u64::MAX - 10, AccumulationMode::Accumulate), None);
        assert_eq!(acc.update(60, AccumulationMode::Accumulate), Some(vec![]));
        assert_eq!(acc.update(u64::MAX, AccumulationMode::Accumulate), None);
        assert_eq!(acc.counter(), 60);
    }

    #[test]
    fn milestone_accumulates_increments() {
        let mut m = gold();
        assert_eq!(m.update(60, AccumulationMode::Accumulate), Some(vec![]));
        assert_eq!(m.update(40, AccumulationMode::Accumulate), Some(vec![100]));
        assert_eq!(m.counter(), 100);
        assert_eq!(m.update(0, AccumulationMode::Accumulate), Some(vec![]));
    }

    #[test]
    fn zero_never_emits() {
        let mut m = gold();
        assert!(replace(&mut m, 0).is_empty());
    }

    #[test]
    fn distance_first_arrival_sets_origin() {
        let mut d = DistanceTracker::new(MilestoneConfig::distance());
        assert_eq!(d.arrive((10, 10)), Some(vec![]));
        assert_eq!(d.arrive((40, 50)), Some(vec![]));
        assert_eq!(d.covered(), 70);
        assert_eq!(d.arrive((40, 80)), Some(vec![100]));
        d.reset_origin();
        assert_eq!(d.arrive((0, 0)), Some(vec![]));
        assert_eq!(d.covered(), 100);
    }

    #[test]
    fn distance_across_the_whole_grid_is_rejected() {
        let mut d = DistanceTracker::new(MilestoneConfig::distance());
        assert_eq!(d.arrive((i64::MAX, 0)), Some(vec![]));
        // One axis spans the full u64 range; adding the other overflows.
        assert_eq!(d.arrive((i64::MIN, i64::MIN)), None);
        assert_eq!(d.covered(), 0);
        // The origin stays at the last accepted arrival.
        assert_eq!(d.arrive((i64::MAX - 100, 0)), Some(vec![100]));
    }

    #[test]
    fn open_registers_start_member() {
        let mut graph = StateGraph::new();
        let session = SessionTracker::open("t1.csv".into(), &ReducerConfig::default(), &mut graph);
        assert!(session.is_active());
        assert!(graph.has_started(&ActorId::from("t1.csv")));
        assert_eq!(session.round(), 1);
    }

    #[test]
    fn close_is_single_shot() {
        let mut graph = StateGraph::new();
        let mut session =
            SessionTracker::open("t1.csv".into(), &ReducerConfig::default(), &mut graph);
        session.record_event("ItemSetup");
        assert!(session.close(&mut graph));
        assert!(!session.close(&mut graph));
        assert_eq!(session.phase(), SessionPhase::Closed);

        let traj = graph.trajectory("_ItemSetup").unwrap();
        assert_eq!(traj.action_labels, vec!["start_game", "ItemSetup", "end_game"]);
    }

    #[test]
    fn unopened_session_does_not_close() {
        let mut graph = StateGraph::new();
        let mut session = SessionTracker::new("t1.csv".into(), &ReducerConfig::default());
        assert!(!session.close(&mut graph));
        assert!(graph.trajectories().is_empty());
    }

    #[test]
    fn suspended_session_still_closes() {
        let mut graph = StateGraph::new();
        let mut session =
            SessionTracker::open("t1.csv".into(), &ReducerConfig::default(), &mut graph);
        session.suspend();
        assert_eq!(session.phase(), SessionPhase::Suspended);
        assert!(!session.is_active());
        assert!(session.close(&mut graph));
    }

    #[test]
    fn selection_average_resets() {
        let mut session = SessionTracker::new("p".into(), &ReducerConfig::default());
        assert_eq!(session.take_selection_average(), None);
        session.record_selection(RiskLevel::High, 0.3);
        session.record_selection(RiskLevel::Low, 0.8);
        let avg = session.take_selection_average().unwrap();
        assert!((avg - 0.55).abs() < 1e-12);
        assert_eq!(session.take_selection_average(), None);
        assert_eq!(session.round_risks().len(), 2);
    }
}
