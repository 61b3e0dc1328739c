//! Property tests: state graph invariants hold for arbitrary key and actor sequences.

use proptest::prelude::*;
use seqgraph_graph::StateGraph;
use seqgraph_types::{ActorId, StateId, StateKind};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn arb_actor() -> impl Strategy<Value = ActorId> {
    "[a-z]{2,6}(\\.csv)?".prop_map(ActorId::from)
}

fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u32..6, prop_oneof![Just("high"), Just("low"), Just("n.a.")])
            .prop_map(|(r, risk)| format!("r{}:risk {}", r, risk)),
        (1u32..6).prop_map(|r| format!("round {}", r)),
        (1u64..10).prop_map(|g| format!("gold: {}", g * 100)),
    ]
}

fn arb_kind() -> impl Strategy<Value = StateKind> {
    prop_oneof![Just(StateKind::Mid), Just(StateKind::Round)]
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// The same key always resolves to the same id, whoever asks.
    #[test]
    fn upsert_is_idempotent(
        ops in prop::collection::vec((arb_key(), arb_kind(), arb_actor()), 1..40),
    ) {
        let mut graph = StateGraph::new();
        let mut seen = std::collections::HashMap::new();
        for (key, kind, actor) in &ops {
            let id = graph.upsert_state(key, *kind, actor);
            let first = *seen.entry(key.clone()).or_insert(id);
            prop_assert_eq!(first, id);
            prop_assert!(!id.is_terminal());
        }
        prop_assert_eq!(graph.states().len(), 2 + seen.len());
    }

    /// Every closed trajectory starts at 0 and ends at 1.
    #[test]
    fn closed_trajectories_are_framed(
        sessions in prop::collection::vec(
            (arb_actor(), prop::collection::vec(arb_key(), 0..8)),
            1..10,
        ),
    ) {
        let mut graph = StateGraph::new();
        for (actor, keys) in &sessions {
            graph.ensure_member(StateId::START, actor);
            let mut sequence = vec![StateId::START];
            let mut raw = String::new();
            for key in keys {
                sequence.push(graph.upsert_state(key, StateKind::Mid, actor));
                raw.push('_');
                raw.push_str(key);
            }
            graph.close_session(sequence, actor, vec!["start_game".into()], raw);
        }

        for trajectory in graph.trajectories() {
            prop_assert_eq!(trajectory.sequence.first(), Some(&StateId::START));
            prop_assert_eq!(trajectory.sequence.last(), Some(&StateId::END));
            prop_assert!(trajectory.completed);
            prop_assert_eq!(trajectory.action_labels.last().map(String::as_str), Some("end_game"));
        }
    }

    /// Repeating a transition for the same actor never duplicates the member.
    #[test]
    fn link_members_never_duplicate(
        transitions in prop::collection::vec((0usize..5, 0usize..5, arb_actor()), 1..60),
    ) {
        let mut graph = StateGraph::new();
        for (s, t, actor) in &transitions {
            graph.record_transition(StateId(*s), StateId(*t), actor);
            graph.record_transition(StateId(*s), StateId(*t), actor);
        }

        let mut pairs = HashSet::new();
        for link in graph.links() {
            prop_assert!(pairs.insert((link.source, link.target)));
            let unique: HashSet<&ActorId> = link.member_ids.iter().collect();
            prop_assert_eq!(unique.len(), link.member_ids.len());
            prop_assert_eq!(&link.id, &format!("{}_{}", link.source, link.target));
        }
    }

    /// Merging keeps every key's member union.
    #[test]
    fn merge_unions_members(
        left_ops in prop::collection::vec((arb_key(), arb_actor()), 0..20),
        right_ops in prop::collection::vec((arb_key(), arb_actor()), 0..20),
    ) {
        let mut left = StateGraph::new();
        for (key, actor) in &left_ops {
            left.upsert_state(key, StateKind::Mid, actor);
        }
        let mut right = StateGraph::new();
        for (key, actor) in &right_ops {
            right.upsert_state(key, StateKind::Mid, actor);
        }

        left.merge(&right);
        for (key, actor) in left_ops.iter().chain(right_ops.iter()) {
            let id = left.state_id(key).expect("merged key present");
            prop_assert!(left.state(id).unwrap().member_ids.contains(actor));
        }
    }
}
