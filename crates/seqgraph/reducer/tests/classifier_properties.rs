//! Property tests: classifier rules and milestone emission.

use proptest::prelude::*;
use seqgraph_reducer::{
    classify_risk, AccumulationMode, MilestoneConfig, MilestoneTracker, RiskLevel,
    VoteDispersion,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn arb_probability() -> impl Strategy<Value = f64> {
    (0u32..=100).prop_map(|p| f64::from(p) / 100.0)
}

fn arb_item() -> impl Strategy<Value = String> {
    prop_oneof![Just("Drill"), Just("Pick"), Just("Mine1")].prop_map(String::from)
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Risk follows the gap rules and depends on nothing else.
    #[test]
    fn risk_classification_rules(
        selected in arb_item(),
        item1 in arb_item(),
        p1 in arb_probability(),
        p2 in arb_probability(),
    ) {
        let risk = classify_risk(&selected, &item1, p1, p2);
        prop_assert_eq!(risk, classify_risk(&selected, &item1, p1, p2));

        let gap = (p1 - p2).abs();
        let expected = if p1 == p2 {
            RiskLevel::NotApplicable
        } else if gap <= 0.1001 {
            RiskLevel::Negligible
        } else if selected == item1 && p1 < p2 {
            RiskLevel::High
        } else {
            RiskLevel::Low
        };
        prop_assert_eq!(risk, expected);
    }

    /// Each multiple of the step is reported at most once, in order.
    #[test]
    fn milestones_reported_once(
        totals in prop::collection::vec(0u64..1000, 1..40),
        accumulate in any::<bool>(),
    ) {
        let mode = if accumulate {
            AccumulationMode::Accumulate
        } else {
            AccumulationMode::Replace
        };
        let mut tracker = MilestoneTracker::new(MilestoneConfig::gold());
        let mut reported: Vec<u64> = Vec::new();
        for amount in totals {
            let crossed = tracker.update(amount, mode);
            prop_assert!(crossed.is_some());
            reported.extend(crossed.unwrap_or_default());
        }

        for pair in reported.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        for milestone in &reported {
            prop_assert!(*milestone > 0);
            prop_assert_eq!(milestone % 100, 0);
        }
    }

    /// Non-zero dispersion never bins as none.
    #[test]
    fn dispersion_bins_are_ordered(std_dev in 0.0f64..2.0) {
        let bin = VoteDispersion::from_std_dev(std_dev);
        if std_dev == 0.0 {
            prop_assert_eq!(bin, VoteDispersion::None);
        } else if std_dev <= 0.35 {
            prop_assert_eq!(bin, VoteDispersion::Small);
        } else {
            prop_assert_eq!(bin, VoteDispersion::Large);
        }
    }
}
