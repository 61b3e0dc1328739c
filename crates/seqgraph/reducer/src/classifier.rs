//! Threshold classifiers.
//!
//! Pure mappings from raw probabilities and counters to the discrete bins
//! that become state keys. Thresholds are literal: `0.1001` is not `0.1`.

use crate::config::MilestoneConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Probability gap at or below which a choice carries negligible risk.
pub const NEGLIGIBLE_RISK_GAP: f64 = 0.1001;
/// Upper bound (inclusive) of a low risk-proneness gap.
pub const LOW_PRONENESS_GAP: f64 = 0.3001;
/// Lower bound (inclusive) of a high risk-proneness gap.
pub const HIGH_PRONENESS_GAP: f64 = 0.6001;
/// Upper bound (inclusive) of a small vote dispersion.
pub const SMALL_DISPERSION_MAX: f64 = 0.35;
/// Upper bound (inclusive) of a low average success probability.
pub const LOW_AVERSION_MAX: f64 = 0.50;
/// Upper bound (inclusive) of a medium average success probability.
pub const MEDIUM_AVERSION_MAX: f64 = 0.70;

/// The two options of a vote with their effective success probabilities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoteOffer {
    pub item1: String,
    pub p1: f64,
    pub item2: String,
    pub p2: f64,
}

impl VoteOffer {
    pub fn new(item1: impl Into<String>, p1: f64, item2: impl Into<String>, p2: f64) -> Self {
        Self {
            item1: item1.into(),
            p1,
            item2: item2.into(),
            p2,
        }
    }

    pub fn gap(&self) -> f64 {
        (self.p1 - self.p2).abs()
    }

    /// Risk taken by selecting `selected` out of this offer.
    pub fn classify(&self, selected: &str) -> RiskLevel {
        classify_risk(selected, &self.item1, self.p1, self.p2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    NotApplicable,
    Negligible,
    High,
    Low,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable => write!(f, "n.a."),
            Self::Negligible => write!(f, "negligible"),
            Self::High => write!(f, "high"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Classify the selection of `selected` when `item1` (probability `p1`) was
/// offered against a second option with probability `p2`.
///
/// Picking `item1` while it has the lower probability is high risk; any
/// other selection with a gap above [`NEGLIGIBLE_RISK_GAP`] is low risk.
pub fn classify_risk(selected: &str, item1: &str, p1: f64, p2: f64) -> RiskLevel {
    let gap = (p1 - p2).abs();
    if p1 == p2 {
        RiskLevel::NotApplicable
    } else if gap <= NEGLIGIBLE_RISK_GAP {
        RiskLevel::Negligible
    } else if selected == item1 && p1 < p2 {
        RiskLevel::High
    } else {
        RiskLevel::Low
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskProneness {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskProneness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

pub fn classify_risk_proneness(gap: f64) -> RiskProneness {
    if gap <= LOW_PRONENESS_GAP {
        RiskProneness::Low
    } else if gap < HIGH_PRONENESS_GAP {
        RiskProneness::Medium
    } else {
        RiskProneness::High
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteDispersion {
    None,
    Small,
    Large,
}

impl VoteDispersion {
    pub fn from_std_dev(std_dev: f64) -> Self {
        if std_dev == 0.0 {
            Self::None
        } else if std_dev <= SMALL_DISPERSION_MAX {
            Self::Small
        } else {
            Self::Large
        }
    }
}

impl fmt::Display for VoteDispersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Small => write!(f, "Small"),
            Self::Large => write!(f, "Large"),
        }
    }
}

/// Population standard deviation. Identical values give exactly `0.0`.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let first = *values.first()?;
    if values.iter().all(|&v| v == first) {
        return Some(0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskAversion {
    Low,
    Medium,
    High,
}

impl RiskAversion {
    /// Bin the average success probability of a round's selections, rounded
    /// to two decimals first.
    pub fn from_average(average: f64) -> Self {
        let average = (average * 100.0).round() / 100.0;
        if average <= LOW_AVERSION_MAX {
            Self::Low
        } else if average <= MEDIUM_AVERSION_MAX {
            Self::Medium
        } else {
            Self::High
        }
    }
}

impl fmt::Display for RiskAversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Round `value` up to the next multiple of `step`. `None` if the result
/// does not fit in a `u64`.
pub fn round_up(value: u64, step: u64) -> Option<u64> {
    if step == 0 || value % step == 0 {
        Some(value)
    } else {
        value.checked_add(step - value % step)
    }
}

/// Highest milestone boundary `counter` counts as having reached.
///
/// A counter sitting exactly on a boundary, or within `tolerance` of a step
/// below the next one, reaches that boundary; otherwise it has only reached
/// the boundary below it. The band check runs in `f64`, so `195` with a
/// `0.05` band stays below `200`. `None` if the boundary above `counter`
/// does not fit in a `u64`.
pub fn reached_milestone(counter: u64, config: &MilestoneConfig) -> Option<u64> {
    if config.step == 0 {
        return Some(0);
    }
    let rest_of_division = (counter as f64 / config.step as f64) % 1.0;
    let remainder = 1.0 - rest_of_division;
    if remainder == 1.0 || remainder <= config.tolerance {
        round_up(counter, config.step)
    } else {
        Some(counter - counter % config.step)
    }
}

/// Render risk levels the way round keys list them: `['high', 'low']`.
pub fn format_risk_list(risks: &[RiskLevel]) -> String {
    let items: Vec<String> = risks.iter().map(|r| format!("'{}'", r)).collect();
    format!("[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_equal_probabilities_is_not_applicable() {
        assert_eq!(classify_risk("a", "a", 0.5, 0.5), RiskLevel::NotApplicable);
    }

    #[test]
    fn risk_negligible_boundary_is_inclusive() {
        assert_eq!(classify_risk("a", "a", 0.4, 0.5), RiskLevel::Negligible);
        assert_eq!(classify_risk("b", "a", 0.45, 0.5), RiskLevel::Negligible);
        assert_eq!(classify_risk("a", "a", 0.39, 0.5), RiskLevel::High);
    }

    #[test]
    fn risk_high_only_for_lower_first_option() {
        assert_eq!(classify_risk("mine", "mine", 0.3, 0.8), RiskLevel::High);
        assert_eq!(classify_risk("drill", "mine", 0.3, 0.8), RiskLevel::Low);
        assert_eq!(classify_risk("drill", "drill", 0.8, 0.3), RiskLevel::Low);
    }

    #[test]
    fn offer_classifies_selection() {
        let offer = VoteOffer::new("Mine1", 0.3, "Drill", 0.8);
        assert_eq!(offer.classify("Mine1"), RiskLevel::High);
        assert!((offer.gap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn risk_display() {
        assert_eq!(RiskLevel::NotApplicable.to_string(), "n.a.");
        assert_eq!(RiskLevel::Negligible.to_string(), "negligible");
    }

    #[test]
    fn proneness_bins() {
        assert_eq!(classify_risk_proneness(0.2), RiskProneness::Low);
        assert_eq!(classify_risk_proneness(0.3001), RiskProneness::Low);
        assert_eq!(classify_risk_proneness(0.3002), RiskProneness::Medium);
        assert_eq!(classify_risk_proneness(0.6), RiskProneness::Medium);
        assert_eq!(classify_risk_proneness(0.6001), RiskProneness::High);
        assert_eq!(classify_risk_proneness(0.9), RiskProneness::High);
    }

    #[test]
    fn dispersion_bins() {
        assert_eq!(VoteDispersion::from_std_dev(0.0), VoteDispersion::None);
        assert_eq!(VoteDispersion::from_std_dev(0.1), VoteDispersion::Small);
        assert_eq!(VoteDispersion::from_std_dev(0.35), VoteDispersion::Small);
        assert_eq!(VoteDispersion::from_std_dev(0.36), VoteDispersion::Large);
    }

    #[test]
    fn std_dev_of_identical_values_is_zero() {
        assert_eq!(population_std_dev(&[0.7, 0.7, 0.7]), Some(0.0));
        assert_eq!(population_std_dev(&[]), None);
    }

    #[test]
    fn std_dev_is_population() {
        let sd = population_std_dev(&[0.2, 0.8]).unwrap();
        assert!((sd - 0.3).abs() < 1e-12);
    }

    #[test]
    fn aversion_bins() {
        assert_eq!(RiskAversion::from_average(0.5), RiskAversion::Low);
        assert_eq!(RiskAversion::from_average(0.504), RiskAversion::Low);
        assert_eq!(RiskAversion::from_average(0.7), RiskAversion::Medium);
        assert_eq!(RiskAversion::from_average(0.71), RiskAversion::High);
    }

    #[test]
    fn round_up_to_step() {
        assert_eq!(round_up(0, 100), Some(0));
        assert_eq!(round_up(200, 100), Some(200));
        assert_eq!(round_up(196, 100), Some(200));
        assert_eq!(round_up(201, 100), Some(300));
    }

    #[test]
    fn round_up_past_u64_is_none() {
        assert_eq!(round_up(u64::MAX, 100), None);
        assert_eq!(round_up(u64::MAX - u64::MAX % 100, 100), Some(u64::MAX - u64::MAX % 100));
    }

    #[test]
    fn milestone_tolerance_band() {
        let gold = MilestoneConfig::gold();
        assert_eq!(reached_milestone(200, &gold), Some(200));
        assert_eq!(reached_milestone(196, &gold), Some(200));
        assert_eq!(reached_milestone(150, &gold), Some(100));
        assert_eq!(reached_milestone(40, &gold), Some(0));

        let distance = MilestoneConfig::distance();
        assert_eq!(reached_milestone(196, &distance), Some(100));
        assert_eq!(reached_milestone(199, &distance), Some(200));
    }

    #[test]
    fn milestone_near_u64_max_does_not_overflow() {
        assert_eq!(reached_milestone(u64::MAX, &MilestoneConfig::gold()), None);
    }

    #[test]
    fn risk_list_format() {
        assert_eq!(
            format_risk_list(&[RiskLevel::High, RiskLevel::Negligible]),
            "['high', 'negligible']"
        );
        assert_eq!(format_risk_list(&[RiskLevel::Low]), "['low']");
    }
}
