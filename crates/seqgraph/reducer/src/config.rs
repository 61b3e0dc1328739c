//! Reducer configuration.
//!
//! Every knob that differs between dataset vintages (column offsets, event
//! names) or between analyses (enabled features, milestone steps) lives here
//! so it can be loaded from a config file instead of edited in code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A derived computation the reducer can turn into graph states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Resource milestones (`gold: 200`).
    Gold,
    /// One state per round (`round 3`).
    Round,
    /// Distance milestones, player focus only (`distance: 300`).
    Distance,
    /// Risk of each leader selection (`r2:risk high`).
    Risk,
    /// Dispersion of the votes before each selection.
    VotingStDev,
    /// Average success probability of the round's selections.
    RiskAversion,
    /// Round state listing the round's risk classifications.
    #[serde(rename = "round+risk", alias = "round_risk")]
    RoundRisk,
    /// Gap size behind each high-risk selection.
    RiskProneness,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::Gold,
        Feature::Round,
        Feature::Distance,
        Feature::Risk,
        Feature::VotingStDev,
        Feature::RiskAversion,
        Feature::RoundRisk,
        Feature::RiskProneness,
    ];
}

/// The set of enabled [`Feature`]s.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeSet<Feature>);

impl FeatureSet {
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn all() -> Self {
        Feature::ALL.into_iter().collect()
    }

    pub fn with(mut self, feature: Feature) -> Self {
        self.0.insert(feature);
        self
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::none().with(Feature::RoundRisk)
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Zero-based column offsets of the fields the reducer reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub event: usize,
    /// Holds the team file name on team boundary rows.
    pub team_id: usize,
    pub player_id: usize,
    /// Item name on `ItemSetup` / `MineSetup` rows.
    pub item_name: usize,
    /// Probability (tools) or range (mines) on setup rows.
    pub item_probability: usize,
    pub option_one: usize,
    pub option_two: usize,
    pub voted_item: usize,
    pub selected_item: usize,
    pub found_gold: usize,
    pub total_gold: usize,
    pub position: usize,
    pub competition_level: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            event: 0,
            team_id: 0,
            player_id: 2,
            item_name: 2,
            item_probability: 4,
            option_one: 2,
            option_two: 3,
            voted_item: 3,
            selected_item: 2,
            found_gold: 4,
            total_gold: 2,
            position: 3,
            competition_level: 5,
        }
    }
}

/// Event names of the game log vocabulary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventVocabulary {
    pub item_setup: String,
    pub mine_setup: String,
    pub start_votation: String,
    pub vote: String,
    pub leader_selection: String,
    pub total_gold: String,
    pub found_gold: String,
    pub arrived_to: String,
    pub round_separator: String,
    pub game_suspended: String,
    pub player_connection: String,
    pub setup_match: String,
    /// Value of the team-id field that ends a multi-team log.
    pub end_of_stream: String,
    /// Substring that marks a team-id field as a team boundary.
    pub team_marker: String,
}

impl Default for EventVocabulary {
    fn default() -> Self {
        Self {
            item_setup: "ItemSetup".into(),
            mine_setup: "MineSetup".into(),
            start_votation: "StartVotation".into(),
            vote: "Vote".into(),
            leader_selection: "LeaderSelection".into(),
            total_gold: "TotalGold".into(),
            found_gold: "FoundGold".into(),
            arrived_to: "ArrivedTo".into(),
            round_separator: "GoldSetup".into(),
            game_suspended: "GameSuspended".into(),
            player_connection: "PlayerConnection".into(),
            setup_match: "SetupMatch".into(),
            end_of_stream: "END".into(),
            team_marker: ".csv".into(),
        }
    }
}

/// Step and tolerance band of one milestone metric.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MilestoneConfig {
    pub step: u64,
    /// Fraction of a step below a boundary that already counts as reaching it.
    pub tolerance: f64,
}

impl MilestoneConfig {
    pub fn gold() -> Self {
        Self {
            step: 100,
            tolerance: 0.05,
        }
    }

    pub fn distance() -> Self {
        Self {
            step: 100,
            tolerance: 0.02,
        }
    }
}

/// How a reported resource amount updates the running counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationMode {
    /// Amounts are increments (a player's `FoundGold`).
    Accumulate,
    /// Amounts are running totals (a team's `TotalGold`).
    Replace,
}

/// Who the actors of a log are.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    /// Teams, delimited by boundary rows in one log.
    #[default]
    Teams,
    /// Individual players, one re-scan of the log per player.
    Players,
}

/// What to do with a row too short for its event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedRowPolicy {
    #[default]
    Skip,
    Abort,
}

/// Pairwise trajectory similarity settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub enabled: bool,
    /// Action label whose occurrences are compared.
    pub criterion: String,
    /// Trajectories closer than this to an earlier one are not used as sources.
    pub threshold: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            criterion: "GoldSetup".into(),
            threshold: 6,
        }
    }
}

/// Full reducer configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    pub focus: Focus,
    pub features: FeatureSet,
    pub columns: ColumnLayout,
    pub events: EventVocabulary,
    pub gold: MilestoneConfig,
    pub distance: MilestoneConfig,
    pub team_gold_mode: AccumulationMode,
    pub player_gold_mode: AccumulationMode,
    pub malformed_rows: MalformedRowPolicy,
    pub similarity: SimilarityConfig,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            focus: Focus::Teams,
            features: FeatureSet::default(),
            columns: ColumnLayout::default(),
            events: EventVocabulary::default(),
            gold: MilestoneConfig::gold(),
            distance: MilestoneConfig::distance(),
            team_gold_mode: AccumulationMode::Replace,
            player_gold_mode: AccumulationMode::Accumulate,
            malformed_rows: MalformedRowPolicy::Skip,
            similarity: SimilarityConfig::default(),
        }
    }
}

impl ReducerConfig {
    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    pub fn with_focus(mut self, focus: Focus) -> Self {
        self.focus = focus;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_features_match_round_risk_only() {
        let f = FeatureSet::default();
        assert!(f.contains(Feature::RoundRisk));
        assert!(!f.contains(Feature::Risk));
        assert_eq!(f.iter().count(), 1);
    }

    #[test]
    fn feature_names_round_trip() {
        let f: FeatureSet =
            serde_json::from_str(r#"["round+risk", "voting_st_dev", "risk_proneness"]"#).unwrap();
        assert!(f.contains(Feature::RoundRisk));
        assert!(f.contains(Feature::VotingStDev));
        assert!(f.contains(Feature::RiskProneness));

        let alias: Feature = serde_json::from_str("\"round_risk\"").unwrap();
        assert_eq!(alias, Feature::RoundRisk);
        assert_eq!(serde_json::to_string(&Feature::RoundRisk).unwrap(), "\"round+risk\"");
    }

    #[test]
    fn all_features() {
        assert_eq!(FeatureSet::all().iter().count(), Feature::ALL.len());
    }

    #[test]
    fn milestone_defaults_differ_per_metric() {
        let c = ReducerConfig::default();
        assert_eq!(c.gold.step, 100);
        assert_eq!(c.gold.tolerance, 0.05);
        assert_eq!(c.distance.tolerance, 0.02);
        assert_eq!(c.team_gold_mode, AccumulationMode::Replace);
        assert_eq!(c.player_gold_mode, AccumulationMode::Accumulate);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let c: ReducerConfig =
            serde_json::from_str(r#"{"focus": "players", "columns": {"player_id": 3}}"#).unwrap();
        assert_eq!(c.focus, Focus::Players);
        assert_eq!(c.columns.player_id, 3);
        assert_eq!(c.columns.item_probability, 4);
        assert_eq!(c.events.round_separator, "GoldSetup");
    }
}
