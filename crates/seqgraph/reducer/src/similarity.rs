//! Pairwise trajectory similarity.
//!
//! Trajectories are compared by how often a criterion action label occurs in
//! each. A trajectory found close to an earlier source is not compared again
//! as a source itself.

use crate::config::SimilarityConfig;
use seqgraph_types::{GraphExport, Trajectory, TrajectorySimilarity};
use std::collections::HashSet;

/// Compare trajectories in order. Ids are sequential from `"0"`.
pub fn trajectory_similarity(
    trajectories: &[Trajectory],
    criterion: &str,
    threshold: usize,
) -> Vec<TrajectorySimilarity> {
    let counts: Vec<usize> = trajectories.iter().map(|t| t.count_label(criterion)).collect();
    let mut skipped = HashSet::new();
    let mut pairs = Vec::new();

    for i in 0..counts.len().saturating_sub(1) {
        if skipped.contains(&i) {
            continue;
        }
        for j in (i + 1)..counts.len() {
            let similarity = counts[i].abs_diff(counts[j]);
            pairs.push(TrajectorySimilarity {
                id: pairs.len().to_string(),
                source: i,
                target: j,
                similarity,
            });
            if similarity < threshold {
                skipped.insert(j);
            }
        }
    }
    pairs
}

/// Fill `export.trajectory_similarity` when similarity is enabled.
pub fn attach_similarity(export: &mut GraphExport, config: &SimilarityConfig) {
    if config.enabled {
        export.trajectory_similarity =
            trajectory_similarity(&export.trajectories, &config.criterion, config.threshold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqgraph_types::{MemberSet, StateId};

    fn traj(key: &str, rounds: usize) -> Trajectory {
        let mut action_labels = vec!["start_game".to_string()];
        action_labels.extend(std::iter::repeat("GoldSetup".to_string()).take(rounds));
        action_labels.push("end_game".into());
        Trajectory {
            key: key.into(),
            sequence: vec![StateId::START, StateId::END],
            action_labels,
            member_ids: MemberSet::new(),
            completed: true,
        }
    }

    #[test]
    fn close_trajectories_are_not_sources() {
        let trajectories = vec![traj("a", 2), traj("b", 4), traj("c", 12)];
        let pairs = trajectory_similarity(&trajectories, "GoldSetup", 6);

        // b is within 6 of a, so only a and c act as sources.
        let summary: Vec<(usize, usize, usize)> =
            pairs.iter().map(|p| (p.source, p.target, p.similarity)).collect();
        assert_eq!(summary, vec![(0, 1, 2), (0, 2, 10)]);
        assert_eq!(pairs[1].id, "1");
    }

    #[test]
    fn distant_trajectories_all_compared() {
        let trajectories = vec![traj("a", 0), traj("b", 10), traj("c", 20)];
        let pairs = trajectory_similarity(&trajectories, "GoldSetup", 6);
        assert_eq!(pairs.len(), 3);
        assert_eq!((pairs[2].source, pairs[2].target), (1, 2));
    }

    #[test]
    fn fewer_than_two_trajectories_yield_nothing() {
        assert!(trajectory_similarity(&[], "GoldSetup", 6).is_empty());
        assert!(trajectory_similarity(&[traj("a", 1)], "GoldSetup", 6).is_empty());
    }

    #[test]
    fn disabled_config_leaves_export_untouched() {
        let mut export = GraphExport {
            nodes: vec![],
            links: vec![],
            trajectories: vec![traj("a", 1), traj("b", 1)],
            session_count: 2,
            group_label: "g".into(),
            trajectory_similarity: vec![],
        };
        attach_similarity(&mut export, &SimilarityConfig::default());
        assert!(export.trajectory_similarity.is_empty());

        let enabled = SimilarityConfig {
            enabled: true,
            ..SimilarityConfig::default()
        };
        attach_similarity(&mut export, &enabled);
        assert_eq!(export.trajectory_similarity.len(), 1);
        assert_eq!(export.trajectory_similarity[0].similarity, 0);
    }
}
