use crate::model::{Link, State, Trajectory};
use serde::{Deserialize, Serialize};

/// Serializable read-out of one processed group (a file, a player set or an
/// experimental condition).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<State>,
    pub links: Vec<Link>,
    pub trajectories: Vec<Trajectory>,
    /// Number of actor sessions folded into the graph.
    pub session_count: usize,
    pub group_label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trajectory_similarity: Vec<TrajectorySimilarity>,
}

/// Pairwise distance between two trajectories, by position in
/// [`GraphExport::trajectories`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajectorySimilarity {
    pub id: String,
    pub source: usize,
    pub target: usize,
    pub similarity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_omitted_when_empty() {
        let export = GraphExport {
            nodes: vec![State::start(), State::end()],
            links: vec![],
            trajectories: vec![],
            session_count: 0,
            group_label: "Competition1".into(),
            trajectory_similarity: vec![],
        };
        let json = serde_json::to_value(&export).unwrap();
        assert!(json.get("trajectory_similarity").is_none());
        assert_eq!(json["group_label"], "Competition1");
        assert_eq!(json["nodes"][0]["kind"], "start");
        assert_eq!(json["nodes"][1]["event_key"], "end");
    }
}
