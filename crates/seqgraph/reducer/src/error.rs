use seqgraph_types::RowError;

/// Errors that stop a reduction.
#[derive(Debug, thiserror::Error)]
pub enum ReduceError {
    /// A row was too short and the policy is to abort.
    #[error("malformed row: {0}")]
    Row(#[from] RowError),
    #[error("actor {actor} has no rows in the log")]
    UnknownActor { actor: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_error_converts() {
        let e: ReduceError = RowError::Missing {
            line: 12,
            index: 4,
            len: 3,
        }
        .into();
        assert!(format!("{}", e).contains("line 12"));
        assert!(matches!(e, ReduceError::Row(_)));
    }

    #[test]
    fn unknown_actor_display() {
        let e = ReduceError::UnknownActor {
            actor: "z58lm8leyw".into(),
        };
        assert_eq!(format!("{}", e), "actor z58lm8leyw has no rows in the log");
    }
}
