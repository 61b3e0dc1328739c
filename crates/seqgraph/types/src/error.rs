/// Errors raised while reading typed values out of an [`EventRow`](crate::EventRow).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    #[error("line {line}: field {index} missing (row has {len} fields)")]
    Missing { line: u64, index: usize, len: usize },
    #[error("line {line}: field {index} is not a valid {expected}: {value:?}")]
    Numeric {
        line: u64,
        index: usize,
        expected: &'static str,
        value: String,
    },
}

impl RowError {
    /// Source line of the offending row.
    pub fn line(&self) -> u64 {
        match self {
            Self::Missing { line, .. } | Self::Numeric { line, .. } => *line,
        }
    }

    /// Malformed rows are too short; numeric errors carry bad text.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}
