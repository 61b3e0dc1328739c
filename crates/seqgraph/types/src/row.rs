use crate::error::RowError;
use serde::{Deserialize, Serialize};

/// One decoded log line. Fields are positional; their meaning depends on the
/// event name and the configured column layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    /// 1-based source line, for diagnostics.
    pub line: u64,
    pub fields: Vec<String>,
}

impl EventRow {
    pub fn new(line: u64, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    /// Build a row from string slices. Mostly useful in tests.
    pub fn from_fields<I, S>(line: u64, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            line,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Like [`field`](Self::field) but a short row is an error.
    pub fn require(&self, index: usize) -> Result<&str, RowError> {
        self.field(index).ok_or(RowError::Missing {
            line: self.line,
            index,
            len: self.fields.len(),
        })
    }

    /// A success probability, e.g. `"0.8"`.
    pub fn require_f64(&self, index: usize) -> Result<f64, RowError> {
        let raw = self.require(index)?;
        raw.trim()
            .parse::<f64>()
            .map_err(|_| self.numeric(index, "number", raw))
    }

    /// A non-negative integer amount, e.g. found or total gold.
    pub fn require_u64(&self, index: usize) -> Result<u64, RowError> {
        let raw = self.require(index)?;
        raw.trim()
            .parse::<u64>()
            .map_err(|_| self.numeric(index, "amount", raw))
    }

    /// A `[floor, ceiling]` probability range written like `"(0.3 0.5)"`.
    ///
    /// Brackets are optional; values may be separated by spaces, commas or
    /// semicolons.
    pub fn require_range(&self, index: usize) -> Result<(f64, f64), RowError> {
        let raw = self.require(index)?;
        let values = split_numeric_pair(raw).ok_or_else(|| self.numeric(index, "range", raw))?;
        let floor = values.0.parse::<f64>();
        let ceiling = values.1.parse::<f64>();
        match (floor, ceiling) {
            (Ok(floor), Ok(ceiling)) => Ok((floor, ceiling)),
            _ => Err(self.numeric(index, "range", raw)),
        }
    }

    /// A grid position written like `"(12 40)"`.
    pub fn require_position(&self, index: usize) -> Result<(i64, i64), RowError> {
        let raw = self.require(index)?;
        let values =
            split_numeric_pair(raw).ok_or_else(|| self.numeric(index, "position", raw))?;
        match (values.0.parse::<i64>(), values.1.parse::<i64>()) {
            (Ok(x), Ok(y)) => Ok((x, y)),
            _ => Err(self.numeric(index, "position", raw)),
        }
    }

    fn numeric(&self, index: usize, expected: &'static str, raw: &str) -> RowError {
        RowError::Numeric {
            line: self.line,
            index,
            expected,
            value: raw.to_string(),
        }
    }
}

fn split_numeric_pair(raw: &str) -> Option<(&str, &str)> {
    let inner = raw.trim().trim_matches(|c: char| matches!(c, '(' | ')' | '[' | ']'));
    let mut parts = inner
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|p| !p.is_empty());
    let first = parts.next()?;
    let second = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((first, second))
}
