use std::collections::HashMap;

/// Mining tools and mines announced during a session's setup.
#[derive(Clone, Debug, Default)]
pub struct ItemRegistry {
    tools: HashMap<String, f64>,
    /// `[floor, ceiling]` success probability.
    mines: HashMap<String, (f64, f64)>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_tool(&mut self, name: impl Into<String>, probability: f64) {
        self.tools.insert(name.into(), probability);
    }

    pub fn register_mine(&mut self, name: impl Into<String>, floor: f64, ceiling: f64) {
        self.mines.insert(name.into(), (floor, ceiling));
    }

    pub fn tool_probability(&self, name: &str) -> Option<f64> {
        self.tools.get(name).copied()
    }

    pub fn mine_range(&self, name: &str) -> Option<(f64, f64)> {
        self.mines.get(name).copied()
    }

    /// Effective success probability: a mine counts with its floor.
    pub fn probability(&self, name: &str) -> Option<f64> {
        self.mine_range(name)
            .map(|(floor, _)| floor)
            .or_else(|| self.tool_probability(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name) || self.mines.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty() && self.mines.is_empty()
    }

    pub fn clear(&mut self) {
        self.tools.clear();
        self.mines.clear();
    }
}
