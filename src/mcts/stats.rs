//! MCTS search statistics for diagnostics and tuning.

use serde::{Deserialize, Serialize};

/// Statistics collected during MCTS search.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Simulations performed (equals the budget after a search).
    pub simulations: u32,

    /// Nodes expanded (root included).
    pub nodes_expanded: u32,

    /// Calls to `Evaluator::infer`.
    pub evaluator_calls: u32,

    /// Simulations that ended on a terminal position.
    pub terminal_hits: u32,

    /// Maximum depth reached during search.
    pub max_depth: u16,

    /// Total time spent searching (microseconds).
    pub time_us: u64,
}

impl SearchStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all statistics to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Accumulate another search's statistics into this one.
    pub fn merge(&mut self, other: &SearchStats) {
        self.simulations += other.simulations;
        self.nodes_expanded += other.nodes_expanded;
        self.evaluator_calls += other.evaluator_calls;
        self.terminal_hits += other.terminal_hits;
        self.max_depth = self.max_depth.max(other.max_depth);
        self.time_us += other.time_us;
    }

    /// Calculate simulations per second.
    #[must_use]
    pub fn simulations_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.simulations as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }

    /// Fraction of simulations that hit a terminal position.
    #[must_use]
    pub fn terminal_ratio(&self) -> f64 {
        if self.simulations == 0 {
            0.0
        } else {
            self.terminal_hits as f64 / self.simulations as f64
        }
    }
}
