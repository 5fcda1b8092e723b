//! MCTS configuration parameters.

use serde::{Deserialize, Serialize};

/// MCTS configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MCTSConfig {
    /// Simulations per search (must be positive).
    /// Root expansion happens before the budget is spent.
    pub simulations: u32,

    /// PUCT exploration constant.
    /// Higher values trust the priors longer before values dominate.
    pub c_puct: f64,

    /// Dirichlet concentration for root noise (0 disables noise).
    pub dirichlet_alpha: f32,

    /// Weight of the noise in the mixed root prior (0 disables noise).
    pub dirichlet_epsilon: f32,

    /// Temperature applied to root visit counts when building the returned
    /// distribution (0 = greedy).
    pub temperature: f64,

    /// Random seed for root noise.
    /// Same seed produces deterministic searches.
    pub seed: u64,
}

impl Default for MCTSConfig {
    fn default() -> Self {
        Self {
            simulations: 100,
            c_puct: 1.0,
            dirichlet_alpha: 0.3,
            dirichlet_epsilon: 0.25,
            temperature: 1.0,
            seed: 42,
        }
    }
}

impl MCTSConfig {
    /// Self-play settings: root noise on, temperature driven by the schedule.
    pub fn for_self_play(simulations: u32) -> Self {
        Self {
            simulations,
            ..Self::default()
        }
    }

    /// Arena settings: no noise, greedy move choice.
    pub fn for_arena(simulations: u32) -> Self {
        Self {
            simulations,
            dirichlet_alpha: 0.0,
            dirichlet_epsilon: 0.0,
            temperature: 0.0,
            ..Self::default()
        }
    }

    /// Small deterministic settings for unit tests.
    pub fn for_testing() -> Self {
        Self {
            simulations: 16,
            dirichlet_alpha: 0.0,
            dirichlet_epsilon: 0.0,
            temperature: 1.0,
            ..Self::default()
        }
    }

    /// Whether root priors are mixed with Dirichlet noise.
    #[must_use]
    pub fn add_noise(&self) -> bool {
        self.dirichlet_alpha.is_finite() && self.dirichlet_alpha > 0.0 && self.dirichlet_epsilon > 0.0
    }

    /// Set the simulation budget.
    pub fn with_simulations(mut self, simulations: u32) -> Self {
        self.simulations = simulations;
        self
    }

    /// Set the PUCT exploration constant.
    pub fn with_c_puct(mut self, c: f64) -> Self {
        self.c_puct = c;
        self
    }

    /// Set root noise parameters.
    pub fn with_dirichlet(mut self, alpha: f32, epsilon: f32) -> Self {
        self.dirichlet_alpha = alpha;
        self.dirichlet_epsilon = epsilon;
        self
    }

    /// Disable root noise.
    pub fn without_noise(self) -> Self {
        self.with_dirichlet(0.0, 0.0)
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MCTSConfig::default();
        assert_eq!(config.simulations, 100);
        assert_eq!(config.c_puct, 1.0);
        assert_eq!(config.seed, 42);
        assert!(config.add_noise());
    }

    #[test]
    fn test_presets() {
        let arena = MCTSConfig::for_arena(50);
        assert_eq!(arena.simulations, 50);
        assert!(!arena.add_noise());
        assert_eq!(arena.temperature, 0.0);

        let self_play = MCTSConfig::for_self_play(200);
        assert_eq!(self_play.simulations, 200);
        assert!(self_play.add_noise());

        assert!(!MCTSConfig::for_testing().add_noise());
    }

    #[test]
    fn test_noise_needs_both_parameters() {
        assert!(!MCTSConfig::default().with_dirichlet(0.3, 0.0).add_noise());
        assert!(!MCTSConfig::default().with_dirichlet(0.0, 0.25).add_noise());
        assert!(!MCTSConfig::default().without_noise().add_noise());
    }

    #[test]
    fn test_builder_pattern() {
        let config = MCTSConfig::default()
            .with_simulations(8)
            .with_c_puct(2.0)
            .with_seed(123)
            .with_temperature(0.5);

        assert_eq!(config.simulations, 8);
        assert_eq!(config.c_puct, 2.0);
        assert_eq!(config.seed, 123);
        assert_eq!(config.temperature, 0.5);
    }

    #[test]
    fn test_serialization() {
        let config = MCTSConfig::default().with_seed(7);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: MCTSConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
