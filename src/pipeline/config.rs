//! Pipeline configuration.
//!
//! Values come from (highest priority first) command-line flags, `ALPHAZERO_*`
//! environment variables, a TOML file, and built-in defaults. This module
//! covers the last three; the binary layers its flags on top.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::arena::{ArenaConfig, PromotionRule};
use crate::error::ConfigError;
use crate::nn::TrainingConfig;
use crate::training::SelfPlayConfig;

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "ALPHAZERO_";

/// Everything the iteration controller needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name of the game to train (`connect4` or `tictactoe`).
    pub game: String,

    /// First iteration to run; a checkpoint for it is loaded if present.
    pub start_iteration: u32,

    /// Loop stops when the iteration index reaches this value.
    pub total_iterations: u32,

    /// Retries per iteration before keeping the incumbent and moving on.
    /// `None` retries until the candidate is promoted.
    pub max_retries: Option<u32>,

    /// Directory for checkpoints and example batches.
    pub data_dir: PathBuf,

    /// Self-play settings.
    pub self_play: SelfPlayConfig,

    /// Hyperparameters passed to `Evaluator::train`.
    pub training: TrainingConfig,

    /// Arena settings.
    pub arena: ArenaConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            game: "connect4".to_string(),
            start_iteration: 0,
            total_iterations: 2,
            max_retries: Some(20),
            data_dir: PathBuf::from("data"),
            self_play: SelfPlayConfig::default(),
            training: TrainingConfig::default(),
            arena: ArenaConfig::default(),
        }
    }
}

/// Parse one override into `$target`, failing on malformed values.
macro_rules! env_override {
    ($lookup:expr, $target:expr, $key:literal) => {
        if let Some(raw) = $lookup(concat!("ALPHAZERO_", $key)) {
            $target = raw.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                key: concat!("ALPHAZERO_", $key).to_string(),
                value: raw.clone(),
            })?;
        }
    };
}

impl PipelineConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded pipeline config");
        Self::from_toml_str(&content)
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Apply `ALPHAZERO_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Recognised keys (after the `ALPHAZERO_` prefix): `GAME`,
    /// `START_ITERATION`, `TOTAL_ITERATIONS`, `MAX_RETRIES` (a number or
    /// `none`), `DATA_DIR`, `NUM_WORKERS`, `GAMES_PER_WORKER`, `SIMULATIONS`,
    /// `C_PUCT`, `TEMPERATURE`, `TEMPERATURE_THRESHOLD`, `ARENA_GAMES`,
    /// `PROMOTION_WIN_RATE`, `BATCH_SIZE`, `EPOCHS`, `LEARNING_RATE`,
    /// `GRAD_ACC_STEPS`, `MAX_GRAD_NORM`.
    pub fn apply_overrides_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        env_override!(lookup, self.game, "GAME");
        env_override!(lookup, self.start_iteration, "START_ITERATION");
        env_override!(lookup, self.total_iterations, "TOTAL_ITERATIONS");
        env_override!(lookup, self.data_dir, "DATA_DIR");

        if let Some(raw) = lookup("ALPHAZERO_MAX_RETRIES") {
            self.max_retries = parse_retry_cap(&raw).ok_or_else(|| ConfigError::InvalidOverride {
                key: "ALPHAZERO_MAX_RETRIES".to_string(),
                value: raw.clone(),
            })?;
        }

        env_override!(lookup, self.self_play.num_workers, "NUM_WORKERS");
        env_override!(lookup, self.self_play.games_per_worker, "GAMES_PER_WORKER");
        env_override!(lookup, self.self_play.schedule.initial, "TEMPERATURE");
        env_override!(lookup, self.self_play.schedule.threshold_ply, "TEMPERATURE_THRESHOLD");

        let mut simulations = self.self_play.mcts.simulations;
        env_override!(lookup, simulations, "SIMULATIONS");
        let mut c_puct = self.self_play.mcts.c_puct;
        env_override!(lookup, c_puct, "C_PUCT");
        self.set_search_budget(simulations, c_puct);

        env_override!(lookup, self.arena.num_games, "ARENA_GAMES");
        if let Some(raw) = lookup("ALPHAZERO_PROMOTION_WIN_RATE") {
            let threshold: f64 = raw.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                key: "ALPHAZERO_PROMOTION_WIN_RATE".to_string(),
                value: raw.clone(),
            })?;
            self.arena.promotion = PromotionRule::WinRateAbove(threshold);
        }

        env_override!(lookup, self.training.batch_size, "BATCH_SIZE");
        env_override!(lookup, self.training.epochs, "EPOCHS");
        env_override!(lookup, self.training.learning_rate, "LEARNING_RATE");
        env_override!(lookup, self.training.gradient_accumulation_steps, "GRAD_ACC_STEPS");
        env_override!(lookup, self.training.max_grad_norm, "MAX_GRAD_NORM");

        debug!(?self, "Applied environment overrides");
        Ok(())
    }

    /// Use the same simulation budget and exploration constant for
    /// self-play and arena searches.
    pub fn set_search_budget(&mut self, simulations: u32, c_puct: f64) {
        self.self_play.mcts.simulations = simulations;
        self.self_play.mcts.c_puct = c_puct;
        self.arena.mcts.simulations = simulations;
        self.arena.mcts.c_puct = c_puct;
    }

    /// Reject configurations the controller cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.start_iteration > self.total_iterations {
            return invalid(format!(
                "start_iteration {} exceeds total_iterations {}",
                self.start_iteration, self.total_iterations
            ));
        }
        if self.self_play.num_workers == 0 {
            return invalid("self_play.num_workers must be positive".to_string());
        }
        if self.self_play.games_per_worker == 0 {
            return invalid("self_play.games_per_worker must be positive".to_string());
        }
        for (section, mcts) in [("self_play", &self.self_play.mcts), ("arena", &self.arena.mcts)] {
            if mcts.simulations == 0 {
                return invalid(format!("{section}.mcts.simulations must be positive"));
            }
            if !(mcts.c_puct.is_finite() && mcts.c_puct > 0.0) {
                return invalid(format!("{section}.mcts.c_puct must be positive, got {}", mcts.c_puct));
            }
            if !(mcts.dirichlet_alpha.is_finite() && mcts.dirichlet_alpha >= 0.0) {
                return invalid(format!(
                    "{section}.mcts.dirichlet_alpha must be finite and non-negative, got {}",
                    mcts.dirichlet_alpha
                ));
            }
            if !(0.0..=1.0).contains(&mcts.dirichlet_epsilon) {
                return invalid(format!(
                    "{section}.mcts.dirichlet_epsilon must be in [0, 1], got {}",
                    mcts.dirichlet_epsilon
                ));
            }
        }
        if self.arena.num_games == 0 {
            return invalid("arena.num_games must be positive".to_string());
        }
        if let PromotionRule::WinRateAbove(t) = self.arena.promotion {
            if !(0.5..1.0).contains(&t) {
                return invalid(format!("promotion win rate must be in [0.5, 1), got {t}"));
            }
        }
        if self.training.batch_size == 0 || self.training.gradient_accumulation_steps == 0 {
            return invalid("training batch_size and gradient_accumulation_steps must be positive".to_string());
        }
        Ok(())
    }
}

fn parse_retry_cap(raw: &str) -> Option<Option<u32>> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "none" | "unbounded" => Some(None),
        other => other.parse().ok().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_follow_reference_run() {
        let config = PipelineConfig::default();
        assert_eq!(config.start_iteration, 0);
        assert_eq!(config.total_iterations, 2);
        assert_eq!(config.self_play.num_workers, 1);
        assert_eq!(config.self_play.games_per_worker, 2);
        assert_eq!(config.training.batch_size, 32);
        assert_eq!(config.training.epochs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = PipelineConfig::from_toml_str(
            r#"
            game = "tictactoe"
            total_iterations = 5
            max_retries = 3

            [self_play]
            num_workers = 4

            [self_play.mcts]
            simulations = 64

            [arena]
            num_games = 10
            promotion = { win_rate_above = 0.55 }
            "#,
        )
        .unwrap();

        assert_eq!(config.game, "tictactoe");
        assert_eq!(config.total_iterations, 5);
        assert_eq!(config.max_retries, Some(3));
        assert_eq!(config.self_play.num_workers, 4);
        assert_eq!(config.self_play.games_per_worker, 2);
        assert_eq!(config.self_play.mcts.simulations, 64);
        assert_eq!(config.arena.num_games, 10);
        assert_eq!(config.arena.promotion, PromotionRule::WinRateAbove(0.55));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PipelineConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed = PipelineConfig::from_toml_str(&text).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = PipelineConfig::from_toml_str("total_iterations = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = PipelineConfig::default();
        config
            .apply_overrides_with(lookup(&[
                ("ALPHAZERO_TOTAL_ITERATIONS", "7"),
                ("ALPHAZERO_NUM_WORKERS", "3"),
                ("ALPHAZERO_SIMULATIONS", "25"),
                ("ALPHAZERO_LEARNING_RATE", "0.01"),
                ("ALPHAZERO_MAX_RETRIES", "none"),
                ("ALPHAZERO_DATA_DIR", "/tmp/az"),
            ]))
            .unwrap();

        assert_eq!(config.total_iterations, 7);
        assert_eq!(config.self_play.num_workers, 3);
        assert_eq!(config.self_play.mcts.simulations, 25);
        assert_eq!(config.arena.mcts.simulations, 25);
        assert_eq!(config.training.learning_rate, 0.01);
        assert_eq!(config.max_retries, None);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/az"));
    }

    #[test]
    fn test_malformed_override_is_rejected() {
        let mut config = PipelineConfig::default();
        let err = config
            .apply_overrides_with(lookup(&[("ALPHAZERO_EPOCHS", "lots")]))
            .unwrap_err();

        match err {
            ConfigError::InvalidOverride { key, value } => {
                assert_eq!(key, "ALPHAZERO_EPOCHS");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.self_play.num_workers = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.arena.promotion = PromotionRule::WinRateAbove(0.4);
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.start_iteration = 3;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.set_search_budget(0, 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_checks_search_noise_and_arena_c_puct() {
        let mut config = PipelineConfig::default();
        config.self_play.mcts.dirichlet_alpha = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.self_play.mcts.dirichlet_alpha = -0.3;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.self_play.mcts.dirichlet_epsilon = 1.5;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.arena.mcts.c_puct = 0.0;
        assert!(config.validate().is_err());

        // Zero noise is how the arena disables it.
        let mut config = PipelineConfig::default();
        config.self_play.mcts = config.self_play.mcts.without_noise();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_retry_cap() {
        assert_eq!(parse_retry_cap("5"), Some(Some(5)));
        assert_eq!(parse_retry_cap("None"), Some(None));
        assert_eq!(parse_retry_cap("-1"), None);
    }
}
