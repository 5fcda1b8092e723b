//! Self-play loop for generating training data.
//!
//! Runs games using MCTS guided by the current evaluator to generate
//! trajectories. Workers run in parallel on the rayon pool; each plays its
//! games sequentially with its own search tree, and the evaluator is shared
//! read-only.

use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::GameRng;
use crate::error::{SearchError, SelfPlayError};
use crate::mcts::{MCTSConfig, MCTSSearch, SearchStats};
use crate::nn::Evaluator;
use crate::rules::{GameResult, RulesEngine};

use super::trajectory::{Step, Trajectory, TrainingExample};

/// Move-temperature schedule.
///
/// Plies before `threshold_ply` use `initial`; later plies use
/// `final_temperature`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureSchedule {
    /// Temperature for the opening plies.
    pub initial: f64,

    /// First ply that uses `final_temperature`.
    pub threshold_ply: usize,

    /// Temperature for the rest of the game.
    pub final_temperature: f64,
}

impl Default for TemperatureSchedule {
    fn default() -> Self {
        Self {
            initial: 1.1,
            threshold_ply: 10,
            final_temperature: 0.1,
        }
    }
}

impl TemperatureSchedule {
    /// Constant temperature for the whole game.
    pub fn constant(temperature: f64) -> Self {
        Self {
            initial: temperature,
            threshold_ply: 0,
            final_temperature: temperature,
        }
    }

    /// Get the temperature for a given ply.
    #[must_use]
    pub fn temperature_at(&self, ply: usize) -> f64 {
        if ply < self.threshold_ply {
            self.initial
        } else {
            self.final_temperature
        }
    }
}

/// Configuration for self-play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfPlayConfig {
    /// Parallel workers.
    pub num_workers: usize,

    /// Games each worker plays per batch.
    pub games_per_worker: usize,

    /// Maximum plies per game; longer games are abandoned as draws.
    pub max_moves: usize,

    /// Move-temperature schedule.
    pub schedule: TemperatureSchedule,

    /// Search settings (root noise on).
    pub mcts: MCTSConfig,

    /// Seed offset for RNG (combined with game index for unique seeds).
    pub seed_offset: u64,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            num_workers: 1,
            games_per_worker: 2,
            max_moves: 512,
            schedule: TemperatureSchedule::default(),
            mcts: MCTSConfig::for_self_play(100),
            seed_offset: 0,
        }
    }
}

impl SelfPlayConfig {
    /// Create a new self-play config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.num_workers = workers;
        self
    }

    /// Set games per worker.
    pub fn with_games_per_worker(mut self, games: usize) -> Self {
        self.games_per_worker = games;
        self
    }

    /// Set maximum moves per game.
    pub fn with_max_moves(mut self, max: usize) -> Self {
        self.max_moves = max;
        self
    }

    /// Set the temperature schedule.
    pub fn with_schedule(mut self, schedule: TemperatureSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Set search settings.
    pub fn with_mcts(mut self, mcts: MCTSConfig) -> Self {
        self.mcts = mcts;
        self
    }

    /// Set seed offset.
    pub fn with_seed_offset(mut self, offset: u64) -> Self {
        self.seed_offset = offset;
        self
    }

    /// Games produced by one full batch.
    #[must_use]
    pub fn total_games(&self) -> usize {
        self.num_workers * self.games_per_worker
    }

    /// Global index of a worker's `game`-th game in the batch starting at
    /// `start_offset`.
    ///
    /// Batches start at multiples of `games_per_worker`, so indices never
    /// collide across batches or workers.
    #[must_use]
    pub fn game_index(&self, start_offset: u64, worker: usize, game: usize) -> u64 {
        (start_offset + game as u64) * self.num_workers.max(1) as u64 + worker as u64
    }
}

/// Worker for running self-play games.
///
/// Borrows the game, evaluator and configuration; owns nothing but the
/// per-game search state it creates.
pub struct SelfPlayWorker<'a, G: RulesEngine, V: Evaluator + ?Sized> {
    game: &'a G,
    evaluator: &'a V,
    config: &'a SelfPlayConfig,
}

impl<'a, G: RulesEngine, V: Evaluator + ?Sized> SelfPlayWorker<'a, G, V> {
    /// Create a new self-play worker.
    pub fn new(game: &'a G, evaluator: &'a V, config: &'a SelfPlayConfig) -> Self {
        Self {
            game,
            evaluator,
            config,
        }
    }

    /// Play one game from the initial position.
    ///
    /// The game's seed is `seed_offset + game_index`, so the same index
    /// always replays the same game.
    pub fn play_game(&self, game_index: u64) -> Result<Trajectory, SelfPlayError> {
        let seed = self.config.seed_offset.wrapping_add(game_index);
        let mut rng = GameRng::new(seed);
        let search_seed = rng.fork().seed();
        let mut search = MCTSSearch::new(self.config.mcts.clone().with_seed(search_seed));

        let mut trajectory = Trajectory::new(game_index, seed);
        let mut state = self.game.initial_state();
        let mut ply = 0usize;
        let mut game_stats = SearchStats::new();

        while !self.game.is_terminal(&state) {
            if ply >= self.config.max_moves {
                warn!(
                    game_index,
                    max_moves = self.config.max_moves,
                    "Self-play game hit the move cap, scoring as a draw"
                );
                trajectory.abandoned = true;
                break;
            }

            search.set_temperature(self.config.schedule.temperature_at(ply));
            let result = search
                .search(self.game, &state, self.evaluator)
                .map_err(|source| SelfPlayError::Search { game_index, ply, source })?;

            let action = result
                .sample_action(&mut rng)
                .ok_or(SelfPlayError::Search {
                    game_index,
                    ply,
                    source: SearchError::NoLegalActions,
                })?;
            game_stats.merge(&result.stats);

            trajectory.push(Step {
                encoded_state: self.game.encode(&state),
                policy: result.policy,
                action_taken: action,
                player: self.game.current_player(&state),
                move_number: ply,
            });

            state = self
                .game
                .apply(&state, action)
                .map_err(|source| SelfPlayError::Game { game_index, source })?;
            ply += 1;
        }

        let outcome = if trajectory.abandoned {
            GameResult::Draw
        } else {
            self.game.outcome(&state).unwrap_or(GameResult::Draw)
        };
        trajectory.set_outcome(outcome);

        debug!(
            game_index,
            plies = ply,
            ?outcome,
            simulations = game_stats.simulations,
            evaluator_calls = game_stats.evaluator_calls,
            sims_per_sec = game_stats.simulations_per_second(),
            "Self-play game finished"
        );
        Ok(trajectory)
    }

    /// Play this worker's share of the batch starting at `start_offset`.
    pub fn play_games(&self, worker: usize, start_offset: u64) -> Result<Vec<Trajectory>, SelfPlayError> {
        (0..self.config.games_per_worker)
            .map(|g| self.play_game(self.config.game_index(start_offset, worker, g)))
            .collect()
    }

    /// Get the configuration.
    pub fn config(&self) -> &SelfPlayConfig {
        self.config
    }
}

/// Games produced by one worker.
#[derive(Clone, Debug)]
pub struct WorkerBatch {
    /// Worker index.
    pub worker: usize,

    /// Finished games in play order.
    pub trajectories: Vec<Trajectory>,
}

impl WorkerBatch {
    /// Training examples from all of this worker's games.
    pub fn examples(&self) -> Vec<TrainingExample> {
        self.trajectories
            .iter()
            .flat_map(Trajectory::to_training_examples)
            .collect()
    }
}

/// Merged output of one parallel self-play stage.
#[derive(Clone, Debug)]
pub struct SelfPlayBatch {
    /// Offset this batch was generated at.
    pub start_offset: u64,

    /// Output of every worker that finished, in worker order.
    pub workers: Vec<WorkerBatch>,

    /// Workers whose output was discarded.
    pub failed_workers: Vec<usize>,
}

impl SelfPlayBatch {
    /// All training examples in worker order.
    pub fn examples(&self) -> Vec<TrainingExample> {
        self.workers.iter().flat_map(WorkerBatch::examples).collect()
    }

    /// Number of finished games.
    #[must_use]
    pub fn num_games(&self) -> usize {
        self.workers.iter().map(|w| w.trajectories.len()).sum()
    }

    /// Number of games abandoned at the move cap.
    #[must_use]
    pub fn num_abandoned(&self) -> usize {
        self.workers
            .iter()
            .flat_map(|w| w.trajectories.iter())
            .filter(|t| t.abandoned)
            .count()
    }
}

/// Run one self-play stage: `num_workers` workers in parallel, each playing
/// `games_per_worker` games.
///
/// A worker that returns an error or panics has its whole batch discarded;
/// the other workers' games are kept. Fails only if every worker fails.
pub fn run_self_play<G, V>(
    game: &G,
    evaluator: &V,
    config: &SelfPlayConfig,
    start_offset: u64,
) -> Result<SelfPlayBatch, SelfPlayError>
where
    G: RulesEngine,
    V: Evaluator + ?Sized,
{
    let worker = SelfPlayWorker::new(game, evaluator, config);

    let outcomes: Vec<(usize, Result<Vec<Trajectory>, SelfPlayError>)> = (0..config.num_workers)
        .into_par_iter()
        .map(|w| {
            let result = catch_unwind(AssertUnwindSafe(|| worker.play_games(w, start_offset)))
                .unwrap_or_else(|payload| {
                    Err(SelfPlayError::WorkerPanicked {
                        worker: w,
                        message: panic_message(payload.as_ref()),
                    })
                });
            (w, result)
        })
        .collect();

    let mut batch = SelfPlayBatch {
        start_offset,
        workers: Vec::with_capacity(config.num_workers),
        failed_workers: Vec::new(),
    };

    for (w, result) in outcomes {
        match result {
            Ok(trajectories) => batch.workers.push(WorkerBatch {
                worker: w,
                trajectories,
            }),
            Err(err) => {
                warn!(worker = w, error = %err, "Self-play worker failed, discarding its games");
                batch.failed_workers.push(w);
            }
        }
    }

    if batch.workers.is_empty() {
        return Err(SelfPlayError::AllWorkersFailed {
            workers: config.num_workers,
        });
    }

    info!(
        game = game.name(),
        start_offset,
        games = batch.num_games(),
        abandoned = batch.num_abandoned(),
        failed_workers = batch.failed_workers.len(),
        "Self-play batch complete"
    );

    Ok(batch)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
