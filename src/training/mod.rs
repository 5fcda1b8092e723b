//! Self-play data generation.
//!
//! This module provides the data structures and self-play loop for
//! generating training data in an AlphaZero-style training pipeline.
//!
//! ## Overview
//!
//! - **Trajectory**: Records a complete game with states, policies, and outcome
//! - **TrainingExample**: `(state, policy, value)` with the value back-filled
//!   from the outcome
//! - **SelfPlayWorker**: Runs games using MCTS to generate trajectories
//! - **run_self_play**: Fork/join over workers with failure isolation
//!
//! ## Usage
//!
//! ```rust
//! use alphazero::games::TicTacToe;
//! use alphazero::mcts::MCTSConfig;
//! use alphazero::nn::UniformEvaluator;
//! use alphazero::training::{run_self_play, SelfPlayConfig};
//!
//! let game = TicTacToe::new();
//! let evaluator = UniformEvaluator::new(9);
//! let config = SelfPlayConfig::default()
//!     .with_mcts(MCTSConfig::for_self_play(16))
//!     .with_workers(2)
//!     .with_games_per_worker(1);
//!
//! let batch = run_self_play(&game, &evaluator, &config, 0).unwrap();
//! assert_eq!(batch.num_games(), 2);
//! let examples = batch.examples();
//! assert!(!examples.is_empty());
//! ```

pub mod self_play;
pub mod trajectory;

// Re-export main types
pub use self_play::{
    run_self_play, SelfPlayBatch, SelfPlayConfig, SelfPlayWorker, TemperatureSchedule, WorkerBatch,
};
pub use trajectory::{Step, Trajectory, TrainingExample};
