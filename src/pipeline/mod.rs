//! The iteration loop and everything it needs around it.
//!
//! - `PipelineConfig`: TOML file plus `ALPHAZERO_*` overrides
//! - `CheckpointStore`: where checkpoints and example batches live
//! - `IterationController`: self-play, train, evaluate, promote or retry
//!
//! ```rust
//! use alphazero::games::TicTacToe;
//! use alphazero::mcts::MCTSConfig;
//! use alphazero::nn::TabularEvaluator;
//! use alphazero::pipeline::{IterationController, MemoryStore, PipelineConfig};
//!
//! let mut config = PipelineConfig::default();
//! config.total_iterations = 1;
//! config.set_search_budget(8, 1.0);
//! config.self_play.games_per_worker = 1;
//!
//! let game = TicTacToe::new();
//! let mut controller =
//!     IterationController::new(&game, TabularEvaluator::new(9), config, MemoryStore::new()).unwrap();
//! let report = controller.run().unwrap();
//! assert!(report.iterations[0].promoted);
//! ```

pub mod config;
pub mod controller;
pub mod store;

pub use config::{PipelineConfig, ENV_PREFIX};
pub use controller::{IterationController, IterationReport, IterationState, Phase, PipelineReport};
pub use store::{CheckpointStore, FileStore, MemoryStore};
