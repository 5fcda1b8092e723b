//! # alphazero
//!
//! An AlphaZero-style training pipeline for two-player, perfect-information,
//! turn-based games.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: Search, self-play and arena code only talk to a
//!    game through `RulesEngine`. Connect Four and Tic-Tac-Toe ship as
//!    reference games.
//!
//! 2. **Evaluator as a Seam**: Anything that can `infer` priors and a value
//!    and `train` a successor can drive the loop, whether a Rust lookup
//!    table or a Python network.
//!
//! 3. **Deterministic Runs**: Every game is seeded from its index, so a
//!    batch replays exactly given the same evaluator.
//!
//! ## Architecture
//!
//! - **Arena Tree**: MCTS nodes live in a `Vec` and refer to each other by
//!   `NodeId`, with an explicit action-to-child edge list.
//!
//! - **Fork/Join Self-Play**: Workers run in parallel with their own trees
//!   and share the evaluator read-only.
//!
//! - **Explicit Incumbent**: The controller owns the best evaluator and
//!   replaces it only on promotion.
//!
//! ## Modules
//!
//! - `core`: Players, actions, seeded RNG
//! - `rules`: `RulesEngine` trait and game results
//! - `games`: Connect Four and Tic-Tac-Toe
//! - `nn`: `Evaluator` trait, encoded states, reference evaluators
//! - `mcts`: PUCT tree search
//! - `training`: Self-play workers and training examples
//! - `arena`: Candidate vs incumbent matches and promotion
//! - `pipeline`: Configuration, persistence and the iteration loop
//! - `error`: Error types for every stage

pub mod core;
pub mod error;
pub mod rules;
pub mod games;
pub mod nn;
pub mod mcts;
pub mod training;
pub mod arena;
pub mod pipeline;

#[cfg(feature = "python")]
pub mod python;

// Re-export commonly used types
pub use crate::core::{Action, GameRng, PlayerId};

pub use crate::error::{
    ArenaError, ConfigError, EvaluatorError, GameError, PipelineError, SearchError,
    SelfPlayError, StoreError,
};

pub use crate::rules::{GameResult, RulesEngine};

pub use crate::nn::{
    EncodedState, Evaluator, Inference, TabularEvaluator, TrainingConfig, UniformEvaluator,
};

pub use crate::mcts::{MCTSConfig, MCTSSearch, SearchResult, SearchStats};

pub use crate::training::{
    run_self_play, SelfPlayBatch, SelfPlayConfig, TemperatureSchedule, TrainingExample, Trajectory,
};

pub use crate::arena::{Arena, ArenaConfig, ArenaResult, Contender, PromotionRule, Verdict};

pub use crate::pipeline::{
    CheckpointStore, FileStore, IterationController, MemoryStore, PipelineConfig, PipelineReport,
};
