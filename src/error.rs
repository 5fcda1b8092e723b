//! Error types for the pipeline.
//!
//! Contract violations (`GameError`, `SearchError::InvalidBudget`,
//! `SearchError::NoLegalActions`) indicate a bug in the caller or the game
//! and are never retried. `EvaluatorError::TrainingFailed` is fatal to the
//! iteration that hit it. Losing an arena match is not an error.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::Action;

/// Errors raised by a `RulesEngine`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// The action is not in `legal_actions`; `legal` is empty once the game
    /// is over.
    #[error("illegal action {action} in position with legal actions {legal:?}")]
    IllegalAction { action: Action, legal: Vec<Action> },
}

/// Errors raised by an `Evaluator`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluatorError {
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("training failed: {0}")]
    TrainingFailed(String),

    #[error("evaluator returned {got} priors, expected {expected}")]
    PolicyShape { expected: usize, got: usize },
}

/// Errors raised by a single MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search invoked on a terminal position: no legal actions")]
    NoLegalActions,

    #[error("simulation budget must be positive, got {0}")]
    InvalidBudget(u32),

    #[error("evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("game error: {0}")]
    Game(#[from] GameError),
}

/// Errors raised while generating self-play games.
#[derive(Debug, Error)]
pub enum SelfPlayError {
    #[error("search failed at ply {ply} of game {game_index}: {source}")]
    Search {
        game_index: u64,
        ply: usize,
        #[source]
        source: SearchError,
    },

    #[error("game error in game {game_index}: {source}")]
    Game {
        game_index: u64,
        #[source]
        source: GameError,
    },

    #[error("self-play worker {worker} panicked: {message}")]
    WorkerPanicked { worker: usize, message: String },

    #[error("all {workers} self-play workers failed")]
    AllWorkersFailed { workers: usize },
}

/// Errors raised while playing arena matches.
#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("arena needs at least one game")]
    NoGames,

    #[error("search failed in arena game {game_index}: {source}")]
    Search {
        game_index: u32,
        #[source]
        source: SearchError,
    },

    #[error("game error in arena game {game_index}: {source}")]
    Game {
        game_index: u32,
        #[source]
        source: GameError,
    },
}

/// Errors raised by checkpoint and example stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode or decode {path}: {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("no checkpoint stored for iteration {0}")]
    MissingCheckpoint(u32),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidOverride { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that stop the iteration controller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("self-play failed in iteration {iteration}: {source}")]
    SelfPlay {
        iteration: u32,
        #[source]
        source: SelfPlayError,
    },

    #[error("training failed in iteration {iteration}: {source}")]
    Training {
        iteration: u32,
        #[source]
        source: EvaluatorError,
    },

    #[error("arena failed in iteration {iteration}: {source}")]
    Arena {
        iteration: u32,
        #[source]
        source: ArenaError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias for pipeline-level results.
pub type Result<T> = std::result::Result<T, PipelineError>;
