//! Arena evaluation.
//!
//! Plays the incumbent against a candidate over a fixed number of games,
//! alternating the first move, and applies a `PromotionRule` to the
//! aggregated results. Losing a match is an ordinary `Verdict`, not an
//! error.
//!
//! ```rust
//! use alphazero::arena::{Arena, ArenaConfig, Contender};
//! use alphazero::games::TicTacToe;
//! use alphazero::mcts::MCTSConfig;
//! use alphazero::nn::UniformEvaluator;
//!
//! let game = TicTacToe::new();
//! let evaluator = UniformEvaluator::new(9);
//! let arena = Arena::new(ArenaConfig::default().with_mcts(MCTSConfig::for_arena(16)));
//!
//! let verdict = arena.evaluate(&game, &evaluator, &evaluator, 2).unwrap();
//! assert_eq!(verdict.accepted, Contender::Incumbent);
//! ```

pub mod evaluate;

pub use evaluate::{
    Arena, ArenaConfig, ArenaOutcome, ArenaResult, Contender, GameRecord, PromotionRule, Verdict,
};
