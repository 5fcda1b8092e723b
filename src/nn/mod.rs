//! Evaluator integration.
//!
//! The pipeline treats the learned component as an opaque `Evaluator` with
//! two operations: `infer` and `train`.
//!
//! ## Overview
//!
//! - **Traits**: `Evaluator`, plus the `EncodedState` input and `Inference`
//!   output types
//! - **Hyperparameters**: `TrainingConfig`, passed through to `train`
//! - **Baselines**: `UniformEvaluator` (untrainable) and `TabularEvaluator`
//!   (trainable lookup table)
//!
//! ## Usage
//!
//! ```
//! use alphazero::games::TicTacToe;
//! use alphazero::nn::{Evaluator, UniformEvaluator};
//! use alphazero::rules::RulesEngine;
//!
//! let game = TicTacToe::new();
//! let evaluator = UniformEvaluator::new(game.action_space_size());
//!
//! let encoded = game.encode(&game.initial_state());
//! let out = evaluator.infer(&encoded).unwrap();
//! assert_eq!(out.policy.len(), 9);
//! ```

pub mod tabular;
pub mod traits;

pub use tabular::TabularEvaluator;
pub use traits::{EncodedState, Evaluator, Inference, TrainingConfig, UniformEvaluator};
