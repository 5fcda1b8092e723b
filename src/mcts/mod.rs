//! Monte Carlo Tree Search guided by a policy-value evaluator.
//!
//! ## Overview
//!
//! - **PUCT selection**: `Q + c * P * sqrt(N) / (1 + n)`, ties to the lowest
//!   action index
//! - **Evaluator leaves**: no rollouts; leaf values come from `Evaluator::infer`
//!   or, at terminal positions, from the game outcome
//! - **Root noise**: optional Dirichlet mixing for self-play exploration
//! - **Arena-allocated tree**: `Vec<MCTSNode>` addressed by `NodeId`
//!
//! ## Usage
//!
//! ```rust
//! use alphazero::games::TicTacToe;
//! use alphazero::mcts::{MCTSConfig, MCTSSearch};
//! use alphazero::nn::UniformEvaluator;
//! use alphazero::rules::RulesEngine;
//!
//! let game = TicTacToe::new();
//! let evaluator = UniformEvaluator::new(game.action_space_size());
//! let mut search = MCTSSearch::new(MCTSConfig::for_arena(200));
//!
//! let result = search.search(&game, &game.initial_state(), &evaluator).unwrap();
//! assert_eq!(result.visit_counts.iter().sum::<u32>(), 200);
//! println!("Best action: {:?}", result.best_action());
//! ```

pub mod config;
pub mod node;
pub mod policy;
pub mod search;
pub mod stats;
pub mod tree;

// Re-export main types
pub use config::MCTSConfig;
pub use node::{Edge, MCTSNode, NodeId};
pub use policy::{masked_priors, visit_distribution, SelectionPolicy, PUCT};
pub use search::{MCTSSearch, SearchResult};
pub use stats::SearchStats;
pub use tree::{MCTSTree, TreeStats};
