//! Rules engine trait for game implementations.
//!
//! Games implement `RulesEngine` to define:
//! - Legal actions for each game state
//! - How actions produce successor states
//! - Win/draw conditions
//! - The fixed-shape encoding fed to evaluators
//!
//! The search never interprets game-specific concepts directly.

pub mod engine;

pub use engine::{GameResult, RulesEngine};
