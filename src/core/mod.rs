//! Core types shared by every game: players, actions and RNG.
//!
//! These are game-agnostic. Games express their rules through
//! `RulesEngine` and only ever hand these types back to the engine.

pub mod action;
pub mod player;
pub mod rng;

pub use action::Action;
pub use player::PlayerId;
pub use rng::GameRng;
