//! Rules engine trait for game implementations.
//!
//! Games implement `RulesEngine` to define their rules:
//! - What actions are legal
//! - How actions produce successor states
//! - Win/draw conditions and the network input encoding

use serde::{Deserialize, Serialize};

use crate::core::{Action, PlayerId};
use crate::error::GameError;
use crate::nn::EncodedState;

/// Result of a completed game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// Single winner.
    Winner(PlayerId),
    /// Draw (no winner).
    Draw,
}

impl GameResult {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        matches!(self, GameResult::Winner(p) if *p == player)
    }

    /// Outcome value from `player`'s perspective: +1 win, -1 loss, 0 draw.
    #[must_use]
    pub fn value_for(&self, player: PlayerId) -> f32 {
        match self {
            GameResult::Winner(winner) if *winner == player => 1.0,
            GameResult::Winner(_) => -1.0,
            GameResult::Draw => 0.0,
        }
    }
}

/// Rules engine trait.
///
/// The search and the pipeline only ever touch game states through these
/// methods.
///
/// ## Implementation Notes
///
/// - `legal_actions`: empty if and only if the state is terminal
/// - `apply`: must reject actions not in `legal_actions`
/// - `outcome`: `Some` if and only if the state is terminal
/// - `encode`: pure function of the state, same shape for every state
pub trait RulesEngine: Send + Sync {
    /// Game position. Cloned once per ply and once per simulation step.
    type State: Clone + Send + Sync + std::fmt::Debug;

    /// Short name used in logs and file names.
    fn name(&self) -> &'static str;

    /// The starting position.
    fn initial_state(&self) -> Self::State;

    /// Number of distinct actions; the length of every policy vector.
    fn action_space_size(&self) -> usize;

    /// Shape of `encode` output.
    fn encoded_shape(&self) -> Vec<usize>;

    /// Legal actions in ascending index order.
    fn legal_actions(&self, state: &Self::State) -> Vec<Action>;

    /// Produce the successor state.
    ///
    /// Fails with `GameError::IllegalAction` if `action` is not legal.
    fn apply(&self, state: &Self::State, action: Action) -> Result<Self::State, GameError>;

    /// Check if the game is over.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Final result; `None` while the game continues.
    fn outcome(&self, state: &Self::State) -> Option<GameResult>;

    /// The player to move.
    fn current_player(&self, state: &Self::State) -> PlayerId;

    /// Number of moves played to reach this state.
    fn move_count(&self, state: &Self::State) -> usize;

    /// Fixed-shape network input for this state.
    fn encode(&self, state: &Self::State) -> EncodedState;
}
