//! Trajectories and training examples.
//!
//! A trajectory records a complete self-play game, capturing:
//! - Encoded states at each decision point
//! - Search distributions (the "target" policy)
//! - Actions actually taken
//! - Final game outcome for value targets
//!
//! Value targets are only known once the game ends, so they are back-filled
//! when a trajectory is converted into `TrainingExample`s.

use serde::{Deserialize, Serialize};

use crate::core::{Action, PlayerId};
use crate::nn::EncodedState;
use crate::rules::GameResult;

/// One supervised training example.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Encoded position.
    pub state: EncodedState,

    /// Search distribution over the full action space at this position.
    pub policy: Vec<f32>,

    /// Game outcome from the perspective of the player to move in `state`:
    /// +1 win, -1 loss, 0 draw.
    pub value: f32,
}

/// A single step in a trajectory.
///
/// Captures the state, search policy, and action taken at one decision point.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Step {
    /// Encoded game state.
    pub encoded_state: EncodedState,

    /// Search distribution (target for the policy head).
    pub policy: Vec<f32>,

    /// The action that was actually taken.
    pub action_taken: Action,

    /// The player who made this decision.
    pub player: PlayerId,

    /// Move number in the game (0-indexed).
    pub move_number: usize,
}

impl Step {
    /// Get the probability assigned to the taken action.
    #[must_use]
    pub fn taken_action_prob(&self) -> f32 {
        self.policy
            .get(self.action_taken.index())
            .copied()
            .unwrap_or(0.0)
    }
}

/// A complete game trajectory from self-play.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trajectory {
    /// All steps in the game.
    pub steps: Vec<Step>,

    /// Final result; `None` until the game ends.
    pub outcome: Option<GameResult>,

    /// Global index of this game (start offset included).
    pub game_index: u64,

    /// Random seed used for this game.
    pub seed: u64,

    /// Set when the game hit the move cap and was scored as a draw.
    pub abandoned: bool,
}

impl Trajectory {
    /// Create a new trajectory.
    pub fn new(game_index: u64, seed: u64) -> Self {
        Self {
            steps: Vec::new(),
            outcome: None,
            game_index,
            seed,
            abandoned: false,
        }
    }

    /// Add a step to the trajectory.
    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Set the final outcome.
    pub fn set_outcome(&mut self, outcome: GameResult) {
        self.outcome = Some(outcome);
    }

    /// Get the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if trajectory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Convert to training examples, back-filling the value of every step
    /// from the final outcome.
    ///
    /// A trajectory without an outcome labels every step as a draw.
    pub fn to_training_examples(&self) -> Vec<TrainingExample> {
        let outcome = self.outcome.unwrap_or(GameResult::Draw);
        self.steps
            .iter()
            .map(|step| TrainingExample {
                state: step.encoded_state.clone(),
                policy: step.policy.clone(),
                value: outcome.value_for(step.player),
            })
            .collect()
    }
}
