//! Small games and evaluators shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alphazero::core::{Action, PlayerId};
use alphazero::error::{EvaluatorError, GameError};
use alphazero::nn::{EncodedState, Evaluator, Inference, TrainingConfig};
use alphazero::rules::{GameResult, RulesEngine};
use alphazero::training::TrainingExample;

// =============================================================================
// Pick: one move decides the game
// =============================================================================

/// The first player picks action 0 (and wins) or action 1 (and loses).
pub struct Pick;

#[derive(Clone, Debug)]
pub struct PickState {
    pub winner: Option<PlayerId>,
}

impl RulesEngine for Pick {
    type State = PickState;

    fn name(&self) -> &'static str {
        "pick"
    }

    fn initial_state(&self) -> PickState {
        PickState { winner: None }
    }

    fn action_space_size(&self) -> usize {
        2
    }

    fn encoded_shape(&self) -> Vec<usize> {
        vec![1]
    }

    fn legal_actions(&self, state: &PickState) -> Vec<Action> {
        if state.winner.is_some() {
            Vec::new()
        } else {
            vec![Action::new(0), Action::new(1)]
        }
    }

    fn apply(&self, state: &PickState, action: Action) -> Result<PickState, GameError> {
        let legal = self.legal_actions(state);
        if !legal.contains(&action) {
            return Err(GameError::IllegalAction { action, legal });
        }
        let winner = if action.index() == 0 {
            PlayerId::FIRST
        } else {
            PlayerId::SECOND
        };
        Ok(PickState { winner: Some(winner) })
    }

    fn is_terminal(&self, state: &PickState) -> bool {
        state.winner.is_some()
    }

    fn outcome(&self, state: &PickState) -> Option<GameResult> {
        state.winner.map(GameResult::Winner)
    }

    fn current_player(&self, _state: &PickState) -> PlayerId {
        PlayerId::FIRST
    }

    fn move_count(&self, state: &PickState) -> usize {
        usize::from(state.winner.is_some())
    }

    fn encode(&self, state: &PickState) -> EncodedState {
        EncodedState::new(vec![f32::from(u8::from(state.winner.is_some()))], vec![1])
    }
}

// =============================================================================
// Handoff: the only move hands the win to the second player
// =============================================================================

/// One forced move, after which the second player has won.
pub struct Handoff;

impl RulesEngine for Handoff {
    type State = bool;

    fn name(&self) -> &'static str {
        "handoff"
    }

    fn initial_state(&self) -> bool {
        false
    }

    fn action_space_size(&self) -> usize {
        1
    }

    fn encoded_shape(&self) -> Vec<usize> {
        vec![1]
    }

    fn legal_actions(&self, done: &bool) -> Vec<Action> {
        if *done {
            Vec::new()
        } else {
            vec![Action::new(0)]
        }
    }

    fn apply(&self, done: &bool, action: Action) -> Result<bool, GameError> {
        let legal = self.legal_actions(done);
        if !legal.contains(&action) {
            return Err(GameError::IllegalAction { action, legal });
        }
        Ok(true)
    }

    fn is_terminal(&self, done: &bool) -> bool {
        *done
    }

    fn outcome(&self, done: &bool) -> Option<GameResult> {
        done.then_some(GameResult::Winner(PlayerId::SECOND))
    }

    fn current_player(&self, _done: &bool) -> PlayerId {
        PlayerId::FIRST
    }

    fn move_count(&self, done: &bool) -> usize {
        usize::from(*done)
    }

    fn encode(&self, done: &bool) -> EncodedState {
        EncodedState::new(vec![f32::from(u8::from(*done))], vec![1])
    }
}

// =============================================================================
// Evaluators
// =============================================================================

/// Fixed priors and zero value. `train` returns `trained_to`'s priors.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedPrior {
    pub policy: Vec<f32>,
    pub trained_to: Vec<f32>,
}

impl FixedPrior {
    pub fn new(policy: Vec<f32>) -> Self {
        Self {
            trained_to: policy.clone(),
            policy,
        }
    }

    /// Prefers `good` after training.
    pub fn improving(policy: Vec<f32>, good: Vec<f32>) -> Self {
        Self {
            policy,
            trained_to: good,
        }
    }
}

impl Evaluator for FixedPrior {
    fn infer(&self, _state: &EncodedState) -> Result<Inference, EvaluatorError> {
        Ok(Inference {
            policy: self.policy.clone(),
            value: 0.0,
        })
    }

    fn train(&self, _examples: &[TrainingExample], _config: &TrainingConfig) -> Result<Self, EvaluatorError> {
        Ok(Self::new(self.trained_to.clone()))
    }
}

/// Always fails `infer`.
#[derive(Clone, Debug)]
pub struct FailingEvaluator;

impl Evaluator for FailingEvaluator {
    fn infer(&self, _state: &EncodedState) -> Result<Inference, EvaluatorError> {
        Err(EvaluatorError::InferenceFailed("model offline".to_string()))
    }

    fn train(&self, _examples: &[TrainingExample], _config: &TrainingConfig) -> Result<Self, EvaluatorError> {
        Ok(FailingEvaluator)
    }
}

/// Uniform inference, failing `train`.
#[derive(Clone, Debug)]
pub struct UntrainableEvaluator {
    pub action_space_size: usize,
}

impl Evaluator for UntrainableEvaluator {
    fn infer(&self, _state: &EncodedState) -> Result<Inference, EvaluatorError> {
        Ok(Inference {
            policy: vec![1.0 / self.action_space_size as f32; self.action_space_size],
            value: 0.0,
        })
    }

    fn train(&self, _examples: &[TrainingExample], _config: &TrainingConfig) -> Result<Self, EvaluatorError> {
        Err(EvaluatorError::TrainingFailed("loss is NaN".to_string()))
    }
}

/// Fixed priors until trained twice. The call count is shared by every
/// evaluator trained from the same root, so a retry that retrains the
/// incumbent still sees the earlier attempt.
#[derive(Clone, Debug)]
pub struct SlowLearner {
    pub policy: Vec<f32>,
    pub good: Vec<f32>,
    pub trainings: Arc<AtomicUsize>,
}

impl SlowLearner {
    pub fn new(policy: Vec<f32>, good: Vec<f32>) -> Self {
        Self {
            policy,
            good,
            trainings: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Evaluator for SlowLearner {
    fn infer(&self, _state: &EncodedState) -> Result<Inference, EvaluatorError> {
        Ok(Inference {
            policy: self.policy.clone(),
            value: 0.0,
        })
    }

    fn train(&self, _examples: &[TrainingExample], _config: &TrainingConfig) -> Result<Self, EvaluatorError> {
        let policy = if self.trainings.fetch_add(1, Ordering::SeqCst) == 0 {
            self.policy.clone()
        } else {
            self.good.clone()
        };
        Ok(Self {
            policy,
            good: self.good.clone(),
            trainings: Arc::clone(&self.trainings),
        })
    }
}

/// Panics on its first `infer` call, uniform afterwards.
pub struct PanicOnce {
    pub action_space_size: usize,
    pub calls: AtomicUsize,
}

impl PanicOnce {
    pub fn new(action_space_size: usize) -> Self {
        Self {
            action_space_size,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Evaluator for PanicOnce {
    fn infer(&self, _state: &EncodedState) -> Result<Inference, EvaluatorError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("evaluator crashed");
        }
        Ok(Inference {
            policy: vec![1.0 / self.action_space_size as f32; self.action_space_size],
            value: 0.0,
        })
    }

    fn train(&self, _examples: &[TrainingExample], _config: &TrainingConfig) -> Result<Self, EvaluatorError> {
        Ok(Self::new(self.action_space_size))
    }
}
