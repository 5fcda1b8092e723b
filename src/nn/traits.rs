//! Evaluator traits for policy and value prediction.
//!
//! These traits define the interface between the search/pipeline core and
//! whatever learns the policy and value (a neural network, typically driven
//! from Python via PyO3).

use std::hash::Hasher;

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use crate::error::EvaluatorError;
use crate::training::TrainingExample;

/// Encoded game state as a flat tensor for evaluator input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedState {
    /// Flattened tensor data (row-major order).
    pub tensor: Vec<f32>,

    /// Shape of the tensor (e.g., [channels, height, width] or [features]).
    pub shape: Vec<usize>,
}

impl EncodedState {
    /// Create a new encoded state.
    pub fn new(tensor: Vec<f32>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(
            tensor.len(),
            shape.iter().product::<usize>(),
            "Tensor length must match shape product"
        );
        Self { tensor, shape }
    }

    /// Create a zero-filled encoded state with the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let size = shape.iter().product();
        Self {
            tensor: vec![0.0; size],
            shape,
        }
    }

    /// Get the total number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensor.len()
    }

    /// Check if the tensor is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensor.is_empty()
    }

    /// Get element at a flat index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.tensor.get(index).copied()
    }

    /// Set element at a flat index.
    pub fn set(&mut self, index: usize, value: f32) {
        if index < self.tensor.len() {
            self.tensor[index] = value;
        }
    }

    /// Hash of the exact bit pattern of the tensor and its shape.
    ///
    /// Encodings are pure functions of the state, so equal states always
    /// produce equal fingerprints.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        for &dim in &self.shape {
            hasher.write_usize(dim);
        }
        for &x in &self.tensor {
            hasher.write_u32(x.to_bits());
        }
        hasher.finish()
    }
}

/// Output of a single evaluator query.
#[derive(Clone, Debug, PartialEq)]
pub struct Inference {
    /// Prior probability per action, over the full action space.
    /// Illegal entries may be non-zero; the search masks them.
    pub policy: Vec<f32>,

    /// Value estimate in [-1, 1] for the player to move.
    pub value: f32,
}

/// Hyperparameters handed to `Evaluator::train`.
///
/// The core never interprets these; they travel opaquely from the
/// pipeline configuration to the evaluator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Examples per optimisation step.
    pub batch_size: usize,

    /// Passes over the example set.
    pub epochs: u32,

    /// Step size.
    pub learning_rate: f32,

    /// Batches whose updates are accumulated before applying them.
    pub gradient_accumulation_steps: u32,

    /// Updates with a larger L2 norm are scaled down to this norm.
    pub max_grad_norm: f32,

    /// Seed for mini-batch shuffling.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            epochs: 30,
            learning_rate: 0.001,
            gradient_accumulation_steps: 1,
            max_grad_norm: 1.0,
            seed: 0,
        }
    }
}

impl TrainingConfig {
    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the number of epochs.
    pub fn with_epochs(mut self, epochs: u32) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the learning rate.
    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set gradient accumulation steps.
    pub fn with_gradient_accumulation_steps(mut self, steps: u32) -> Self {
        self.gradient_accumulation_steps = steps;
        self
    }

    /// Set the gradient norm clip.
    pub fn with_max_grad_norm(mut self, norm: f32) -> Self {
        self.max_grad_norm = norm;
        self
    }
}

/// Policy-value evaluator: the learned component of the pipeline.
///
/// `infer` must be deterministic for fixed parameters and input. `train`
/// never mutates `self`; it returns a new evaluator, so the incumbent stays
/// usable while the candidate is judged.
pub trait Evaluator: Send + Sync {
    /// Predict priors and value for an encoded state.
    fn infer(&self, encoded: &EncodedState) -> Result<Inference, EvaluatorError>;

    /// Produce a new evaluator fitted to `examples`, starting from `self`.
    fn train(
        &self,
        examples: &[TrainingExample],
        config: &TrainingConfig,
    ) -> Result<Self, EvaluatorError>
    where
        Self: Sized;
}

/// Uniform priors and a neutral value (baseline for testing).
///
/// Training returns an identical evaluator.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UniformEvaluator {
    action_space_size: usize,
}

impl UniformEvaluator {
    /// Create a uniform evaluator for the given action space.
    pub fn new(action_space_size: usize) -> Self {
        Self { action_space_size }
    }
}

impl Evaluator for UniformEvaluator {
    fn infer(&self, _encoded: &EncodedState) -> Result<Inference, EvaluatorError> {
        let policy = if self.action_space_size == 0 {
            vec![]
        } else {
            vec![1.0 / self.action_space_size as f32; self.action_space_size]
        };
        Ok(Inference { policy, value: 0.0 })
    }

    fn train(
        &self,
        _examples: &[TrainingExample],
        _config: &TrainingConfig,
    ) -> Result<Self, EvaluatorError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_state_new() {
        let state = EncodedState::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
        assert_eq!(state.len(), 4);
        assert_eq!(state.shape, vec![2, 2]);
        assert_eq!(state.get(0), Some(1.0));
        assert_eq!(state.get(3), Some(4.0));
        assert_eq!(state.get(4), None);
    }

    #[test]
    fn test_encoded_state_zeros() {
        let state = EncodedState::zeros(vec![3, 2]);
        assert_eq!(state.len(), 6);
        assert!(state.tensor.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_encoded_state_set_out_of_bounds_is_ignored() {
        let mut state = EncodedState::zeros(vec![2]);
        state.set(1, 5.0);
        state.set(9, 5.0);
        assert_eq!(state.tensor, vec![0.0, 5.0]);
    }

    #[test]
    fn test_fingerprint_distinguishes_shape_and_content() {
        let a = EncodedState::new(vec![1.0, 0.0], vec![2]);
        let b = EncodedState::new(vec![0.0, 1.0], vec![2]);
        let c = EncodedState::new(vec![1.0, 0.0], vec![1, 2]);

        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_uniform_evaluator() {
        let eval = UniformEvaluator::new(4);
        let out = eval.infer(&EncodedState::zeros(vec![1])).unwrap();

        assert_eq!(out.policy, vec![0.25; 4]);
        assert_eq!(out.value, 0.0);
    }

    #[test]
    fn test_uniform_evaluator_train_is_identity() {
        let eval = UniformEvaluator::new(3);
        let trained = eval.train(&[], &TrainingConfig::default()).unwrap();
        let out = trained.infer(&EncodedState::zeros(vec![1])).unwrap();
        assert_eq!(out.policy.len(), 3);
    }

    #[test]
    fn test_training_config_builders() {
        let config = TrainingConfig::default()
            .with_batch_size(8)
            .with_epochs(2)
            .with_learning_rate(0.5)
            .with_gradient_accumulation_steps(4)
            .with_max_grad_norm(0.25);

        assert_eq!(config.batch_size, 8);
        assert_eq!(config.epochs, 2);
        assert_eq!(config.learning_rate, 0.5);
        assert_eq!(config.gradient_accumulation_steps, 4);
        assert_eq!(config.max_grad_norm, 0.25);
    }

    #[test]
    fn test_training_config_serialization() {
        let config = TrainingConfig::default().with_epochs(7);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: TrainingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
