//! Trainable lookup-table evaluator.
//!
//! Stores one policy/value entry per distinct encoded state, keyed by
//! `EncodedState::fingerprint`. Unseen states fall back to uniform priors
//! and a neutral value. Training is plain mini-batch gradient descent on the
//! squared error between entries and targets, with the usual knobs
//! (accumulation, norm clipping) so that it responds to the same
//! hyperparameters a network trainer would.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{EncodedState, Evaluator, Inference, TrainingConfig};
use crate::core::GameRng;
use crate::error::EvaluatorError;
use crate::training::TrainingExample;

/// One stored prediction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Entry {
    policy: Vec<f32>,
    value: f32,
}

/// Evaluator backed by a hash map from state fingerprint to prediction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularEvaluator {
    action_space_size: usize,
    entries: FxHashMap<u64, Entry>,
}

impl TabularEvaluator {
    /// Create an empty table for the given action space.
    pub fn new(action_space_size: usize) -> Self {
        Self {
            action_space_size,
            entries: FxHashMap::default(),
        }
    }

    /// Number of stored states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been learned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size of the action space this table predicts over.
    #[must_use]
    pub fn action_space_size(&self) -> usize {
        self.action_space_size
    }

    fn uniform_entry(&self) -> Entry {
        let p = if self.action_space_size == 0 {
            0.0
        } else {
            1.0 / self.action_space_size as f32
        };
        Entry {
            policy: vec![p; self.action_space_size],
            value: 0.0,
        }
    }

    fn validate(
        &self,
        examples: &[TrainingExample],
        config: &TrainingConfig,
    ) -> Result<(), EvaluatorError> {
        if config.batch_size == 0 {
            return Err(EvaluatorError::TrainingFailed(
                "batch_size must be positive".to_string(),
            ));
        }
        if config.gradient_accumulation_steps == 0 {
            return Err(EvaluatorError::TrainingFailed(
                "gradient_accumulation_steps must be positive".to_string(),
            ));
        }
        if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
            return Err(EvaluatorError::TrainingFailed(format!(
                "learning_rate must be positive, got {}",
                config.learning_rate
            )));
        }
        if let Some(bad) = examples
            .iter()
            .find(|e| e.policy.len() != self.action_space_size)
        {
            return Err(EvaluatorError::PolicyShape {
                expected: self.action_space_size,
                got: bad.policy.len(),
            });
        }
        Ok(())
    }

    /// Apply one accumulated gradient step.
    ///
    /// `grads` holds summed gradients per key and `count` the number of
    /// examples that contributed to them.
    fn step(&mut self, grads: &mut FxHashMap<u64, Entry>, count: usize, config: &TrainingConfig) {
        if count == 0 || grads.is_empty() {
            return;
        }
        let scale = 1.0 / count as f32;

        let norm_sq: f32 = grads
            .values()
            .map(|g| {
                g.policy.iter().map(|x| (x * scale).powi(2)).sum::<f32>() + (g.value * scale).powi(2)
            })
            .sum();
        let norm = norm_sq.sqrt();
        let clip = if config.max_grad_norm > 0.0 && norm > config.max_grad_norm {
            config.max_grad_norm / norm
        } else {
            1.0
        };
        let step = config.learning_rate * scale * clip;

        for (key, grad) in grads.drain() {
            let uniform = self.uniform_entry();
            let entry = self.entries.entry(key).or_insert(uniform);
            for (p, g) in entry.policy.iter_mut().zip(&grad.policy) {
                *p = (*p - step * g).max(0.0);
            }
            let total: f32 = entry.policy.iter().sum();
            if total > 0.0 {
                entry.policy.iter_mut().for_each(|p| *p /= total);
            }
            entry.value = (entry.value - step * grad.value).clamp(-1.0, 1.0);
        }
    }
}

impl Evaluator for TabularEvaluator {
    fn infer(&self, encoded: &EncodedState) -> Result<Inference, EvaluatorError> {
        let entry = self
            .entries
            .get(&encoded.fingerprint())
            .cloned()
            .unwrap_or_else(|| self.uniform_entry());
        Ok(Inference {
            policy: entry.policy,
            value: entry.value,
        })
    }

    fn train(
        &self,
        examples: &[TrainingExample],
        config: &TrainingConfig,
    ) -> Result<Self, EvaluatorError> {
        self.validate(examples, config)?;

        let mut trained = self.clone();
        if examples.is_empty() {
            return Ok(trained);
        }

        let keys: Vec<u64> = examples.iter().map(|e| e.state.fingerprint()).collect();
        let mut order: Vec<usize> = (0..examples.len()).collect();
        let mut rng = GameRng::new(config.seed);

        let mut grads: FxHashMap<u64, Entry> = FxHashMap::default();
        let mut pending = 0usize;
        let mut batches_in_window = 0u32;
        let mut steps = 0usize;

        for _ in 0..config.epochs {
            rng.shuffle(&mut order);

            for batch in order.chunks(config.batch_size) {
                for &i in batch {
                    let example = &examples[i];
                    let current = trained
                        .entries
                        .get(&keys[i])
                        .cloned()
                        .unwrap_or_else(|| trained.uniform_entry());

                    let grad = grads.entry(keys[i]).or_insert_with(|| Entry {
                        policy: vec![0.0; trained.action_space_size],
                        value: 0.0,
                    });
                    for ((g, c), t) in grad
                        .policy
                        .iter_mut()
                        .zip(&current.policy)
                        .zip(&example.policy)
                    {
                        *g += c - t;
                    }
                    grad.value += current.value - example.value;
                }
                pending += batch.len();
                batches_in_window += 1;

                if batches_in_window == config.gradient_accumulation_steps {
                    trained.step(&mut grads, pending, config);
                    pending = 0;
                    batches_in_window = 0;
                    steps += 1;
                }
            }
        }

        if pending > 0 {
            trained.step(&mut grads, pending, config);
            steps += 1;
        }

        debug!(
            examples = examples.len(),
            entries = trained.entries.len(),
            steps,
            "Tabular evaluator trained"
        );

        Ok(trained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(tensor: Vec<f32>, policy: Vec<f32>, value: f32) -> TrainingExample {
        let n = tensor.len();
        TrainingExample {
            state: EncodedState::new(tensor, vec![n]),
            policy,
            value,
        }
    }

    fn fast_config() -> TrainingConfig {
        TrainingConfig::default()
            .with_batch_size(4)
            .with_epochs(50)
            .with_learning_rate(0.5)
            .with_max_grad_norm(10.0)
    }

    #[test]
    fn test_unseen_state_is_uniform() {
        let eval = TabularEvaluator::new(4);
        let out = eval.infer(&EncodedState::zeros(vec![2])).unwrap();
        assert_eq!(out.policy, vec![0.25; 4]);
        assert_eq!(out.value, 0.0);
    }

    #[test]
    fn test_train_moves_toward_targets() {
        let eval = TabularEvaluator::new(2);
        let examples = vec![example(vec![1.0, 0.0], vec![1.0, 0.0], 1.0)];

        let trained = eval.train(&examples, &fast_config()).unwrap();
        let out = trained.infer(&examples[0].state).unwrap();

        assert!(out.policy[0] > 0.9, "policy {:?}", out.policy);
        assert!(out.value > 0.9, "value {}", out.value);
        assert_eq!(trained.len(), 1);
    }

    #[test]
    fn test_train_does_not_mutate_original() {
        let eval = TabularEvaluator::new(2);
        let examples = vec![example(vec![1.0], vec![0.0, 1.0], -1.0)];
        let _ = eval.train(&examples, &fast_config()).unwrap();
        assert!(eval.is_empty());
    }

    #[test]
    fn test_train_is_deterministic() {
        let eval = TabularEvaluator::new(3);
        let examples: Vec<_> = (0..10)
            .map(|i| example(vec![i as f32], vec![0.2, 0.3, 0.5], if i % 2 == 0 { 1.0 } else { -1.0 }))
            .collect();
        let config = fast_config().with_gradient_accumulation_steps(2);

        let a = eval.train(&examples, &config).unwrap();
        let b = eval.train(&examples, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_policy_stays_normalised() {
        let eval = TabularEvaluator::new(3);
        let examples = vec![example(vec![2.0], vec![0.0, 0.0, 1.0], 0.0)];
        let trained = eval.train(&examples, &fast_config()).unwrap();
        let out = trained.infer(&examples[0].state).unwrap();

        let sum: f32 = out.policy.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(out.policy.iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn test_clipping_limits_step() {
        let eval = TabularEvaluator::new(1);
        let examples = vec![example(vec![3.0], vec![1.0], 1.0)];
        let config = TrainingConfig::default()
            .with_batch_size(1)
            .with_epochs(1)
            .with_learning_rate(1.0)
            .with_max_grad_norm(0.1);

        let trained = eval.train(&examples, &config).unwrap();
        let out = trained.infer(&examples[0].state).unwrap();
        assert!((out.value - 0.1).abs() < 1e-5, "value {}", out.value);
    }

    #[test]
    fn test_wrong_policy_length_fails() {
        let eval = TabularEvaluator::new(3);
        let examples = vec![example(vec![1.0], vec![1.0], 0.0)];
        let err = eval.train(&examples, &fast_config()).unwrap_err();
        assert_eq!(err, EvaluatorError::PolicyShape { expected: 3, got: 1 });
    }

    #[test]
    fn test_zero_batch_size_fails() {
        let eval = TabularEvaluator::new(1);
        let config = TrainingConfig::default().with_batch_size(0);
        assert!(matches!(
            eval.train(&[], &config),
            Err(EvaluatorError::TrainingFailed(_))
        ));
    }

    #[test]
    fn test_serialization() {
        let eval = TabularEvaluator::new(2);
        let examples = vec![example(vec![1.0], vec![0.5, 0.5], 0.5)];
        let trained = eval.train(&examples, &fast_config()).unwrap();

        let bytes = bincode::serialize(&trained).unwrap();
        let restored: TabularEvaluator = bincode::deserialize(&bytes).unwrap();
        assert_eq!(trained, restored);
    }
}
