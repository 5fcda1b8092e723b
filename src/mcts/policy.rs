//! MCTS policies for selection and for turning priors and visit counts into
//! distributions.
//!
//! Selection is trait-based to allow customization:
//! - `SelectionPolicy`: How to choose which child to explore (PUCT)
//!
//! The free functions at the bottom handle the prior and visit-count
//! arithmetic shared by search, self-play and the arena.

use crate::core::Action;

use super::config::MCTSConfig;
use super::node::NodeId;
use super::tree::MCTSTree;

/// Temperatures at or below this are treated as zero (greedy).
pub const GREEDY_TEMPERATURE: f64 = 1e-6;

// =============================================================================
// Selection Policy
// =============================================================================

/// Policy for selecting which child node to explore.
pub trait SelectionPolicy: Send + Sync {
    /// Select a child of `node`.
    ///
    /// Returns the index into the node's children, or `None` if it has none.
    fn select(&self, tree: &MCTSTree, node: NodeId, config: &MCTSConfig) -> Option<usize>;
}

/// PUCT selection policy (Predictor + UCB for Trees).
///
/// Uses prior probabilities from the evaluator.
/// Formula: Q(a) + c * P(a) * sqrt(N) / (1 + n(a))
///
/// `N` is clamped to at least 1 so that priors order the children on the
/// very first visit of a freshly expanded node. Ties go to the lowest action
/// index.
#[derive(Clone, Debug, Default)]
pub struct PUCT;

impl PUCT {
    /// PUCT score of a child given its parent's visit count.
    #[inline]
    #[must_use]
    pub fn score(q: f64, prior: f32, child_visits: u32, parent_visits: u32, c_puct: f64) -> f64 {
        let sqrt_parent = (parent_visits.max(1) as f64).sqrt();
        q + c_puct * prior as f64 * sqrt_parent / (1.0 + child_visits as f64)
    }
}

impl SelectionPolicy for PUCT {
    fn select(&self, tree: &MCTSTree, node: NodeId, config: &MCTSConfig) -> Option<usize> {
        let parent = tree.get(node);
        let mut best: Option<(usize, f64)> = None;

        // Children are in ascending action order; strict `>` keeps the
        // lowest index on ties.
        for (i, edge) in parent.children.iter().enumerate() {
            let child = tree.get(edge.child);
            let score = Self::score(
                child.mean_value(),
                child.prior,
                child.visits,
                parent.visits,
                config.c_puct,
            );
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((i, score)),
            }
        }

        best.map(|(i, _)| i)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Restrict a dense prior vector to the legal actions and renormalise.
///
/// Negative or non-finite priors count as zero. If the legal actions carry
/// no mass the result is uniform over them.
pub fn masked_priors(policy: &[f32], legal: &[Action]) -> Vec<(Action, f32)> {
    let raw: Vec<f32> = legal
        .iter()
        .map(|a| {
            let p = policy.get(a.index()).copied().unwrap_or(0.0);
            if p.is_finite() && p > 0.0 {
                p
            } else {
                0.0
            }
        })
        .collect();

    let total: f32 = raw.iter().sum();
    if total > 0.0 {
        legal.iter().zip(raw).map(|(&a, p)| (a, p / total)).collect()
    } else {
        let uniform = 1.0 / legal.len().max(1) as f32;
        legal.iter().map(|&a| (a, uniform)).collect()
    }
}

/// Mix noise into priors: `P' = (1 - epsilon) * P + epsilon * noise`.
pub fn mix_noise(priors: &mut [f32], noise: &[f32], epsilon: f32) {
    for (p, n) in priors.iter_mut().zip(noise) {
        *p = (1.0 - epsilon) * *p + epsilon * n;
    }
}

/// Turn visit counts into a probability distribution at `temperature`.
///
/// `pi(a) = N(a)^(1/T) / sum_b N(b)^(1/T)`. Temperatures at or below
/// `GREEDY_TEMPERATURE` give a one-hot vector on the most visited action
/// (lowest index on ties). All-zero counts give an all-zero vector.
pub fn visit_distribution(counts: &[u32], temperature: f64) -> Vec<f32> {
    let mut dist = vec![0.0f32; counts.len()];
    let max = counts.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return dist;
    }

    if temperature <= GREEDY_TEMPERATURE {
        if let Some(best) = counts.iter().position(|&n| n == max) {
            dist[best] = 1.0;
        }
        return dist;
    }

    // Scale by the max count first so large counts at small temperatures
    // stay finite.
    let exponent = 1.0 / temperature;
    let weights: Vec<f64> = counts
        .iter()
        .map(|&n| {
            if n == 0 {
                0.0
            } else {
                (n as f64 / max as f64).powf(exponent)
            }
        })
        .collect();
    let total: f64 = weights.iter().sum();

    for (d, w) in dist.iter_mut().zip(weights) {
        *d = (w / total) as f32;
    }
    dist
}
