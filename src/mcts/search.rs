//! Core MCTS search algorithm.
//!
//! AlphaZero-style search: the evaluator provides priors and leaf values, so
//! there are no random rollouts. The root is expanded before the simulation
//! budget is spent; every simulation then selects with PUCT, expands one
//! leaf, and backs the leaf value up the path.

use std::time::Instant;

use tracing::trace;

use crate::core::{Action, GameRng, PlayerId};
use crate::error::{EvaluatorError, SearchError};
use crate::nn::Evaluator;
use crate::rules::RulesEngine;

use super::config::MCTSConfig;
use super::node::NodeId;
use super::policy::{masked_priors, mix_noise, visit_distribution, SelectionPolicy, PUCT};
use super::stats::SearchStats;
use super::tree::MCTSTree;

/// Outcome of one search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    /// Visit distribution over the full action space at the configured
    /// temperature. Zero on illegal actions.
    pub policy: Vec<f32>,

    /// Root child visit counts over the full action space.
    pub visit_counts: Vec<u32>,

    /// Mean backed-up value for the player to move at the root.
    pub root_value: f32,

    /// Search statistics.
    pub stats: SearchStats,
}

impl SearchResult {
    /// Most visited action (lowest index on ties).
    #[must_use]
    pub fn best_action(&self) -> Option<Action> {
        let max = self.visit_counts.iter().copied().max()?;
        if max == 0 {
            return None;
        }
        self.visit_counts
            .iter()
            .position(|&n| n == max)
            .map(|i| Action::new(i as u16))
    }

    /// Sample an action from `policy`.
    pub fn sample_action(&self, rng: &mut GameRng) -> Option<Action> {
        rng.choose_weighted(&self.policy).map(|i| Action::new(i as u16))
    }
}

/// Main MCTS search context.
///
/// Owns the search tree, configuration and noise RNG. The game and the
/// evaluator are borrowed per call, so one context can be reused for every
/// move of a game.
pub struct MCTSSearch {
    /// Search configuration.
    config: MCTSConfig,

    /// The search tree.
    tree: MCTSTree,

    /// RNG for root noise.
    rng: GameRng,

    /// Selection policy.
    selection: Box<dyn SelectionPolicy>,

    /// Search statistics.
    stats: SearchStats,
}

impl MCTSSearch {
    /// Create a new MCTS search context.
    pub fn new(config: MCTSConfig) -> Self {
        let rng = GameRng::new(config.seed);
        let capacity = (config.simulations as usize).saturating_mul(8).clamp(64, 1 << 20);

        Self {
            tree: MCTSTree::with_capacity(PlayerId::FIRST, capacity),
            config,
            rng,
            selection: Box::new(PUCT),
            stats: SearchStats::default(),
        }
    }

    /// Set a custom selection policy.
    pub fn with_selection<S: SelectionPolicy + 'static>(mut self, selection: S) -> Self {
        self.selection = Box::new(selection);
        self
    }

    /// Change the temperature used for subsequent results.
    pub fn set_temperature(&mut self, temperature: f64) {
        self.config.temperature = temperature;
    }

    /// Run one search from `root_state`.
    ///
    /// Runs exactly `config.simulations` simulations after expanding the
    /// root, so the root's child visit counts always sum to the budget.
    pub fn search<G, V>(
        &mut self,
        game: &G,
        root_state: &G::State,
        evaluator: &V,
    ) -> Result<SearchResult, SearchError>
    where
        G: RulesEngine,
        V: Evaluator + ?Sized,
    {
        if self.config.simulations == 0 {
            return Err(SearchError::InvalidBudget(self.config.simulations));
        }
        if game.is_terminal(root_state) {
            return Err(SearchError::NoLegalActions);
        }

        let start = Instant::now();
        self.stats.reset();
        self.tree.reset(game.current_player(root_state));

        let root = self.tree.root();
        self.expand(game, root, root_state, evaluator)?;

        if self.config.add_noise() {
            self.apply_root_noise();
        }

        for sim in 0..self.config.simulations {
            self.simulate(game, root_state, evaluator, sim)?;
            self.stats.simulations += 1;
        }

        self.stats.time_us = start.elapsed().as_micros() as u64;

        Ok(self.result(game.action_space_size()))
    }

    /// Single simulation: select, expand or score, back up.
    fn simulate<G, V>(
        &mut self,
        game: &G,
        root_state: &G::State,
        evaluator: &V,
        sim: u32,
    ) -> Result<(), SearchError>
    where
        G: RulesEngine,
        V: Evaluator + ?Sized,
    {
        let mut state = root_state.clone();
        let mut current = self.tree.root();
        let mut path = vec![current];

        // === SELECTION ===
        while !self.tree.get(current).is_leaf() {
            let Some(idx) = self.selection.select(&self.tree, current, &self.config) else {
                break;
            };
            let edge = self.tree.get(current).children[idx];
            state = game.apply(&state, edge.action)?;
            current = edge.child;
            path.push(current);

            if self.tree.get(current).visits == 0 {
                self.tree.get_mut(current).to_move = game.current_player(&state);
            }
        }

        let leaf_player = self.tree.get(current).to_move;
        let depth = self.tree.get(current).depth;
        self.stats.max_depth = self.stats.max_depth.max(depth);

        // === EVALUATION / EXPANSION ===
        let value = if let Some(v) = self.tree.get(current).terminal_value {
            self.stats.terminal_hits += 1;
            v
        } else if let Some(outcome) = game.outcome(&state) {
            let v = outcome.value_for(leaf_player);
            let node = self.tree.get_mut(current);
            node.is_terminal = true;
            node.terminal_value = Some(v);
            self.stats.terminal_hits += 1;
            v
        } else {
            self.expand(game, current, &state, evaluator)?
        };

        trace!(sim, depth, value, "MCTS simulation");

        // === BACKUP ===
        self.backpropagate(&path, leaf_player, value);
        Ok(())
    }

    /// Expand `node_id`: query the evaluator once and create a child per
    /// legal action. Returns the evaluator's value for the player to move.
    fn expand<G, V>(
        &mut self,
        game: &G,
        node_id: NodeId,
        state: &G::State,
        evaluator: &V,
    ) -> Result<f32, SearchError>
    where
        G: RulesEngine,
        V: Evaluator + ?Sized,
    {
        let legal = game.legal_actions(state);
        if legal.is_empty() {
            return Err(SearchError::NoLegalActions);
        }

        let inference = evaluator.infer(&game.encode(state))?;
        self.stats.evaluator_calls += 1;

        let expected = game.action_space_size();
        if inference.policy.len() != expected {
            return Err(EvaluatorError::PolicyShape {
                expected,
                got: inference.policy.len(),
            }
            .into());
        }

        let priors = masked_priors(&inference.policy, &legal);
        let to_move = self.tree.get(node_id).to_move;
        self.tree.expand(node_id, to_move.opponent(), &priors);
        self.stats.nodes_expanded += 1;

        Ok(inference.value.clamp(-1.0, 1.0))
    }

    /// Mix Dirichlet noise into the root's child priors.
    fn apply_root_noise(&mut self) {
        let children: Vec<NodeId> = self.tree.root_node().children.iter().map(|e| e.child).collect();
        let noise = self.rng.dirichlet(self.config.dirichlet_alpha, children.len());

        let mut priors: Vec<f32> = children.iter().map(|&c| self.tree.get(c).prior).collect();
        mix_noise(&mut priors, &noise, self.config.dirichlet_epsilon);

        for (child, prior) in children.into_iter().zip(priors) {
            self.tree.get_mut(child).prior = prior;
        }
    }

    /// Back `value` (for `leaf_player`) up the path.
    ///
    /// Each node accumulates the value from the perspective of the player
    /// who moved into it: its parent's player to move, or for the root the
    /// root player's opponent.
    fn backpropagate(&mut self, path: &[NodeId], leaf_player: PlayerId, value: f32) {
        let root_player = self.tree.root_node().to_move;

        for &node_id in path.iter().rev() {
            let parent = self.tree.get(node_id).parent;
            let mover = if parent.is_none() {
                root_player.opponent()
            } else {
                self.tree.get(parent).to_move
            };
            let signed = if mover == leaf_player { value } else { -value };

            let node = self.tree.get_mut(node_id);
            node.visits += 1;
            node.total_value += signed as f64;
        }
    }

    /// Build the result from root statistics.
    fn result(&self, action_space_size: usize) -> SearchResult {
        let mut visit_counts = vec![0u32; action_space_size];
        for (action, child) in self.tree.root_children() {
            if let Some(slot) = visit_counts.get_mut(action.index()) {
                *slot = child.visits;
            }
        }

        SearchResult {
            policy: visit_distribution(&visit_counts, self.config.temperature),
            root_value: -self.tree.root_node().mean_value() as f32,
            visit_counts,
            stats: self.stats.clone(),
        }
    }

    /// Get search statistics.
    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Get the search tree.
    #[must_use]
    pub fn tree(&self) -> &MCTSTree {
        &self.tree
    }

    /// Get action visit counts from root.
    ///
    /// Returns (action, visit_count) pairs in ascending action order.
    pub fn action_visits(&self) -> Vec<(Action, u32)> {
        self.tree.root_children().map(|(a, n)| (a, n.visits)).collect()
    }

    /// Get the configuration.
    pub fn config(&self) -> &MCTSConfig {
        &self.config
    }
}
