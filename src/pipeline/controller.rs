//! The outer AlphaZero loop: self-play, train, evaluate, promote or retry.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::arena::{Arena, ArenaResult};
use crate::error::{PipelineError, Result};
use crate::nn::Evaluator;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::store::CheckpointStore;
use crate::rules::RulesEngine;
use crate::training::run_self_play;

/// Stage of the current iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Playing a self-play batch with the incumbent.
    SelfPlay,
    /// Training a candidate on the iteration's examples.
    Train,
    /// Arena match between incumbent and candidate.
    Evaluate,
    /// Saving the candidate as the new incumbent.
    Promote,
    /// Candidate rejected; moving to the next game offset.
    Retry,
    /// Every iteration has run.
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::SelfPlay => "self-play",
            Phase::Train => "train",
            Phase::Evaluate => "evaluate",
            Phase::Promote => "promote",
            Phase::Retry => "retry",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Mutable loop state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationState {
    /// Iteration being worked on.
    pub iteration: u32,

    /// Checkpoint index of the current incumbent.
    pub best_checkpoint: u32,

    /// Rejected candidates so far in this iteration.
    pub retries: u32,

    /// Start offset of the next self-play batch.
    pub next_game_offset: u64,
}

/// Summary of one finished iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct IterationReport {
    /// Iteration this report covers.
    pub iteration: u32,

    /// Train/evaluate rounds run, including the first one.
    pub attempts: u32,

    /// Whether a candidate replaced the incumbent.
    pub promoted: bool,

    /// The retry cap was hit and the incumbent was kept.
    pub retries_exhausted: bool,

    /// Examples the last candidate was trained on.
    pub examples: usize,

    /// Last arena result; `None` at iteration 0.
    pub arena: Option<ArenaResult>,
}

/// Summary of a whole run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineReport {
    /// One report per iteration run, in order.
    pub iterations: Vec<IterationReport>,

    /// Checkpoint index of the incumbent when the run stopped.
    pub best_checkpoint: u32,
}

impl PipelineReport {
    /// Number of iterations that ended with a promotion.
    pub fn promotions(&self) -> usize {
        self.iterations.iter().filter(|r| r.promoted).count()
    }
}

/// Drives iterations `start_iteration..total_iterations`.
///
/// The incumbent evaluator is owned here and only replaced at promotion.
pub struct IterationController<'g, G, E, S> {
    game: &'g G,
    incumbent: E,
    config: PipelineConfig,
    store: S,
    arena: Arena,
    state: IterationState,
    phase: Phase,
}

impl<'g, G, E, S> IterationController<'g, G, E, S>
where
    G: RulesEngine,
    E: Evaluator,
    S: CheckpointStore<E>,
{
    /// Build a controller. The configuration is validated here.
    ///
    /// `initial` is the incumbent of a fresh run. When `start_iteration > 0`
    /// the incumbent is loaded from the store instead, and a missing
    /// checkpoint fails with `StoreError::MissingCheckpoint`.
    pub fn new(game: &'g G, initial: E, config: PipelineConfig, store: S) -> Result<Self> {
        config.validate()?;

        let start = config.start_iteration;
        let incumbent = if start > 0 {
            let loaded = store.load_checkpoint(start)?;
            info!(iteration = start, "Resuming from checkpoint");
            loaded
        } else {
            initial
        };

        Ok(Self {
            game,
            incumbent,
            arena: Arena::new(config.arena.clone()),
            state: IterationState {
                iteration: start,
                best_checkpoint: start,
                retries: 0,
                next_game_offset: 0,
            },
            phase: Phase::SelfPlay,
            config,
            store,
        })
    }

    /// Run every remaining iteration.
    pub fn run(&mut self) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();

        while self.state.iteration < self.config.total_iterations {
            let iteration_report = self.run_iteration()?;
            report.iterations.push(iteration_report);
            self.state.iteration += 1;
        }

        self.enter(Phase::Done);
        report.best_checkpoint = self.state.best_checkpoint;
        info!(
            iterations = report.iterations.len(),
            promotions = report.promotions(),
            best_checkpoint = report.best_checkpoint,
            "Pipeline finished"
        );
        Ok(report)
    }

    fn run_iteration(&mut self) -> Result<IterationReport> {
        let iteration = self.state.iteration;
        self.state.retries = 0;
        self.state.next_game_offset = 0;

        if iteration == 0 {
            self.store.save_checkpoint(0, &self.incumbent)?;
            self.state.best_checkpoint = 0;
        }

        let mut attempts = 0;
        loop {
            attempts += 1;

            self.enter(Phase::SelfPlay);
            self.self_play(iteration)?;

            self.enter(Phase::Train);
            let examples = self.store.load_examples(iteration)?;
            let candidate = self
                .incumbent
                .train(&examples, &self.config.training)
                .map_err(|source| PipelineError::Training { iteration, source })?;
            debug!(iteration, examples = examples.len(), "Trained candidate");

            if iteration == 0 {
                self.promote(iteration, candidate)?;
                return Ok(IterationReport {
                    iteration,
                    attempts,
                    promoted: true,
                    retries_exhausted: false,
                    examples: examples.len(),
                    arena: None,
                });
            }

            self.enter(Phase::Evaluate);
            let verdict = self
                .arena
                .evaluate(self.game, &self.incumbent, &candidate, self.config.arena.num_games)
                .map_err(|source| PipelineError::Arena { iteration, source })?;
            debug!(
                iteration,
                attempt = attempts,
                accepted = %verdict.accepted,
                "Candidate evaluated"
            );

            if verdict.promoted() {
                self.promote(iteration, candidate)?;
                return Ok(IterationReport {
                    iteration,
                    attempts,
                    promoted: true,
                    retries_exhausted: false,
                    examples: examples.len(),
                    arena: Some(verdict.result),
                });
            }

            if self.retries_exhausted() {
                warn!(
                    iteration,
                    retries = self.state.retries,
                    "Retry limit reached, keeping incumbent"
                );
                // Keep a checkpoint for the next iteration so a resume can
                // pick it up; the best index still names the older one.
                self.store.save_checkpoint(iteration + 1, &self.incumbent)?;
                return Ok(IterationReport {
                    iteration,
                    attempts,
                    promoted: false,
                    retries_exhausted: true,
                    examples: examples.len(),
                    arena: Some(verdict.result),
                });
            }

            self.enter(Phase::Retry);
            self.state.retries += 1;
            self.state.next_game_offset =
                u64::from(self.state.retries) * self.config.self_play.games_per_worker as u64;
        }
    }

    /// Play one batch at the current offset and persist it per worker.
    fn self_play(&mut self, iteration: u32) -> Result<()> {
        let offset = self.state.next_game_offset;
        let batch = run_self_play(self.game, &self.incumbent, &self.config.self_play, offset)
            .map_err(|source| PipelineError::SelfPlay { iteration, source })?;

        for worker in &batch.workers {
            self.store
                .save_examples(iteration, offset, worker.worker, &worker.examples())?;
        }
        debug!(
            iteration,
            offset,
            games = batch.num_games(),
            failed_workers = batch.failed_workers.len(),
            "Stored self-play batch"
        );
        Ok(())
    }

    fn promote(&mut self, iteration: u32, candidate: E) -> Result<()> {
        self.enter(Phase::Promote);
        let checkpoint = iteration + 1;
        self.store.save_checkpoint(checkpoint, &candidate)?;
        self.incumbent = candidate;
        self.state.best_checkpoint = checkpoint;
        info!(iteration, checkpoint, "Promoted candidate");
        Ok(())
    }

    fn retries_exhausted(&self) -> bool {
        self.config
            .max_retries
            .is_some_and(|cap| self.state.retries >= cap)
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        info!(
            iteration = self.state.iteration,
            retries = self.state.retries,
            phase = %phase,
            "Entering phase"
        );
    }

    /// Current incumbent.
    pub fn incumbent(&self) -> &E {
        &self.incumbent
    }

    /// Loop counters.
    pub fn state(&self) -> &IterationState {
        &self.state
    }

    /// Phase last entered.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the controller, returning the incumbent and the store.
    pub fn into_parts(self) -> (E, S) {
        (self.incumbent, self.store)
    }
}
