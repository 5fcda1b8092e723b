//! Iteration controller integration tests.

mod common;

use alphazero::error::{PipelineError, SelfPlayError, StoreError};
use alphazero::games::TicTacToe;
use alphazero::mcts::MCTSConfig;
use alphazero::nn::{TabularEvaluator, UniformEvaluator};
use alphazero::pipeline::{
    CheckpointStore, FileStore, IterationController, MemoryStore, PipelineConfig,
};

use common::{FailingEvaluator, FixedPrior, Pick, SlowLearner, UntrainableEvaluator};

fn tiny_config(total_iterations: u32) -> PipelineConfig {
    let mut config = PipelineConfig {
        game: "tictactoe".to_string(),
        total_iterations,
        ..PipelineConfig::default()
    };
    config.self_play = config
        .self_play
        .with_workers(2)
        .with_games_per_worker(1)
        .with_mcts(MCTSConfig::for_self_play(8));
    config.arena = config.arena.with_games(2).with_mcts(MCTSConfig::for_arena(8));
    config.training = config.training.with_epochs(2).with_batch_size(8);
    config
}

/// Pick with single-simulation arena searches, so priors decide the match.
fn pick_config(start_iteration: u32, total_iterations: u32) -> PipelineConfig {
    let mut config = tiny_config(total_iterations);
    config.start_iteration = start_iteration;
    config.arena = config.arena.with_mcts(MCTSConfig::for_arena(1));
    config
}

/// A store that already holds `incumbent` as checkpoint 1.
fn store_at_iteration_one<E: Clone>(incumbent: &E) -> MemoryStore<E> {
    let mut store = MemoryStore::new();
    store.save_checkpoint(1, incumbent).unwrap();
    store
}

// =============================================================================
// Promotion Tests
// =============================================================================

#[test]
fn test_iteration_zero_always_promotes() {
    let game = TicTacToe::new();
    // Training a uniform evaluator yields the same evaluator, which could
    // never win an arena match; iteration 0 promotes it anyway.
    let mut controller =
        IterationController::new(&game, UniformEvaluator::new(9), tiny_config(1), MemoryStore::new())
            .unwrap();

    let report = controller.run().unwrap();
    let first = &report.iterations[0];
    assert!(first.promoted);
    assert_eq!(first.attempts, 1);
    assert!(first.arena.is_none());
    assert!(first.examples > 0);
    assert_eq!(controller.state().best_checkpoint, 1);
}

#[test]
fn test_better_candidate_is_promoted_and_checkpointed() {
    let initial = FixedPrior::improving(vec![0.1, 0.9], vec![0.9, 0.1]);
    let store = store_at_iteration_one(&initial);
    let mut controller = IterationController::new(&Pick, initial, pick_config(1, 2), store).unwrap();

    let report = controller.run().unwrap();
    let it = &report.iterations[0];
    assert_eq!(it.iteration, 1);
    assert!(it.promoted);
    assert_eq!(it.attempts, 1);
    assert_eq!(it.arena.as_ref().map(|a| a.candidate_wins), Some(2));

    assert_eq!(report.best_checkpoint, 2);
    assert_eq!(controller.incumbent().policy, vec![0.9, 0.1]);
    assert!(controller.store().has_checkpoint(2));
}

#[test]
fn test_rejected_candidate_keeps_incumbent() {
    // Training makes the evaluator worse; with a cap of one retry the
    // iteration ends after two attempts and the incumbent survives.
    let initial = FixedPrior::improving(vec![0.9, 0.1], vec![0.1, 0.9]);
    let mut config = pick_config(1, 2);
    config.max_retries = Some(1);

    let store = store_at_iteration_one(&initial);
    let mut controller = IterationController::new(&Pick, initial, config, store).unwrap();
    let report = controller.run().unwrap();

    let it = &report.iterations[0];
    assert!(!it.promoted);
    assert!(it.retries_exhausted);
    assert_eq!(it.attempts, 2);
    assert_eq!(report.best_checkpoint, 1);
    assert_eq!(controller.incumbent().policy, vec![0.9, 0.1]);

    // Both attempts' batches were kept and the second one trained on both.
    let batches = controller.store().example_batches(1);
    assert_eq!(batches, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    assert_eq!(it.examples, 4);
}

#[test]
fn test_retry_promotes_after_retraining() {
    // The first training changes nothing, so the candidate ties and is
    // rejected. The retry plays a fresh batch, retrains and wins.
    let initial = SlowLearner::new(vec![0.1, 0.9], vec![0.9, 0.1]);
    let mut config = pick_config(1, 2);
    config.max_retries = None;

    let store = store_at_iteration_one(&initial);
    let mut controller = IterationController::new(&Pick, initial, config, store).unwrap();
    let report = controller.run().unwrap();

    let it = &report.iterations[0];
    assert_eq!(it.attempts, 2);
    assert!(it.promoted);
    assert!(!it.retries_exhausted);
    assert_eq!(it.examples, 4);
    assert_eq!(report.best_checkpoint, 2);
    assert_eq!(controller.incumbent().policy, vec![0.9, 0.1]);
    assert_eq!(controller.state().retries, 1);

    let offsets: Vec<u64> = controller
        .store()
        .example_batches(1)
        .into_iter()
        .map(|(offset, _)| offset)
        .collect();
    assert_eq!(offsets, vec![0, 0, 1, 1]);
}

#[test]
fn test_resume_without_checkpoint_is_an_error() {
    let mut config = tiny_config(4);
    config.start_iteration = 3;

    let game = TicTacToe::new();
    let result = IterationController::new(
        &game,
        TabularEvaluator::new(9),
        config,
        MemoryStore::new(),
    );
    assert!(matches!(
        result,
        Err(PipelineError::Store(StoreError::MissingCheckpoint(3)))
    ));
}

#[test]
fn test_zero_retry_cap_advances_immediately() {
    let initial = FixedPrior::new(vec![0.5, 0.5]);
    let mut config = pick_config(1, 3);
    config.max_retries = Some(0);

    let store = store_at_iteration_one(&initial);
    let mut controller = IterationController::new(&Pick, initial, config, store).unwrap();
    let report = controller.run().unwrap();

    assert_eq!(report.iterations.len(), 2);
    assert!(report.iterations.iter().all(|r| r.attempts == 1 && r.retries_exhausted));
    assert_eq!(report.promotions(), 0);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_training_failure_is_fatal() {
    let game = TicTacToe::new();
    let evaluator = UntrainableEvaluator { action_space_size: 9 };
    let mut controller =
        IterationController::new(&game, evaluator, tiny_config(2), MemoryStore::new()).unwrap();

    let err = controller.run().unwrap_err();
    assert!(matches!(err, PipelineError::Training { iteration: 0, .. }));
}

#[test]
fn test_self_play_failure_is_fatal() {
    let game = TicTacToe::new();
    let mut controller =
        IterationController::new(&game, FailingEvaluator, tiny_config(1), MemoryStore::new()).unwrap();

    let err = controller.run().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::SelfPlay {
            iteration: 0,
            source: SelfPlayError::AllWorkersFailed { .. }
        }
    ));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_file_store_run_and_resume() {
    let dir = tempfile::tempdir().unwrap();
    let game = TicTacToe::new();

    let store = FileStore::open(dir.path()).unwrap();
    let mut controller =
        IterationController::new(&game, TabularEvaluator::new(9), tiny_config(1), store).unwrap();
    controller.run().unwrap();
    let (trained, store) = controller.into_parts();

    assert!(store.checkpoint_path(0).exists());
    assert!(store.checkpoint_path(1).exists());
    assert!(store.examples_path(0, 0, 0).exists());
    assert!(store.examples_path(0, 0, 1).exists());

    let mut config = tiny_config(1);
    config.start_iteration = 1;
    let resumed =
        IterationController::new(&game, TabularEvaluator::new(9), config, FileStore::open(dir.path()).unwrap())
            .unwrap();
    assert_eq!(resumed.incumbent(), &trained);
}

#[test]
fn test_config_round_trip_through_json() {
    let config = tiny_config(3);
    let json = serde_json::to_string(&config).unwrap();
    let parsed: PipelineConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config, parsed);
}
