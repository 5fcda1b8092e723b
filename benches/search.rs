//! Search and self-play throughput.
//!
//! Run with: `cargo bench --bench search`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use alphazero::games::{Connect4, TicTacToe};
use alphazero::mcts::{MCTSConfig, MCTSSearch};
use alphazero::nn::UniformEvaluator;
use alphazero::rules::RulesEngine;
use alphazero::training::{run_self_play, SelfPlayConfig};

// =============================================================================
// Single search
// =============================================================================

fn bench_search_simulations(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_simulations");

    for sims in [50u32, 100, 200, 400, 800] {
        group.throughput(Throughput::Elements(u64::from(sims)));

        group.bench_with_input(BenchmarkId::new("tictactoe", sims), &sims, |b, &sims| {
            let game = TicTacToe::new();
            let evaluator = UniformEvaluator::new(game.action_space_size());
            let state = game.initial_state();
            let mut search = MCTSSearch::new(MCTSConfig::for_testing().with_simulations(sims));

            b.iter(|| black_box(search.search(&game, &state, &evaluator).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("connect4", sims), &sims, |b, &sims| {
            let game = Connect4::new();
            let evaluator = UniformEvaluator::new(game.action_space_size());
            let state = game.initial_state();
            let mut search = MCTSSearch::new(MCTSConfig::for_testing().with_simulations(sims));

            b.iter(|| black_box(search.search(&game, &state, &evaluator).unwrap()));
        });
    }

    group.finish();
}

fn bench_connect4_midgame(c: &mut Criterion) {
    let game = Connect4::new();
    let evaluator = UniformEvaluator::new(game.action_space_size());
    let state = game.play_sequence(&[3, 3, 2, 4, 4, 2, 5]).unwrap();
    let mut search = MCTSSearch::new(MCTSConfig::for_testing().with_simulations(200));

    c.bench_function("connect4_midgame_200", |b| {
        b.iter(|| black_box(search.search(&game, &state, &evaluator).unwrap()));
    });
}

// =============================================================================
// Self-play batches
// =============================================================================

fn bench_self_play(c: &mut Criterion) {
    let mut group = c.benchmark_group("self_play");
    group.sample_size(10);

    for workers in [1usize, 4] {
        group.bench_with_input(BenchmarkId::new("tictactoe_workers", workers), &workers, |b, &workers| {
            let game = TicTacToe::new();
            let evaluator = UniformEvaluator::new(game.action_space_size());
            let config = SelfPlayConfig::default()
                .with_workers(workers)
                .with_games_per_worker(2)
                .with_mcts(MCTSConfig::for_self_play(32));

            b.iter(|| black_box(run_self_play(&game, &evaluator, &config, 0).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_search_simulations, bench_connect4_midgame, bench_self_play);
criterion_main!(benches);
